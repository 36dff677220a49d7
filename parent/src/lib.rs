//! # sclone
//!
//! A Rust implementation of the HTML Structured Clone wire format
//! (wire-format version 13): the tagged byte stream a well-known embedded
//! script engine produces for its "serialize/deserialize" pair.
//!
//! This crate aggregates the key modules of the `sclone` project the way
//! the `dicom` crate aggregates `dicom-core`/`dicom-encoding`/`dicom-parser`:
//! these modules are also published as independent crates, which can be
//! fetched directly in complement to or as an alternative to this one.
//!
//! - [`core`] holds the in-memory [`Value`] graph and the wire tag
//!   vocabulary; see [`core::value`] and [`core::tag`].
//! - [`encoding`] holds the stateless varint/ZigZag and little-endian
//!   primitives both the encoder and decoder are built on.
//! - [`parser`] contains the stateful [`parser::Encoder`]/[`parser::Decoder`]
//!   pair — the actual state-machined codec — along with the identity map,
//!   byte-buffer transfer map, and the `HostObjectEncode`/`HostObjectDecode`
//!   delegate traits for extending the format with opaque host objects.
//! - [`views`] (feature `views`, enabled by default) is the default
//!   host-object codec for typed views, used when a caller opts out of the
//!   native `TypedView` wire path via
//!   [`parser::Encoder::set_treat_typed_views_as_host_objects`].
//!
//! ## Quick start
//!
//! The two convenience entry points in this module wrap a fresh encoder or
//! decoder around a single value, the way the embedded engine's own
//! `serialize`/`deserialize` free functions do. They do not expose identity
//! continuity across calls — for that, drive [`parser::Encoder`] /
//! [`parser::Decoder`] directly and call `write_value`/`read_value`
//! repeatedly on the same instance.
//!
//! ```
//! use sclone::core::value::{new_ref, Record, Value};
//!
//! let record = new_ref(Record::default());
//! record.borrow_mut().entries.push((
//!     Value::Str("foo".to_string()),
//!     Value::Str("bar".to_string()),
//! ));
//!
//! let bytes = sclone::serialize(&Value::Record(record)).unwrap();
//! let decoded = sclone::deserialize(&bytes).unwrap();
//! ```

pub use sclone_core as core;
pub use sclone_encoding as encoding;
pub use sclone_parser as parser;
#[cfg(feature = "views")]
pub use sclone_views as views;

pub use sclone_core::Value;
pub use sclone_parser::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// Writes the header and `value` with a fresh [`parser::Encoder`], then
/// returns the accumulated bytes (§6 "Façade").
///
/// No host-object delegate is installed: a value that needs one (an opaque
/// host object, or a typed view when
/// [`parser::Encoder::set_treat_typed_views_as_host_objects`] would be
/// set) fails with [`EncodeError::UnknownHostObjectType`]. Typed views are
/// otherwise written natively and do not need a delegate here.
pub fn serialize(value: &Value) -> EncodeResult<Vec<u8>> {
    let mut encoder = parser::Encoder::new(None);
    encoder.write_header();
    encoder.write_value(value)?;
    Ok(encoder.release())
}

/// Reads the header and the first value out of `bytes` with a fresh
/// [`parser::Decoder`] (§6 "Façade").
///
/// No host-object delegate is installed: a `HostObject` tag, or an unknown
/// tag at a pre-13 wire-format version, fails with
/// [`DecodeError::NoHostObjectDelegate`].
pub fn deserialize(bytes: &[u8]) -> DecodeResult<Value> {
    let mut decoder = parser::Decoder::new(bytes, None);
    decoder.read_header()?;
    decoder.read_value()
}
