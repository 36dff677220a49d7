#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! Core value graph and tag vocabulary for the HTML Structured Clone wire
//! format (wire-format version 13).
//!
//! This crate holds the data this codec moves around, but none of the
//! state-machined traversal that reads or writes it — see `sclone-parser`
//! for the `Encoder`/`Decoder` pair, and `sclone-encoding` for the
//! varint/ZigZag primitives both sides share.

pub mod regexp;
pub mod tag;
pub mod value;

pub use regexp::RegExpFlags;
pub use tag::{ViewKind, WIRE_FORMAT_VERSION};
pub use value::{
    new_ref, DenseArray, HostObject, MapValue, Record, Ref, RegExp, SetValue, SparseArray,
    TypedView, Value,
};
