#![recursion_limit = "72"]

//! The stateful `Encoder`/`Decoder` pair for the HTML Structured Clone wire
//! format (wire-format version 13) — the core this workspace exists to
//! provide; see `sclone-core` for the value graph and tag vocabulary, and
//! `sclone-encoding` for the varint/ZigZag and little-endian primitives
//! both codecs are built on.

pub mod delegate;
pub mod error;
pub mod identity;
pub mod stateful;
pub mod transfer;

pub use delegate::{HostObjectDecode, HostObjectEncode, PrimitiveReader, PrimitiveWriter};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use stateful::decode::Decoder;
pub use stateful::encode::Encoder;
