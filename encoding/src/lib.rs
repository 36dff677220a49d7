#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! Varint/ZigZag and little-endian primitives for the HTML Structured
//! Clone wire format.
//!
//! This crate provides the stateless building blocks the stateful
//! `Encoder`/`Decoder` pair in `sclone-parser` is built on: base-128
//! varints and their ZigZag-signed variant (§4.4), and little-endian
//! readers/writers for the fixed-width fields (32-bit lengths/ids, 64-bit
//! doubles) that appear outside of varints.

pub mod decode;
pub mod encode;
pub mod varint;

pub use varint::{decode_varint, encode_varint, zigzag_decode, zigzag_encode};
