//! Little-endian primitive readers.

pub mod basic;
