//! Little-endian primitive writers.

pub mod basic;
