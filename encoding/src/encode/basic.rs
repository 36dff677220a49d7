//! Little-endian writers for the fixed-width primitives the wire format
//! uses outside of varints: 32-bit lengths/ids and 64-bit doubles.
//!
//! Unlike `dicom-encoding`'s `BasicEncode`, which is polymorphic over
//! [`byteordered::Endianness`] because DICOM transfer syntaxes may be
//! either-endian, this format fixes host byte order (little-endian on every
//! supported target, per §9 "Host byte order") — so there is exactly one
//! implementation, and no trait is needed to select between two.

use byteordered::ByteOrdered;
use std::io::{self, Write};

/// Writes `value` as 4 little-endian bytes.
pub fn write_u32<W: Write>(to: W, value: u32) -> io::Result<()> {
    ByteOrdered::le(to).write_u32(value)
}

/// Writes `(hi, lo)` as two consecutive little-endian `u32`s, the split
/// representation `writeUint64` exposes to host-object hooks (§4.1).
pub fn write_u64_pair<W: Write>(mut to: W, hi: u32, lo: u32) -> io::Result<()> {
    write_u32(&mut to, lo)?;
    write_u32(&mut to, hi)
}

/// Writes `value` as 8 little-endian bytes (host byte order).
pub fn write_f64<W: Write>(to: W, value: f64) -> io::Result<()> {
    ByteOrdered::le(to).write_f64(value)
}

/// Writes `bytes` unmodified.
pub fn write_raw_bytes<W: Write>(mut to: W, bytes: &[u8]) -> io::Result<()> {
    to.write_all(bytes)
}
