//! Little-endian readers for the fixed-width primitives: 32-bit
//! lengths/ids and 64-bit doubles. See [`crate::encode::basic`] for why
//! there is only one endianness here, unlike `dicom-encoding`'s
//! `BasicDecode`.

use byteordered::ByteOrdered;
use std::io::{self, Read};

/// Reads 4 little-endian bytes as a `u32`.
pub fn read_u32<R: Read>(from: R) -> io::Result<u32> {
    ByteOrdered::le(from).read_u32()
}

/// Reads two consecutive little-endian `u32`s (low word first) and returns
/// them as `(hi, lo)`, the split representation `readUint64` exposes to
/// host-object hooks (§4.2).
pub fn read_u64_pair<R: Read>(mut from: R) -> io::Result<(u32, u32)> {
    let lo = read_u32(&mut from)?;
    let hi = read_u32(&mut from)?;
    Ok((hi, lo))
}

/// Reads 8 little-endian bytes (host byte order) as an `f64`.
pub fn read_f64<R: Read>(from: R) -> io::Result<f64> {
    ByteOrdered::le(from).read_f64()
}

/// Reads exactly `len` raw bytes.
pub fn read_raw_bytes<R: Read>(mut from: R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    from.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trips_through_write() {
        let mut buf = Vec::new();
        crate::encode::basic::write_u32(&mut buf, 0xDEAD_BEEF).unwrap();
        assert_eq!(read_u32(&buf[..]).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn f64_round_trips_negative_quarter() {
        let mut buf = Vec::new();
        crate::encode::basic::write_f64(&mut buf, -0.25).unwrap();
        assert_eq!(read_f64(&buf[..]).unwrap(), -0.25);
    }

    #[test]
    fn u64_pair_round_trips() {
        let mut buf = Vec::new();
        crate::encode::basic::write_u64_pair(&mut buf, 0x8000_0000, 0x7000_0000).unwrap();
        assert_eq!(read_u64_pair(&buf[..]).unwrap(), (0x8000_0000, 0x7000_0000));
    }
}
