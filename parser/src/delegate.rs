//! The host-object extensibility hook (§6): a delegate takes over once the
//! core emits (or reads) the `HostObject` tag, and is handed only the
//! low-level primitives named in §4.1/§4.2 — never the encoder's or
//! decoder's own identity/transfer state — so a delegate cannot observe or
//! corrupt bookkeeping that belongs to the core.
//!
//! The default host-object codec for typed views (crate `sclone-views`)
//! is the one concrete implementation of these traits this workspace
//! ships; third-party delegates implement the same traits for their own
//! opaque types.

use sclone_core::Value;
use sclone_encoding::{decode_varint, encode_varint};

/// The subset of [`crate::stateful::encode::Encoder`]'s write primitives a
/// host-object delegate is allowed to use (§4.1).
#[derive(Debug)]
pub struct PrimitiveWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> PrimitiveWriter<'a> {
    pub(crate) fn new(buf: &'a mut Vec<u8>) -> Self {
        PrimitiveWriter { buf }
    }

    pub fn write_uint32(&mut self, value: u32) {
        sclone_encoding::encode::basic::write_u32(&mut *self.buf, value)
            .expect("writes to a Vec<u8> are infallible");
    }

    /// Split-unsigned 64-bit write: low word first, matching
    /// `sclone_encoding::encode::basic::write_u64_pair`.
    pub fn write_uint64(&mut self, hi: u32, lo: u32) {
        sclone_encoding::encode::basic::write_u64_pair(&mut *self.buf, hi, lo)
            .expect("writes to a Vec<u8> are infallible");
    }

    pub fn write_double(&mut self, value: f64) {
        sclone_encoding::encode::basic::write_f64(&mut *self.buf, value)
            .expect("writes to a Vec<u8> are infallible");
    }

    pub fn write_raw_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Not one of §4.1's four named primitives, but needed by any delegate
    /// that wants variable-length framing inside its payload (the default
    /// typed-view codec in `sclone-views` does, per §4.3's "varint
    /// constructor-index, varint byte-length" shape). Exposed here rather
    /// than having every delegate depend on `sclone-encoding` itself for
    /// just this.
    pub fn write_varint(&mut self, value: u64) {
        encode_varint(value, self.buf);
    }
}

/// The subset of [`crate::stateful::decode::Decoder`]'s read primitives a
/// host-object delegate is allowed to use (§4.2).
#[derive(Debug)]
pub struct PrimitiveReader<'a> {
    input: &'a [u8],
    pos: &'a mut usize,
}

impl<'a> PrimitiveReader<'a> {
    pub(crate) fn new(input: &'a [u8], pos: &'a mut usize) -> Self {
        PrimitiveReader { input, pos }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.input[*self.pos..]
    }

    pub fn read_uint32(&mut self) -> Option<u32> {
        let bytes = self.remaining().get(..4)?;
        let value = sclone_encoding::decode::basic::read_u32(bytes).ok()?;
        *self.pos += 4;
        Some(value)
    }

    /// Split-unsigned 64-bit read: returns `(hi, lo)`, the low word having
    /// been written first on the wire.
    pub fn read_uint64(&mut self) -> Option<(u32, u32)> {
        let lo = self.read_uint32()?;
        let hi = self.read_uint32()?;
        Some((hi, lo))
    }

    pub fn read_double(&mut self) -> Option<f64> {
        let bytes = self.remaining().get(..8)?;
        let value = sclone_encoding::decode::basic::read_f64(bytes).ok()?;
        *self.pos += 8;
        Some(value)
    }

    pub fn read_raw_bytes(&mut self, len: usize) -> Option<Vec<u8>> {
        let bytes = self.remaining().get(..len)?.to_vec();
        *self.pos += len;
        Some(bytes)
    }

    /// Companion to [`PrimitiveWriter::write_varint`].
    pub fn read_varint(&mut self) -> Option<u64> {
        let (value, consumed) = decode_varint(self.remaining()).ok()?;
        *self.pos += consumed;
        Some(value)
    }
}

/// Encoder-side host-object delegate (§6 "Delegate interface (encoder
/// side)"). `write_host_object` is `writeHostObject`; there is no separate
/// Rust method for `dataCloneError` because a rejected write already
/// produces a [`crate::error::EncodeError`] through its `Result` — the
/// message a delegate returns on `Err` is exactly the text a `dataCloneError`
/// call would have carried in the original two-operation interface.
pub trait HostObjectEncode {
    /// Writes `value`'s payload using `writer`. `Err(message)` rejects the
    /// value with a clone error carrying `message`.
    fn write_host_object(
        &mut self,
        writer: &mut PrimitiveWriter<'_>,
        value: &Value,
    ) -> Result<(), String>;
}

/// Decoder-side host-object delegate (§6 "Delegate interface (decoder
/// side)").
pub trait HostObjectDecode {
    /// Reads one payload using `reader` and returns the reconstructed
    /// value. The core registers the result in the identity map exactly
    /// like any other composite.
    fn read_host_object(&mut self, reader: &mut PrimitiveReader<'_>) -> Result<Value, String>;
}
