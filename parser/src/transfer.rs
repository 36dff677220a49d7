//! Byte-buffer transfer maps (§3): both sides agree on a caller-chosen
//! 32-bit transfer id standing in for a byte-buffer handle, so a buffer can
//! cross the wire by reference instead of by copy.

use std::collections::HashMap;
use std::rc::Rc;

use sclone_core::value::Ref;

/// Encoder-side transfer map. Registration is keyed by the buffer's
/// identity so a second registration of the same handle is rejected
/// regardless of the id it's given (§4.1 `transferByteBuffer`).
#[derive(Debug, Default)]
pub struct EncoderTransferMap {
    by_buffer: HashMap<usize, u32>,
}

impl EncoderTransferMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` for transfer under `id`. Returns `false` if this
    /// handle was already registered (the caller turns that into
    /// [`crate::error::EncodeError::DuplicateTransfer`]).
    pub fn register(&mut self, id: u32, handle: &Ref<Vec<u8>>) -> bool {
        let key = Rc::as_ptr(handle) as usize;
        if self.by_buffer.contains_key(&key) {
            return false;
        }
        self.by_buffer.insert(key, id);
        true
    }

    /// Looks up the transfer id registered for `handle`, if any.
    pub fn lookup(&self, handle: &Ref<Vec<u8>>) -> Option<u32> {
        let key = Rc::as_ptr(handle) as usize;
        self.by_buffer.get(&key).copied()
    }
}

/// Decoder-side transfer map: resolves a wire transfer id back to the
/// caller-supplied handle.
#[derive(Debug, Default)]
pub struct DecoderTransferMap {
    by_id: HashMap<u32, Ref<Vec<u8>>>,
}

impl DecoderTransferMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: u32, handle: Ref<Vec<u8>>) {
        self.by_id.insert(id, handle);
    }

    pub fn resolve(&self, id: u32) -> Option<Ref<Vec<u8>>> {
        self.by_id.get(&id).cloned()
    }
}
