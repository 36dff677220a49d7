//! Identity maps (§3): the encoder's composite → id lookup, and the
//! decoder's id → composite lookup. Both sides assign ids in the same
//! order — the n-th composite *begun* on either side gets id n (invariant
//! 2) — so the decoder's map is a plain append-only `Vec`.

use std::collections::HashMap;

use sclone_core::Value;

/// Encoder-side identity map, keyed by [`Value::identity_key`].
#[derive(Debug, Default)]
pub struct EncoderIdentityMap {
    ids: HashMap<usize, u32>,
}

impl EncoderIdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only identity check, with no side effect. Used ahead of
    /// dispatch so a kind that needs to write something *before* claiming
    /// its own id (a typed view writes its buffer first, per §4.1) can
    /// tell a back-reference apart from a fresh composite without
    /// prematurely registering it.
    pub fn lookup(&self, value: &Value) -> Option<u32> {
        let key = value
            .identity_key()
            .expect("lookup is only called for composite values");
        self.ids.get(&key).copied()
    }

    /// Registers `value` under a fresh id. Panics if it was already
    /// registered — callers must `lookup` first.
    pub fn assign_new(&mut self, value: &Value) -> u32 {
        let key = value
            .identity_key()
            .expect("assign_new is only called for composite values");
        assert!(
            !self.ids.contains_key(&key),
            "assign_new called on an already-registered composite"
        );
        let id = self.ids.len() as u32;
        self.ids.insert(key, id);
        id
    }
}

/// Decoder-side identity map. Ids are handed out in registration order, so
/// resolution is a direct index.
#[derive(Debug, Default)]
pub struct DecoderIdentityMap {
    by_id: Vec<Value>,
}

impl DecoderIdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under the next id (called before its contents are
    /// read, per §4.2's "register-before-recurse" rule) and returns that id.
    pub fn register(&mut self, value: Value) -> u32 {
        let id = self.by_id.len() as u32;
        self.by_id.push(value);
        id
    }

    /// Resolves a previously registered id, as encountered via
    /// `ObjectReference`.
    pub fn resolve(&self, id: u32) -> Option<Value> {
        self.by_id.get(id as usize).cloned()
    }
}
