//! The two state machines (§4.1, §4.2): an [`encode::Encoder`] that walks a
//! value graph and produces bytes, and a [`decode::Decoder`] that walks
//! bytes and produces a value graph. Everything each one needs to resolve
//! identity and byte-buffer transfers lives on `self`; neither holds a
//! reference to the other.

pub mod decode;
pub mod encode;
