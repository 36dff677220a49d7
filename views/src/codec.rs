//! `varint constructor-index, varint byte-length, raw bytes` (§4.3).
//!
//! The constructor index is the position of the view's element kind in
//! [`sclone_core::ViewKind::ALL`], with one further index —
//! [`RAW_WRAPPER_CONSTRUCTOR_INDEX`], one past the end of that table —
//! standing for a plain byte buffer carried as a host object rather than a
//! typed view. [`RawBytesHostObject`] is the value produced for that case.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use sclone_core::value::TypedView;
use sclone_core::{new_ref, HostObject, Value, ViewKind};
use sclone_parser::{HostObjectDecode, HostObjectEncode, PrimitiveReader, PrimitiveWriter};

/// One past [`ViewKind::ALL`]'s last constructor-table index: the
/// out-of-band "raw byte wrapper" entry of §4.3.
pub const RAW_WRAPPER_CONSTRUCTOR_INDEX: u64 = ViewKind::ALL.len() as u64;

/// A byte buffer that was carried through the host-object path instead of
/// the core `ByteBuffer`/`TypedView` tags — the §4.3 "raw byte wrapper"
/// case. Unlike [`sclone_core::Value::ByteBuffer`], this is never paired
/// with a view and never participates in the byte-buffer-transfer map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBytesHostObject(pub Vec<u8>);

impl HostObject for RawBytesHostObject {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The default host-object codec for typed views (§4.3). Install on both
/// sides when using
/// [`sclone_parser::stateful::encode::Encoder::set_treat_typed_views_as_host_objects`];
/// the decoder accepts the resulting payload unconditionally, since there
/// is nothing in the wire stream to tell it a `HostObject` tag came from
/// this codec versus another delegate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypedViewCodec;

impl HostObjectEncode for TypedViewCodec {
    fn write_host_object(
        &mut self,
        writer: &mut PrimitiveWriter<'_>,
        value: &Value,
    ) -> Result<(), String> {
        match value {
            Value::TypedView(view) => {
                let view = view.borrow();
                let buffer = view.buffer.borrow();
                let start = view.byte_offset as usize;
                let end = start
                    .checked_add(view.byte_length as usize)
                    .filter(|&end| end <= buffer.len())
                    .ok_or_else(|| "typed view byte range exceeds its buffer".to_string())?;
                writer.write_varint(view.kind.constructor_index() as u64);
                writer.write_varint(view.byte_length as u64);
                writer.write_raw_bytes(&buffer[start..end]);
                Ok(())
            }
            Value::HostObject(host) => {
                let raw = host
                    .as_any()
                    .downcast_ref::<RawBytesHostObject>()
                    .ok_or_else(|| value.describe())?;
                writer.write_varint(RAW_WRAPPER_CONSTRUCTOR_INDEX);
                writer.write_varint(raw.0.len() as u64);
                writer.write_raw_bytes(&raw.0);
                Ok(())
            }
            other => Err(other.describe()),
        }
    }
}

impl HostObjectDecode for TypedViewCodec {
    fn read_host_object(&mut self, reader: &mut PrimitiveReader<'_>) -> Result<Value, String> {
        let index = reader
            .read_varint()
            .ok_or_else(|| "truncated typed-view host object payload".to_string())?;
        let byte_length = reader
            .read_varint()
            .ok_or_else(|| "truncated typed-view host object payload".to_string())?;
        let byte_length = usize::try_from(byte_length)
            .map_err(|_| "typed-view byte length out of range".to_string())?;
        let bytes = reader
            .read_raw_bytes(byte_length)
            .ok_or_else(|| "truncated typed-view host object payload".to_string())?;

        if index == RAW_WRAPPER_CONSTRUCTOR_INDEX {
            return Ok(Value::HostObject(
                Rc::new(RawBytesHostObject(bytes)) as Rc<dyn HostObject>
            ));
        }

        let kind = usize::try_from(index)
            .ok()
            .and_then(ViewKind::from_constructor_index)
            .ok_or_else(|| format!("unknown typed-view constructor index {index}"))?;

        // `bytes` was just read fresh off the wire, so it is already a
        // standalone allocation sized exactly to this view: the "copy into
        // a fresh aligned buffer" case of §4.3 always applies here, since
        // this delegate only ever sees an owned copy of the payload (it has
        // no access to the decoder's input slice to construct zero-copy
        // over). The boundary behavior this produces — "the decoded view's
        // byte buffer is a distinct allocation from the original" (spec
        // §8) — is exactly what callers observe.
        let byte_length = bytes.len() as u32;
        let view = new_ref(TypedView {
            buffer: new_ref(bytes),
            kind,
            byte_offset: 0,
            byte_length,
        });
        Ok(Value::TypedView(view))
    }
}

impl fmt::Display for RawBytesHostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[object ArrayBuffer] ({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclone_parser::{Decoder, Encoder};

    fn view_of(bytes: Vec<u8>, kind: ViewKind, byte_offset: u32, byte_length: u32) -> Value {
        let buffer = new_ref(bytes);
        Value::TypedView(new_ref(TypedView {
            buffer,
            kind,
            byte_offset,
            byte_length,
        }))
    }

    #[test]
    fn typed_view_round_trips_through_host_object_path() {
        // scenario 2 (spec §8): Uint16Array([0xdead, 0xbeef]) at an odd
        // offset of a surrounding buffer.
        let mut bytes = vec![0xAA];
        bytes.extend_from_slice(&0xDEADu16.to_le_bytes());
        bytes.extend_from_slice(&0xBEEFu16.to_le_bytes());
        let original = view_of(bytes, ViewKind::Uint16, 1, 4);

        let mut enc = Encoder::new(Some(Box::new(TypedViewCodec)));
        enc.set_treat_typed_views_as_host_objects(true);
        enc.write_value(&original).unwrap();
        let wire = enc.release();

        let mut dec = Decoder::new(&wire, Some(Box::new(TypedViewCodec)));
        let decoded = dec.read_value().unwrap();
        match decoded {
            Value::TypedView(v) => {
                let v = v.borrow();
                assert_eq!(v.kind, ViewKind::Uint16);
                assert_eq!(v.byte_offset, 0);
                assert_eq!(v.byte_length, 4);
                assert_eq!(
                    *v.buffer.borrow(),
                    vec![0xAD, 0xDE, 0xEF, 0xBE]
                );
            }
            other => panic!("expected a typed view, got {other:?}"),
        }
    }

    #[test]
    fn decoded_buffer_is_a_distinct_allocation() {
        let bytes = vec![1, 2, 3, 4];
        let buffer = new_ref(bytes.clone());
        let original = Value::TypedView(new_ref(TypedView {
            buffer: buffer.clone(),
            kind: ViewKind::Uint8,
            byte_offset: 0,
            byte_length: 4,
        }));

        let mut enc = Encoder::new(Some(Box::new(TypedViewCodec)));
        enc.set_treat_typed_views_as_host_objects(true);
        enc.write_value(&original).unwrap();
        let wire = enc.release();

        let mut dec = Decoder::new(&wire, Some(Box::new(TypedViewCodec)));
        let decoded = dec.read_value().unwrap();
        let Value::TypedView(decoded_view) = decoded else {
            panic!("expected a typed view");
        };
        assert!(!std::rc::Rc::ptr_eq(&buffer, &decoded_view.borrow().buffer));
    }

    #[test]
    fn raw_wrapper_round_trips() {
        let original = Value::HostObject(
            Rc::new(RawBytesHostObject(vec![9, 8, 7])) as Rc<dyn HostObject>
        );
        let mut enc = Encoder::new(Some(Box::new(TypedViewCodec)));
        enc.write_value(&original).unwrap();
        let wire = enc.release();

        let mut dec = Decoder::new(&wire, Some(Box::new(TypedViewCodec)));
        match dec.read_value().unwrap() {
            Value::HostObject(h) => {
                let raw = h.as_any().downcast_ref::<RawBytesHostObject>().unwrap();
                assert_eq!(raw.0, vec![9, 8, 7]);
            }
            other => panic!("expected a host object, got {other:?}"),
        }
    }
}
