//! The stateful encoder (§4.1): walks a [`Value`] graph once and produces
//! the accumulated byte stream, tracking identity and byte-buffer transfers
//! as it goes.

use sclone_core::tag;
use sclone_core::value::{DenseArray, MapValue, Record, Ref, SetValue, SparseArray};
use sclone_core::{Value, WIRE_FORMAT_VERSION};
use sclone_encoding::varint::{encode_varint, zigzag_encode};
use tracing::trace;

use crate::delegate::{HostObjectEncode, PrimitiveWriter};
use crate::error::{DuplicateTransferSnafu, EncodeError, EncodeResult, UnknownHostObjectTypeSnafu};
use crate::identity::EncoderIdentityMap;
use crate::transfer::EncoderTransferMap;

/// Walks a value graph and produces bytes (§4.1). One instance corresponds
/// to one output stream: identity and transfer state are not reset between
/// [`Encoder::write_value`] calls, so a composite shared across two calls
/// is a back-reference on the second (§4.1 `writeValue`).
#[derive(Debug)]
pub struct Encoder {
    buf: Vec<u8>,
    ids: EncoderIdentityMap,
    transfers: EncoderTransferMap,
    treat_typed_views_as_host_objects: bool,
    delegate: Option<Box<dyn HostObjectEncode>>,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new(None)
    }
}

impl Encoder {
    /// Creates a fresh encoder. `delegate` handles `HostObject` values and,
    /// if [`Encoder::set_treat_typed_views_as_host_objects`] is set, typed
    /// views as well.
    pub fn new(delegate: Option<Box<dyn HostObjectEncode>>) -> Self {
        Encoder {
            buf: Vec::new(),
            ids: EncoderIdentityMap::new(),
            transfers: EncoderTransferMap::new(),
            treat_typed_views_as_host_objects: false,
            delegate,
        }
    }

    /// Emits the `Version` tag followed by `varint(13)`. Must be called
    /// exactly once, before any call to [`Encoder::write_value`].
    pub fn write_header(&mut self) {
        self.write_tag(tag::VERSION);
        self.write_varint(WIRE_FORMAT_VERSION as u64);
    }

    /// If set, typed views dispatch to the host-object hook rather than the
    /// native `TypedView` wire path.
    pub fn set_treat_typed_views_as_host_objects(&mut self, flag: bool) {
        self.treat_typed_views_as_host_objects = flag;
    }

    /// Registers `handle` for transfer under `id`, ahead of any
    /// [`Encoder::write_value`] call that would otherwise serialize its
    /// bytes inline.
    pub fn transfer_byte_buffer(&mut self, id: u32, handle: Ref<Vec<u8>>) -> EncodeResult<()> {
        if self.transfers.register(id, &handle) {
            Ok(())
        } else {
            DuplicateTransferSnafu.fail()
        }
    }

    /// Returns the accumulated byte stream, consuming this encoder.
    pub fn release(self) -> Vec<u8> {
        self.buf
    }

    /// Emits one value (§4.1 "Value dispatch"). May be called repeatedly;
    /// later calls share the identity map with earlier ones.
    pub fn write_value(&mut self, value: &Value) -> EncodeResult<()> {
        match value {
            Value::Number(n) => {
                if is_representable_as_int32(*n) {
                    self.write_tag(tag::INT32);
                    self.write_varint(zigzag_encode(*n as i64));
                } else {
                    self.write_tag(tag::DOUBLE);
                    self.write_double(*n);
                }
                Ok(())
            }
            Value::TheHole => {
                self.write_tag(tag::THE_HOLE);
                Ok(())
            }
            Value::Undefined => {
                self.write_tag(tag::UNDEFINED);
                Ok(())
            }
            Value::Null => {
                self.write_tag(tag::NULL);
                Ok(())
            }
            Value::Bool(true) => {
                self.write_tag(tag::TRUE);
                Ok(())
            }
            Value::Bool(false) => {
                self.write_tag(tag::FALSE);
                Ok(())
            }
            Value::Str(s) => {
                self.write_string(s);
                Ok(())
            }
            _ => self.write_composite(value),
        }
    }

    /// Composite path (§4.1 "Composite path"): a back-reference on a hit,
    /// or a fresh id followed by the kind-specific body on a miss.
    ///
    /// Typed views are the one exception to "assign the id, then recurse":
    /// the underlying byte buffer must be emitted (and thus claim its own,
    /// lower id) before the view claims its id, per §4.1's pairing rule and
    /// §9's note that the id sequence mirrors composite-begin order.
    fn write_composite(&mut self, value: &Value) -> EncodeResult<()> {
        if let Some(id) = self.ids.lookup(value) {
            self.write_tag(tag::OBJECT_REFERENCE);
            self.write_varint(id as u64);
            return Ok(());
        }

        if let Value::TypedView(view) = value {
            if !self.treat_typed_views_as_host_objects {
                return self.write_typed_view_native(value, view);
            }
        }

        let id = self.ids.assign_new(value);
        trace!(id, "composite begin");
        self.write_composite_body(value)
    }

    fn write_composite_body(&mut self, value: &Value) -> EncodeResult<()> {
        match value {
            Value::Record(r) => self.write_record(&r.borrow()),
            Value::DenseArray(r) => self.write_dense_array(&r.borrow()),
            Value::SparseArray(r) => self.write_sparse_array(&r.borrow()),
            Value::Date(r) => {
                self.write_tag(tag::DATE);
                self.write_double(*r.borrow());
                Ok(())
            }
            Value::BooleanObject(r) => {
                self.write_tag(if *r.borrow() {
                    tag::BOOLEAN_OBJECT_TRUE
                } else {
                    tag::BOOLEAN_OBJECT_FALSE
                });
                Ok(())
            }
            Value::NumberObject(r) => {
                self.write_tag(tag::NUMBER_OBJECT);
                self.write_double(*r.borrow());
                Ok(())
            }
            Value::StringObject(r) => {
                self.write_tag(tag::STRING_OBJECT);
                self.write_string(&r.borrow());
                Ok(())
            }
            Value::RegExp(r) => {
                let re = r.borrow();
                self.write_tag(tag::REGEXP);
                self.write_string(&re.pattern);
                self.write_varint(re.flags.to_bits() as u64);
                Ok(())
            }
            Value::Map(r) => self.write_map(&r.borrow()),
            Value::Set(r) => self.write_set(&r.borrow()),
            Value::ByteBuffer(r) => {
                self.write_byte_buffer_body(r);
                Ok(())
            }
            // Only reached when treat_typed_views_as_host_objects is set;
            // the native path is handled in write_composite before an id
            // is ever assigned.
            Value::TypedView(_) | Value::HostObject(_) => self.write_host_object_value(value),
            Value::TheHole
            | Value::Undefined
            | Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::Str(_) => {
                unreachable!("non-composite values are dispatched in write_value")
            }
        }
    }

    fn write_record(&mut self, rec: &Record) -> EncodeResult<()> {
        self.write_tag(tag::RECORD_BEGIN);
        for (k, v) in &rec.entries {
            self.write_value(k)?;
            self.write_value(v)?;
        }
        self.write_tag(tag::RECORD_END);
        self.write_varint(rec.entries.len() as u64);
        Ok(())
    }

    fn write_dense_array(&mut self, arr: &DenseArray) -> EncodeResult<()> {
        self.write_tag(tag::DENSE_ARRAY_BEGIN);
        self.write_varint(arr.length as u64);
        for element in &arr.elements {
            match element {
                Some(v) => self.write_value(v)?,
                None => self.write_tag(tag::THE_HOLE),
            }
        }
        for (k, v) in &arr.properties {
            self.write_value(k)?;
            self.write_value(v)?;
        }
        self.write_tag(tag::DENSE_ARRAY_END);
        self.write_varint(arr.properties.len() as u64);
        self.write_varint(arr.length as u64);
        Ok(())
    }

    fn write_sparse_array(&mut self, arr: &SparseArray) -> EncodeResult<()> {
        self.write_tag(tag::SPARSE_ARRAY_BEGIN);
        self.write_varint(arr.length as u64);
        for (k, v) in &arr.properties {
            self.write_value(k)?;
            self.write_value(v)?;
        }
        self.write_tag(tag::SPARSE_ARRAY_END);
        self.write_varint(arr.properties.len() as u64);
        self.write_varint(arr.length as u64);
        Ok(())
    }

    fn write_map(&mut self, map: &MapValue) -> EncodeResult<()> {
        self.write_tag(tag::MAP_BEGIN);
        for (k, v) in &map.entries {
            self.write_value(k)?;
            self.write_value(v)?;
        }
        self.write_tag(tag::MAP_END);
        self.write_varint(map.entries.len() as u64);
        Ok(())
    }

    fn write_set(&mut self, set: &SetValue) -> EncodeResult<()> {
        self.write_tag(tag::SET_BEGIN);
        for v in &set.values {
            self.write_value(v)?;
        }
        self.write_tag(tag::SET_END);
        self.write_varint(set.values.len() as u64);
        Ok(())
    }

    fn write_byte_buffer_body(&mut self, handle: &Ref<Vec<u8>>) {
        if let Some(id) = self.transfers.lookup(handle) {
            self.write_tag(tag::BYTE_BUFFER_TRANSFER);
            self.write_varint(id as u64);
        } else {
            let bytes = handle.borrow();
            self.write_tag(tag::BYTE_BUFFER);
            self.write_varint(bytes.len() as u64);
            self.write_raw_bytes(&bytes);
        }
    }

    /// Emits the underlying byte buffer (claiming its own, lower id) before
    /// registering and emitting the view itself (§4.1, §9 "Typed view /
    /// byte buffer pairing").
    fn write_typed_view_native(
        &mut self,
        value: &Value,
        view: &Ref<sclone_core::value::TypedView>,
    ) -> EncodeResult<()> {
        let (buffer, kind, byte_offset, byte_length) = {
            let v = view.borrow();
            (v.buffer.clone(), v.kind, v.byte_offset, v.byte_length)
        };
        self.write_value(&Value::ByteBuffer(buffer))?;

        let id = self.ids.assign_new(value);
        trace!(id, "typed view begin");
        self.write_tag(tag::TYPED_VIEW);
        self.buf.push(kind.to_subtag());
        self.write_varint(byte_offset as u64);
        self.write_varint(byte_length as u64);
        Ok(())
    }

    fn write_host_object_value(&mut self, value: &Value) -> EncodeResult<()> {
        self.write_tag(tag::HOST_OBJECT);
        match self.delegate.take() {
            Some(mut delegate) => {
                let mut writer = PrimitiveWriter::new(&mut self.buf);
                let result = delegate.write_host_object(&mut writer, value);
                self.delegate = Some(delegate);
                result.map_err(|description| EncodeError::ValueNotCloneable { description })
            }
            None => {
                tracing::debug!(description = %value.describe(), "no host-object delegate");
                UnknownHostObjectTypeSnafu {
                    description: value.describe(),
                }
                .fail()
            }
        }
    }

    /// §4.1 "String encoding": latin-1 code units fit in `OneByteString`;
    /// anything else is aligned and written as UTF-16LE.
    fn write_string(&mut self, s: &str) {
        if s.chars().all(|c| (c as u32) <= 0xFF) {
            let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
            self.write_tag(tag::ONE_BYTE_STRING);
            self.write_varint(bytes.len() as u64);
            self.write_raw_bytes(&bytes);
            return;
        }

        let units: Vec<u16> = s.encode_utf16().collect();
        let byte_len = units.len() * 2;
        let mut len_varint = Vec::new();
        encode_varint(byte_len as u64, &mut len_varint);

        // The payload must start at an even offset so a reader can treat it
        // as native 16-bit units without copying (§4.1, §9).
        let body_start_if_unpadded = self.buf.len() + 1 + len_varint.len();
        if body_start_if_unpadded % 2 != 0 {
            self.write_tag(tag::PADDING);
        }

        self.write_tag(tag::TWO_BYTE_STRING);
        self.buf.extend_from_slice(&len_varint);
        for unit in units {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
    }

    fn write_tag(&mut self, t: u8) {
        self.buf.push(t);
    }

    fn write_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buf);
    }

    fn write_double(&mut self, value: f64) {
        sclone_encoding::encode::basic::write_f64(&mut self.buf, value)
            .expect("writes to a Vec<u8> are infallible");
    }

    fn write_raw_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Whether `n` round-trips through a signed 32-bit `Int32` ZigZag varint
/// without loss (§4.1 step 1): an integer value within range.
fn is_representable_as_int32(n: f64) -> bool {
    n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use sclone_core::{new_ref, Record};

    #[test]
    fn header_then_int32() {
        let mut enc = Encoder::default();
        enc.write_header();
        enc.write_value(&Value::Number(42.0)).unwrap();
        // scenario 3 (spec §8): header + Int32 ZigZag(84)
        assert_eq!(enc.release(), vec![0xff, 0x0d, b'I', 84]);
    }

    #[test]
    fn negative_quarter_is_a_double() {
        let mut enc = Encoder::default();
        enc.write_value(&Value::Number(-0.25)).unwrap();
        let bytes = enc.release();
        assert_eq!(bytes[0], tag::DOUBLE);
        assert_eq!(&bytes[1..], &(-0.25f64).to_le_bytes());
    }

    #[test]
    fn record_scenario_matches_ground_truth() {
        // scenario 1 (spec §8): encode({foo: "bar"})
        let rec = new_ref(Record::default());
        rec.borrow_mut().entries.push((
            Value::Str("foo".to_string()),
            Value::Str("bar".to_string()),
        ));
        let mut enc = Encoder::default();
        enc.write_header();
        enc.write_value(&Value::Record(rec)).unwrap();
        let expected: &[u8] = &[
            0xff, 0x0d, b'o', b'"', 0x03, b'f', b'o', b'o', b'"', 0x03, b'b', b'a', b'r', b'{',
            0x01,
        ];
        assert_eq!(enc.release(), expected);
    }

    #[test]
    fn shared_subtree_is_a_back_reference() {
        let shared = new_ref(Record::default());
        let outer = new_ref(Record::default());
        outer.borrow_mut().entries.push((
            Value::Str("a".to_string()),
            Value::Record(shared.clone()),
        ));
        outer.borrow_mut().entries.push((
            Value::Str("b".to_string()),
            Value::Record(shared),
        ));
        let mut enc = Encoder::default();
        enc.write_value(&Value::Record(outer)).unwrap();
        let bytes = enc.release();
        // second occurrence of the shared record is an ObjectReference to
        // id 1 (outer record is id 0, shared record is id 1).
        assert!(bytes
            .windows(2)
            .any(|w| w == [tag::OBJECT_REFERENCE, 0x01]));
    }

    #[test]
    fn two_byte_string_is_padded_to_an_even_offset() {
        let mut enc = Encoder::default();
        // one odd-length latin-1 string pushes the cursor to an odd offset
        // before the wide string begins.
        enc.write_value(&Value::Str("x".to_string())).unwrap();
        enc.write_value(&Value::Str("\u{4e2d}".to_string())).unwrap();
        let bytes = enc.release();
        let tag_pos = bytes
            .iter()
            .position(|&b| b == tag::TWO_BYTE_STRING)
            .unwrap();
        let len_varint_len = 1; // byte_len = 2, fits in one varint byte
        assert_eq!((tag_pos + 1 + len_varint_len) % 2, 0);
    }

    #[test]
    fn unknown_host_object_without_delegate_is_a_clone_error() {
        #[derive(Debug)]
        struct Opaque;
        impl sclone_core::HostObject for Opaque {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
        use std::rc::Rc;

        let mut enc = Encoder::default();
        let err = enc
            .write_value(&Value::HostObject(
                Rc::new(Opaque) as Rc<dyn sclone_core::HostObject>
            ))
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnknownHostObjectType { .. }));
    }
}
