//! The stateful decoder (§4.2): a recursive-descent automaton keyed on tag
//! byte, reconstructing a [`Value`] graph from a byte slice while
//! resolving identity and byte-buffer transfers.

use snafu::{OptionExt, ResultExt};
use tracing::{trace, warn};

use sclone_core::value::{DenseArray, MapValue, Record, Ref, RegExp, SetValue, SparseArray, TypedView};
use sclone_core::{new_ref, tag, RegExpFlags, Value, ViewKind, WIRE_FORMAT_VERSION};
use sclone_encoding::varint::{decode_varint, zigzag_decode};

use crate::delegate::{HostObjectDecode, PrimitiveReader};
use crate::error::{
    DecodeError, DecodeResult, HostObjectRejectedSnafu, MalformedSnafu, MissingTransferSnafu,
    NoHostObjectDelegateSnafu, UnknownTagSnafu, UnsupportedVersionSnafu, VarintSnafu,
};
use crate::identity::DecoderIdentityMap;
use crate::transfer::DecoderTransferMap;

/// Reconstructs a value graph from a byte slice (§4.2). Initial state: no
/// version detected, cursor at 0. Terminal state: one value produced per
/// [`Decoder::read_value`] call, or an error — per §7, a decoder that has
/// returned an error must not be reused.
#[derive(Debug)]
pub struct Decoder<'de> {
    input: &'de [u8],
    pos: usize,
    version: u32,
    ids: DecoderIdentityMap,
    transfers: DecoderTransferMap,
    delegate: Option<Box<dyn HostObjectDecode>>,
}

impl<'de> Decoder<'de> {
    /// Creates a decoder over `input`. `delegate` reads `HostObject`
    /// payloads and, at wire-format versions below 13, unrecognized tags
    /// (§4.2 "Legacy tolerance").
    pub fn new(input: &'de [u8], delegate: Option<Box<dyn HostObjectDecode>>) -> Self {
        Decoder {
            input,
            pos: 0,
            version: 0,
            ids: DecoderIdentityMap::new(),
            transfers: DecoderTransferMap::new(),
            delegate,
        }
    }

    /// Consumes the `Version` tag and its varint if present; otherwise
    /// leaves the cursor untouched and the version at its legacy default
    /// of 0 (§4.2 `readHeader`).
    pub fn read_header(&mut self) -> DecodeResult<()> {
        let start = self.pos;
        let mut probe = self.pos;
        while self.input.get(probe) == Some(&tag::PADDING) {
            probe += 1;
        }
        if self.input.get(probe) != Some(&tag::VERSION) {
            self.pos = start;
            return Ok(());
        }
        self.pos = probe + 1;
        let version = self.read_varint()?;
        let version = u32::try_from(version).unwrap_or(u32::MAX);
        if version > WIRE_FORMAT_VERSION {
            return UnsupportedVersionSnafu { version }.fail();
        }
        self.version = version;
        Ok(())
    }

    /// The wire-format version detected by [`Decoder::read_header`], or 0
    /// if no header was present.
    pub fn get_wire_format_version(&self) -> u32 {
        self.version
    }

    /// Registers `handle` so a later `ByteBufferTransfer`/`SharedByteBuffer`
    /// carrying `id` resolves to it (§4.2).
    pub fn transfer_byte_buffer(&mut self, id: u32, handle: Ref<Vec<u8>>) {
        self.transfers.register(id, handle);
    }

    /// Consumes one encoded value, skipping any leading `Padding` (§4.2
    /// `readValue`).
    pub fn read_value(&mut self) -> DecodeResult<Value> {
        loop {
            let tag_pos = self.pos;
            let t = self.read_u8()?;
            match t {
                tag::PADDING => continue,
                tag::VERIFY_OBJECT_COUNT => {
                    self.read_varint()?;
                    continue;
                }
                tag::THE_HOLE => return Ok(Value::TheHole),
                tag::UNDEFINED => return Ok(Value::Undefined),
                tag::NULL => return Ok(Value::Null),
                tag::TRUE => return Ok(Value::Bool(true)),
                tag::FALSE => return Ok(Value::Bool(false)),
                tag::INT32 => {
                    let z = self.read_varint()?;
                    return Ok(Value::Number(zigzag_decode(z) as f64));
                }
                tag::UINT32 => {
                    let v = self.read_varint()?;
                    return Ok(Value::Number(v as f64));
                }
                tag::DOUBLE => return Ok(Value::Number(self.read_double()?)),
                tag::UTF8_STRING => return Ok(Value::Str(self.read_utf8_string_payload()?)),
                tag::ONE_BYTE_STRING => return Ok(Value::Str(self.read_one_byte_string_payload()?)),
                tag::TWO_BYTE_STRING => return Ok(Value::Str(self.read_two_byte_string_payload()?)),
                tag::OBJECT_REFERENCE => return self.read_object_reference(),
                tag::RECORD_BEGIN => return self.read_record(),
                tag::SPARSE_ARRAY_BEGIN => return self.read_sparse_array(),
                tag::DENSE_ARRAY_BEGIN => return self.read_dense_array(),
                tag::DATE => return self.read_date(),
                tag::BOOLEAN_OBJECT_TRUE => return self.read_boolean_object(true),
                tag::BOOLEAN_OBJECT_FALSE => return self.read_boolean_object(false),
                tag::NUMBER_OBJECT => return self.read_number_object(),
                tag::STRING_OBJECT => return self.read_string_object(),
                tag::REGEXP => return self.read_regexp(),
                tag::MAP_BEGIN => return self.read_map(),
                tag::SET_BEGIN => return self.read_set(),
                tag::BYTE_BUFFER => {
                    let buffer = self.read_byte_buffer_alloc()?;
                    return self.resolve_typed_view_or_buffer(buffer);
                }
                tag::BYTE_BUFFER_TRANSFER | tag::SHARED_BYTE_BUFFER => {
                    let buffer = self.read_byte_buffer_transfer(tag_pos)?;
                    return self.resolve_typed_view_or_buffer(buffer);
                }
                tag::HOST_OBJECT => return self.read_host_object_value(tag_pos),
                other => return self.read_legacy_or_unknown(other, tag_pos),
            }
        }
    }

    /// Primitive exposed to host-object hooks (§4.2).
    pub fn read_uint32(&mut self) -> DecodeResult<u32> {
        self.read_u32()
    }

    /// Split-unsigned 64-bit primitive exposed to host-object hooks (§4.2):
    /// returns `(hi, lo)`.
    pub fn read_uint64(&mut self) -> DecodeResult<(u32, u32)> {
        let lo = self.read_u32()?;
        let hi = self.read_u32()?;
        Ok((hi, lo))
    }

    /// Primitive exposed to host-object hooks (§4.2).
    pub fn read_double_primitive(&mut self) -> DecodeResult<f64> {
        self.read_double()
    }

    /// Primitive exposed to host-object hooks (§4.2).
    pub fn read_raw_bytes_primitive(&mut self, len: usize) -> DecodeResult<Vec<u8>> {
        self.read_raw_bytes(len)
    }

    fn read_legacy_or_unknown(&mut self, t: u8, tag_pos: usize) -> DecodeResult<Value> {
        if self.version < 13 {
            warn!(tag = t, position = tag_pos, "unknown tag at legacy version, delegating");
            self.pos = tag_pos;
            return self.read_host_object_value(tag_pos);
        }
        UnknownTagSnafu {
            tag: t,
            position: tag_pos as u64,
        }
        .fail()
    }

    fn read_host_object_value(&mut self, tag_pos: usize) -> DecodeResult<Value> {
        let mut delegate = self
            .delegate
            .take()
            .context(NoHostObjectDelegateSnafu { position: tag_pos as u64 })?;
        let mut reader = PrimitiveReader::new(self.input, &mut self.pos);
        let result = delegate.read_host_object(&mut reader);
        self.delegate = Some(delegate);
        let value = result.map_err(|message| DecodeError::HostObjectRejected { message })?;
        self.ids.register(value.clone());
        Ok(value)
    }

    fn read_object_reference(&mut self) -> DecodeResult<Value> {
        let id = self.read_varint()? as u32;
        self.ids.resolve(id).ok_or(()).or_else(|_| self.malformed())
    }

    fn read_record(&mut self) -> DecodeResult<Value> {
        let r = new_ref(Record::default());
        let value = Value::Record(r.clone());
        self.ids.register(value.clone());
        trace!(tag = "record", "composite begin");
        while self.peek_significant_tag()? != tag::RECORD_END {
            let key = self.read_value()?;
            let val = self.read_value()?;
            r.borrow_mut().entries.push((key, val));
        }
        self.read_u8()?;
        let declared = self.read_varint()? as usize;
        if declared != r.borrow().entries.len() {
            return self.malformed();
        }
        Ok(value)
    }

    fn read_dense_array(&mut self) -> DecodeResult<Value> {
        let arr = new_ref(DenseArray::default());
        let value = Value::DenseArray(arr.clone());
        self.ids.register(value.clone());
        trace!(tag = "dense_array", "composite begin");

        let length = self.read_varint()? as u32;
        let mut elements = Vec::with_capacity(length as usize);
        for _ in 0..length {
            if self.peek_significant_tag()? == tag::THE_HOLE {
                self.read_u8()?;
                elements.push(None);
            } else {
                let v = self.read_value()?;
                if self.version < 11 && matches!(v, Value::Undefined) {
                    warn!("legacy dense array: treating Undefined element as a hole");
                    elements.push(None);
                } else {
                    elements.push(Some(v));
                }
            }
        }

        let mut properties = Vec::new();
        while self.peek_significant_tag()? != tag::DENSE_ARRAY_END {
            let key = self.read_value()?;
            let val = self.read_value()?;
            properties.push((key, val));
        }
        self.read_u8()?;
        let declared_properties = self.read_varint()? as usize;
        let declared_length = self.read_varint()? as u32;
        if declared_properties != properties.len() || declared_length != length {
            return self.malformed();
        }

        let mut a = arr.borrow_mut();
        a.length = length;
        a.elements = elements;
        a.properties = properties;
        drop(a);
        Ok(value)
    }

    fn read_sparse_array(&mut self) -> DecodeResult<Value> {
        let arr = new_ref(SparseArray::default());
        let value = Value::SparseArray(arr.clone());
        self.ids.register(value.clone());
        trace!(tag = "sparse_array", "composite begin");

        let length = self.read_varint()? as u32;
        let mut properties = Vec::new();
        while self.peek_significant_tag()? != tag::SPARSE_ARRAY_END {
            let key = self.read_value()?;
            let val = self.read_value()?;
            properties.push((key, val));
        }
        self.read_u8()?;
        let declared_properties = self.read_varint()? as usize;
        let declared_length = self.read_varint()? as u32;
        if declared_properties != properties.len() || declared_length != length {
            return self.malformed();
        }
        let mut a = arr.borrow_mut();
        a.length = length;
        a.properties = properties;
        drop(a);
        Ok(value)
    }

    fn read_map(&mut self) -> DecodeResult<Value> {
        let m = new_ref(MapValue::default());
        let value = Value::Map(m.clone());
        self.ids.register(value.clone());
        trace!(tag = "map", "composite begin");
        while self.peek_significant_tag()? != tag::MAP_END {
            let key = self.read_value()?;
            let val = self.read_value()?;
            m.borrow_mut().entries.push((key, val));
        }
        self.read_u8()?;
        let declared = self.read_varint()? as usize;
        if declared != m.borrow().entries.len() {
            return self.malformed();
        }
        Ok(value)
    }

    fn read_set(&mut self) -> DecodeResult<Value> {
        let s = new_ref(SetValue::default());
        let value = Value::Set(s.clone());
        self.ids.register(value.clone());
        trace!(tag = "set", "composite begin");
        while self.peek_significant_tag()? != tag::SET_END {
            let v = self.read_value()?;
            s.borrow_mut().values.push(v);
        }
        self.read_u8()?;
        let declared = self.read_varint()? as usize;
        if declared != s.borrow().values.len() {
            return self.malformed();
        }
        Ok(value)
    }

    fn read_date(&mut self) -> DecodeResult<Value> {
        let d = new_ref(0.0);
        let value = Value::Date(d.clone());
        self.ids.register(value.clone());
        *d.borrow_mut() = self.read_double()?;
        Ok(value)
    }

    fn read_boolean_object(&mut self, flag: bool) -> DecodeResult<Value> {
        let value = Value::BooleanObject(new_ref(flag));
        self.ids.register(value.clone());
        Ok(value)
    }

    fn read_number_object(&mut self) -> DecodeResult<Value> {
        let n = new_ref(0.0);
        let value = Value::NumberObject(n.clone());
        self.ids.register(value.clone());
        *n.borrow_mut() = self.read_double()?;
        Ok(value)
    }

    fn read_string_object(&mut self) -> DecodeResult<Value> {
        let s = new_ref(String::new());
        let value = Value::StringObject(s.clone());
        self.ids.register(value.clone());
        *s.borrow_mut() = self.read_nested_string()?;
        Ok(value)
    }

    fn read_regexp(&mut self) -> DecodeResult<Value> {
        let re = new_ref(RegExp {
            pattern: String::new(),
            flags: RegExpFlags::default(),
        });
        let value = Value::RegExp(re.clone());
        self.ids.register(value.clone());
        let pattern = self.read_nested_string()?;
        let flags = RegExpFlags::from_bits(self.read_varint()? as u32);
        let mut r = re.borrow_mut();
        r.pattern = pattern;
        r.flags = flags;
        Ok(value)
    }

    fn read_byte_buffer_alloc(&mut self) -> DecodeResult<Ref<Vec<u8>>> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_raw_bytes(len)?;
        let handle = new_ref(bytes);
        self.ids.register(Value::ByteBuffer(handle.clone()));
        Ok(handle)
    }

    fn read_byte_buffer_transfer(&mut self, tag_pos: usize) -> DecodeResult<Ref<Vec<u8>>> {
        let id = self.read_varint()? as u32;
        let handle = self
            .transfers
            .resolve(id)
            .context(MissingTransferSnafu { id })
            .map_err(|e| {
                let _ = tag_pos;
                e
            })?;
        self.ids.register(Value::ByteBuffer(handle.clone()));
        Ok(handle)
    }

    /// §4.2 "Typed view interleaving": a byte buffer just produced may be
    /// immediately followed by a `TypedView` tag, in which case the view —
    /// not the buffer — is the value `read_value` actually returns.
    fn resolve_typed_view_or_buffer(&mut self, buffer: Ref<Vec<u8>>) -> DecodeResult<Value> {
        if self.peek_significant_tag_opt()? != Some(tag::TYPED_VIEW) {
            return Ok(Value::ByteBuffer(buffer));
        }
        self.read_u8()?;
        let subtag = self.read_u8()?;
        let kind = ViewKind::from_subtag(subtag).ok_or(()).or_else(|_| self.malformed())?;
        let byte_offset = self.read_varint()? as u32;
        let byte_length = self.read_varint()? as u32;
        let view = new_ref(TypedView {
            buffer,
            kind,
            byte_offset,
            byte_length,
        });
        let value = Value::TypedView(view);
        self.ids.register(value.clone());
        Ok(value)
    }

    /// §4.2 legacy tolerance: below wire-format version 12, a nested string
    /// (inside `RegExp`/`StringObject`) is a raw `Utf8String` payload
    /// rather than a full value dispatch.
    fn read_nested_string(&mut self) -> DecodeResult<String> {
        if self.version < 12 {
            warn!("legacy nested string: reading raw Utf8String payload");
            let tag_byte = self.read_u8()?;
            if tag_byte != tag::UTF8_STRING {
                return self.malformed();
            }
            return self.read_utf8_string_payload();
        }
        match self.read_value()? {
            Value::Str(s) => Ok(s),
            _ => self.malformed(),
        }
    }

    fn read_utf8_string_payload(&mut self) -> DecodeResult<String> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_raw_bytes(len)?;
        String::from_utf8(bytes).or_else(|_| self.malformed())
    }

    fn read_one_byte_string_payload(&mut self) -> DecodeResult<String> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_raw_bytes(len)?;
        Ok(bytes.into_iter().map(|b| b as char).collect())
    }

    fn read_two_byte_string_payload(&mut self) -> DecodeResult<String> {
        let byte_len = self.read_varint()? as usize;
        let bytes = self.read_raw_bytes(byte_len)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).or_else(|_| self.malformed())
    }

    /// Skips (consuming) any run of `Padding`/`VerifyObjectCount` tags and
    /// returns the next real tag byte without consuming it, or an error if
    /// the input ends first.
    fn peek_significant_tag(&mut self) -> DecodeResult<u8> {
        self.peek_significant_tag_opt()?.ok_or(()).or_else(|_| self.malformed())
    }

    /// As [`Decoder::peek_significant_tag`], but returns `Ok(None)` instead
    /// of erroring at end of input — used by the typed-view interleave
    /// check, where "nothing follows" is a normal outcome, not truncation.
    fn peek_significant_tag_opt(&mut self) -> DecodeResult<Option<u8>> {
        loop {
            match self.input.get(self.pos).copied() {
                None => return Ok(None),
                Some(tag::PADDING) => self.pos += 1,
                Some(tag::VERIFY_OBJECT_COUNT) => {
                    self.pos += 1;
                    self.read_varint()?;
                }
                Some(t) => return Ok(Some(t)),
            }
        }
    }

    fn read_u8(&mut self) -> DecodeResult<u8> {
        match self.input.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => self.malformed(),
        }
    }

    fn read_raw_bytes(&mut self, len: usize) -> DecodeResult<Vec<u8>> {
        let end = self.pos.checked_add(len).filter(|&e| e <= self.input.len());
        match end {
            Some(end) => {
                let bytes = self.input[self.pos..end].to_vec();
                self.pos = end;
                Ok(bytes)
            }
            None => self.malformed(),
        }
    }

    fn read_u32(&mut self) -> DecodeResult<u32> {
        let bytes = self.read_raw_bytes(4)?;
        sclone_encoding::decode::basic::read_u32(&bytes[..]).or_else(|_| self.malformed())
    }

    fn read_double(&mut self) -> DecodeResult<f64> {
        let bytes = self.read_raw_bytes(8)?;
        sclone_encoding::decode::basic::read_f64(&bytes[..]).or_else(|_| self.malformed())
    }

    fn read_varint(&mut self) -> DecodeResult<u64> {
        let position = self.pos as u64;
        let (value, consumed) =
            decode_varint(&self.input[self.pos..]).context(VarintSnafu { position })?;
        self.pos += consumed;
        Ok(value)
    }

    fn malformed<T>(&self) -> DecodeResult<T> {
        MalformedSnafu {
            position: self.pos as u64,
        }
        .fail()
    }
}
