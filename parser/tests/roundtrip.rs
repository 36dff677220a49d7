//! Integration-style round-trip tests exercising the scenarios of the
//! wire-format specification (§8), including its six concrete hex
//! scenarios.

use sclone_core::value::{new_ref, DenseArray, MapValue, RegExp, Record, SetValue, SparseArray};
use sclone_core::{RegExpFlags, Value};
use sclone_parser::{Decoder, EncodeError, Encoder};

fn encode(value: &Value) -> Vec<u8> {
    let mut enc = Encoder::default();
    enc.write_header();
    enc.write_value(value).unwrap();
    enc.release()
}

fn decode(bytes: &[u8]) -> Value {
    let mut dec = Decoder::new(bytes, None);
    dec.read_header().unwrap();
    dec.read_value().unwrap()
}

#[test]
fn scenario_1_record_hex_matches() {
    let rec = new_ref(Record::default());
    rec.borrow_mut().entries.push((
        Value::Str("foo".to_string()),
        Value::Str("bar".to_string()),
    ));
    let bytes = encode(&Value::Record(rec));
    let expected: &[u8] = &[
        0xff, 0x0d, b'o', b'"', 0x03, b'f', b'o', b'o', b'"', 0x03, b'b', b'a', b'r', b'{', 0x01,
    ];
    assert_eq!(bytes, expected);

    let mut dec = Decoder::new(&bytes, None);
    dec.read_header().unwrap();
    assert_eq!(dec.get_wire_format_version(), 13);
    match dec.read_value().unwrap() {
        Value::Record(r) => {
            let r = r.borrow();
            assert_eq!(r.entries, vec![(Value::Str("foo".into()), Value::Str("bar".into()))]);
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn scenario_3_int32_round_trips() {
    let bytes = encode(&Value::Number(42.0));
    assert_eq!(decode(&bytes), Value::Number(42.0));
}

#[test]
fn scenario_4_double_round_trips() {
    let bytes = encode(&Value::Number(-0.25));
    assert_eq!(decode(&bytes), Value::Number(-0.25));
}

#[test]
fn scenario_6_opaque_callable_is_a_clone_error() {
    #[derive(Debug)]
    struct Callable;
    impl sclone_core::HostObject for Callable {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }
    use std::rc::Rc;

    let mut enc = Encoder::default();
    let err = enc
        .write_value(&Value::HostObject(Rc::new(Callable) as Rc<dyn sclone_core::HostObject>))
        .unwrap_err();
    assert!(matches!(err, EncodeError::UnknownHostObjectType { .. }));
}

#[test]
fn boundary_integers_cross_the_zigzag_double_threshold() {
    for magnitude in [1i64 << 29, 1 << 30, 1 << 31] {
        for n in [magnitude, -magnitude] {
            let bytes = encode(&Value::Number(n as f64));
            assert_eq!(decode(&bytes), Value::Number(n as f64), "n = {n}");
        }
    }
}

#[test]
fn cyclic_record_round_trips_with_reflexive_identity() {
    let r = new_ref(Record::default());
    r.borrow_mut()
        .entries
        .push((Value::Str("self".to_string()), Value::Record(r.clone())));
    let bytes = encode(&Value::Record(r));

    let mut dec = Decoder::new(&bytes, None);
    dec.read_header().unwrap();
    match dec.read_value().unwrap() {
        Value::Record(decoded) => {
            let entries = &decoded.borrow().entries;
            assert_eq!(entries.len(), 1);
            match &entries[0].1 {
                Value::Record(inner) => assert!(std::rc::Rc::ptr_eq(inner, &decoded)),
                other => panic!("expected the cycle back, got {other:?}"),
            }
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn shared_subtree_decodes_with_the_same_identity_topology() {
    let shared = new_ref(Record::default());
    shared
        .borrow_mut()
        .entries
        .push((Value::Str("v".to_string()), Value::Number(1.0)));
    let outer = new_ref(Record::default());
    outer
        .borrow_mut()
        .entries
        .push((Value::Str("a".to_string()), Value::Record(shared.clone())));
    outer
        .borrow_mut()
        .entries
        .push((Value::Str("b".to_string()), Value::Record(shared)));

    let bytes = encode(&Value::Record(outer));
    match decode(&bytes) {
        Value::Record(decoded) => {
            let entries = &decoded.borrow().entries;
            let (Value::Record(a), Value::Record(b)) = (&entries[0].1, &entries[1].1) else {
                panic!("expected two nested records");
            };
            assert!(std::rc::Rc::ptr_eq(a, b));
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn sparse_array_with_no_properties_has_declared_length_and_no_indices() {
    let arr = new_ref(SparseArray {
        length: 4,
        properties: Vec::new(),
    });
    let bytes = encode(&Value::SparseArray(arr));
    match decode(&bytes) {
        Value::SparseArray(a) => {
            let a = a.borrow();
            assert_eq!(a.length, 4);
            assert!(a.properties.is_empty());
        }
        other => panic!("expected a sparse array, got {other:?}"),
    }
}

#[test]
fn dense_array_round_trips_holes_and_trailing_properties() {
    let arr = new_ref(DenseArray {
        length: 3,
        elements: vec![Some(Value::Number(1.0)), None, Some(Value::Number(3.0))],
        properties: vec![(Value::Str("extra".to_string()), Value::Bool(true))],
    });
    let bytes = encode(&Value::DenseArray(arr));
    match decode(&bytes) {
        Value::DenseArray(a) => {
            let a = a.borrow();
            assert_eq!(a.length, 3);
            assert_eq!(
                a.elements,
                vec![Some(Value::Number(1.0)), None, Some(Value::Number(3.0))]
            );
            assert_eq!(
                a.properties,
                vec![(Value::Str("extra".to_string()), Value::Bool(true))]
            );
        }
        other => panic!("expected a dense array, got {other:?}"),
    }
}

#[test]
fn map_and_set_round_trip_insertion_order() {
    let map = new_ref(MapValue {
        entries: vec![
            (Value::Str("a".to_string()), Value::Number(1.0)),
            (Value::Str("b".to_string()), Value::Number(2.0)),
        ],
    });
    let bytes = encode(&Value::Map(map));
    match decode(&bytes) {
        Value::Map(m) => assert_eq!(
            m.borrow().entries,
            vec![
                (Value::Str("a".to_string()), Value::Number(1.0)),
                (Value::Str("b".to_string()), Value::Number(2.0)),
            ]
        ),
        other => panic!("expected a map, got {other:?}"),
    }

    let set = new_ref(SetValue {
        values: vec![Value::Number(1.0), Value::Number(2.0), Value::Number(2.0)],
    });
    let bytes = encode(&Value::Set(set));
    match decode(&bytes) {
        Value::Set(s) => assert_eq!(
            s.borrow().values,
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(2.0)]
        ),
        other => panic!("expected a set, got {other:?}"),
    }
}

#[test]
fn regexp_round_trips_pattern_and_flags() {
    let re = new_ref(RegExp {
        pattern: "a+b*".to_string(),
        flags: RegExpFlags {
            global: true,
            ignore_case: false,
            multiline: true,
            sticky: false,
            unicode: true,
        },
    });
    let bytes = encode(&Value::RegExp(re));
    match decode(&bytes) {
        Value::RegExp(r) => {
            let r = r.borrow();
            assert_eq!(r.pattern, "a+b*");
            assert!(r.flags.global && r.flags.multiline && r.flags.unicode);
            assert!(!r.flags.ignore_case && !r.flags.sticky);
        }
        other => panic!("expected a regexp, got {other:?}"),
    }
}

#[test]
fn date_boxed_primitives_and_string_object_round_trip() {
    let date = new_ref(1_700_000_000_000.0);
    assert_eq!(decode(&encode(&Value::Date(date))), {
        let d = new_ref(1_700_000_000_000.0);
        Value::Date(d)
    });

    let b = new_ref(true);
    assert_eq!(decode(&encode(&Value::BooleanObject(b))), Value::BooleanObject(new_ref(true)));

    let n = new_ref(3.5);
    assert_eq!(decode(&encode(&Value::NumberObject(n))), Value::NumberObject(new_ref(3.5)));

    let s = new_ref("hi".to_string());
    assert_eq!(
        decode(&encode(&Value::StringObject(s))),
        Value::StringObject(new_ref("hi".to_string()))
    );
}

#[test]
fn byte_buffer_registered_for_transfer_resolves_to_the_same_handle() {
    let handle = new_ref(vec![1u8, 2, 3, 4]);

    let mut enc = Encoder::default();
    enc.transfer_byte_buffer(7, handle.clone()).unwrap();
    enc.write_value(&Value::ByteBuffer(handle.clone())).unwrap();
    let bytes = enc.release();

    let decoder_handle = new_ref(vec![1u8, 2, 3, 4]);
    let mut dec = Decoder::new(&bytes, None);
    dec.transfer_byte_buffer(7, decoder_handle.clone());
    match dec.read_value().unwrap() {
        Value::ByteBuffer(resolved) => assert!(std::rc::Rc::ptr_eq(&resolved, &decoder_handle)),
        other => panic!("expected a byte buffer, got {other:?}"),
    }
}

#[test]
fn typed_view_native_path_pairs_with_its_buffer() {
    use sclone_core::{value::TypedView, ViewKind};

    let buffer = new_ref(vec![0xAD, 0xDE, 0xEF, 0xBE]);
    let view = new_ref(TypedView {
        buffer,
        kind: ViewKind::Uint16,
        byte_offset: 0,
        byte_length: 4,
    });
    let bytes = encode(&Value::TypedView(view));
    match decode(&bytes) {
        Value::TypedView(v) => {
            let v = v.borrow();
            assert_eq!(v.kind, ViewKind::Uint16);
            assert_eq!(*v.buffer.borrow(), vec![0xAD, 0xDE, 0xEF, 0xBE]);
        }
        other => panic!("expected a typed view, got {other:?}"),
    }
}

#[test]
fn two_byte_string_tags_only_occur_at_even_offsets() {
    let mut enc = Encoder::default();
    // An odd number of one-byte strings first, to probe alignment at
    // several different starting offsets.
    for s in ["a", "bb", "ccc", "中文测试", "e"] {
        enc.write_value(&Value::Str(s.to_string())).unwrap();
    }
    let bytes = enc.release();
    for (i, &b) in bytes.iter().enumerate() {
        if b == sclone_core::tag::TWO_BYTE_STRING {
            assert_eq!(i % 2, 0, "TwoByteString tag at odd offset {i}");
        }
    }
}

#[test]
fn host_object_delegate_round_trips_scenario_5_payload() {
    use sclone_parser::{HostObjectDecode, HostObjectEncode, PrimitiveReader, PrimitiveWriter};

    #[derive(Debug, Clone, PartialEq)]
    struct Payload {
        pairs: Vec<(u32, u32)>,
        value: f64,
    }
    impl sclone_core::HostObject for Payload {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct Delegate(Payload);
    impl HostObjectEncode for Delegate {
        fn write_host_object(
            &mut self,
            writer: &mut PrimitiveWriter<'_>,
            _value: &Value,
        ) -> Result<(), String> {
            writer.write_raw_bytes(b"stdin");
            for &(hi, lo) in &self.0.pairs {
                writer.write_uint64(hi, lo);
            }
            writer.write_double(self.0.value);
            Ok(())
        }
    }
    struct ReadDelegate;
    impl HostObjectDecode for ReadDelegate {
        fn read_host_object(&mut self, reader: &mut PrimitiveReader<'_>) -> Result<Value, String> {
            let tag = reader.read_raw_bytes(5).ok_or("truncated")?;
            assert_eq!(tag, b"stdin");
            let mut pairs = Vec::new();
            for _ in 0..5 {
                pairs.push(reader.read_uint64().ok_or("truncated")?);
            }
            let value = reader.read_double().ok_or("truncated")?;
            Ok(Value::HostObject(std::rc::Rc::new(Payload { pairs, value })))
        }
    }

    let payload = Payload {
        pairs: vec![
            (1, 2),
            (1, 0),
            (0, 0),
            (0x102, 0x304),
            (0x8000_0000, 0x7000_0000),
        ],
        value: -0.25,
    };
    let mut enc = Encoder::new(Some(Box::new(Delegate(payload.clone()))));
    enc.write_value(&Value::HostObject(std::rc::Rc::new(payload.clone())))
        .unwrap();
    let bytes = enc.release();

    let mut dec = Decoder::new(&bytes, Some(Box::new(ReadDelegate)));
    match dec.read_value().unwrap() {
        Value::HostObject(h) => {
            let got = h.as_any().downcast_ref::<Payload>().unwrap();
            assert_eq!(*got, payload);
        }
        other => panic!("expected a host object, got {other:?}"),
    }
}

#[test]
fn truncated_stream_is_malformed_not_a_panic() {
    let mut dec = Decoder::new(&[b'o'], None);
    let err = dec.read_value().unwrap_err();
    assert!(matches!(err, sclone_parser::DecodeError::Malformed { .. }));
}
