#![allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

use graft_clone::clone_value;
use graft_value::{FieldDef, Heap, StructLayout, StructValue, Value};
use pretty_assertions::assert_eq;

use crate::{
    decode_binary, decode_json, encode_binary, encode_json, from_binary_slice, from_json_slice,
    to_binary_vec, to_json_string, to_json_vec,
};

fn fixture() -> Value {
    let layout = Heap::new(StructLayout::new(
        "codec.tests.profile",
        vec![
            FieldDef::exported("name", Value::str("")),
            FieldDef::exported("age", Value::Int(0)),
            FieldDef::exported("tags", Value::Null),
            FieldDef::exported("attrs", Value::Null),
            FieldDef::exported("score", Value::Null),
            FieldDef::private("session", Value::str("")),
        ],
    ));
    Value::Struct(StructValue::new(
        layout,
        vec![
            Value::str("ada"),
            Value::int(36),
            Value::list(vec![Value::str("a"), Value::str("b")]),
            Value::map([
                (Value::str("z"), Value::list(vec![Value::int(1), Value::int(2)])),
                (Value::str("y"), Value::float(2.5)),
            ]),
            Value::ptr(Value::int(42)),
            Value::str("s3cret"),
        ],
    ))
}

#[test]
fn json_renders_exported_fields_in_layout_order() {
    let s = to_json_string(&fixture()).unwrap();
    assert_eq!(
        s,
        r#"{"name":"ada","age":36,"tags":["a","b"],"attrs":{"z":[1,2],"y":2.5},"score":42}"#
    );
}

#[test]
fn json_decode_is_loose() {
    let v = from_json_slice(br#"{"a": 1, "b": [true, null]}"#).unwrap();
    let m = v.as_map().unwrap();
    assert_eq!(m.get(&Value::str("a")), Some(&Value::int(1)));
    assert_eq!(
        m.get(&Value::str("b")),
        Some(&Value::list(vec![Value::Bool(true), Value::Null]))
    );
}

#[test]
fn clone_encodes_byte_identically_under_json() {
    let src = fixture();
    let dup = clone_value(&src, true);
    assert_eq!(to_json_vec(&src).unwrap(), to_json_vec(&dup).unwrap());
}

#[test]
fn clone_encodes_byte_identically_under_binary() {
    let src = fixture();
    let dup = clone_value(&src, true);
    assert_eq!(to_binary_vec(&src).unwrap(), to_binary_vec(&dup).unwrap());
}

#[test]
fn binary_round_trip_preserves_structs_and_scalars() {
    let layout = Heap::new(StructLayout::new(
        "codec.tests.point",
        vec![
            FieldDef::exported("x", Value::Int(0)),
            FieldDef::exported("u", Value::Uint(0)),
            FieldDef::exported("c", Value::complex(0.0, 0.0)),
            FieldDef::exported("raw", Value::Null),
        ],
    ));
    let src = Value::Struct(StructValue::new(
        layout,
        vec![
            Value::int(-7),
            Value::uint(7),
            Value::complex(1.5, -2.5),
            Value::bytes(vec![0, 1, 255]),
        ],
    ));
    let out = from_binary_slice(&to_binary_vec(&src).unwrap()).unwrap();
    assert_eq!(out, src);
    // Scalar width survives the wire: no Uint/Int collapse.
    let sv = out.as_struct().unwrap();
    assert_eq!(sv.field("u"), Some(&Value::uint(7)));
}

#[test]
fn binary_wire_form_drops_private_fields() {
    let out = from_binary_slice(&to_binary_vec(&fixture()).unwrap()).unwrap();
    let sv = out.as_struct().unwrap();
    assert_eq!(sv.field("name"), Some(&Value::str("ada")));
    assert_eq!(sv.field("session"), None);
}

#[test]
fn binary_preserves_map_entry_order() {
    let src = Value::map([
        (Value::str("b"), Value::int(2)),
        (Value::str("a"), Value::int(1)),
    ]);
    let out = from_binary_slice(&to_binary_vec(&src).unwrap()).unwrap();
    let keys: Vec<_> = out.as_map().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec![Value::str("b"), Value::str("a")]);
}

#[test]
fn writer_and_reader_paths_agree_with_the_buffer_paths() {
    let src = fixture();

    let mut json = Vec::new();
    encode_json(&mut json, &src).unwrap();
    assert_eq!(json, to_json_vec(&src).unwrap());
    assert_eq!(decode_json(json.as_slice()).unwrap(), from_json_slice(&json).unwrap());

    let mut bin = Vec::new();
    encode_binary(&mut bin, &src).unwrap();
    assert_eq!(bin, to_binary_vec(&src).unwrap());
    let a = decode_binary(bin.as_slice()).unwrap();
    let b = from_binary_slice(&bin).unwrap();
    assert_eq!(a, b);
}

#[test]
fn nested_pointers_flatten_through_json() {
    let v = Value::ptr(Value::ptr(Value::str("deep")));
    assert_eq!(to_json_string(&v).unwrap(), r#""deep""#);
}
