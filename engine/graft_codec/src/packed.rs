//! Tagged wire form for the binary codec.
//!
//! The binary format is not self-describing, so values travel as a
//! mirror enum whose serde derive carries the variant tags. Struct
//! entries carry their field names; only exported fields are packed,
//! matching the textual codec.

use graft_value::{FieldDef, Heap, StructLayout, StructValue, Value};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub(crate) enum Packed {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Packed>),
    List(Vec<Packed>),
    Map(Vec<(Packed, Packed)>),
    Struct {
        type_name: String,
        fields: Vec<(String, Packed)>,
    },
    Ref(Box<Packed>),
    Boxed(Box<Packed>),
}

impl Packed {
    pub(crate) fn pack(v: &Value) -> Packed {
        match v {
            Value::Null => Packed::Null,
            Value::Bool(b) => Packed::Bool(*b),
            Value::Int(n) => Packed::Int(*n),
            Value::Uint(n) => Packed::Uint(*n),
            Value::Float(f) => Packed::Float(*f),
            Value::Complex(c) => Packed::Complex(c.re, c.im),
            Value::Str(s) => Packed::Str(s.to_string()),
            Value::Bytes(b) => Packed::Bytes(b.to_vec()),
            Value::Array(xs) => Packed::Array(xs.iter().map(Packed::pack).collect()),
            Value::List(xs) => Packed::List(xs.iter().map(Packed::pack).collect()),
            // Entries pack in insertion order, so equal maps built in
            // the same order encode byte-identically.
            Value::Map(m) => Packed::Map(
                m.iter()
                    .map(|(k, v)| (Packed::pack(k), Packed::pack(v)))
                    .collect(),
            ),
            Value::Struct(sv) => Packed::Struct {
                type_name: sv.type_name().as_str().to_owned(),
                fields: sv
                    .layout()
                    .fields()
                    .iter()
                    .zip(sv.fields())
                    .filter(|(def, _)| def.exported)
                    .map(|(def, val)| (def.name.as_str().to_owned(), Packed::pack(val)))
                    .collect(),
            },
            Value::Ref(p) => Packed::Ref(Box::new(Packed::pack(p))),
            Value::Boxed(p) => Packed::Boxed(Box::new(Packed::pack(p))),
        }
    }

    /// Rebuild a value from the wire form.
    ///
    /// Decoding is loose: struct layouts are reconstructed from the
    /// packed field names, all exported, with zeros derived from the
    /// decoded values.
    pub(crate) fn unpack(self) -> Value {
        match self {
            Packed::Null => Value::Null,
            Packed::Bool(b) => Value::Bool(b),
            Packed::Int(n) => Value::Int(n),
            Packed::Uint(n) => Value::Uint(n),
            Packed::Float(f) => Value::Float(f),
            Packed::Complex(re, im) => Value::complex(re, im),
            Packed::Str(s) => Value::str(s),
            Packed::Bytes(b) => Value::bytes(b),
            Packed::Array(xs) => Value::Array(xs.into_iter().map(Packed::unpack).collect()),
            Packed::List(xs) => Value::list(xs.into_iter().map(Packed::unpack).collect()),
            Packed::Map(entries) => Value::map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.unpack(), v.unpack())),
            ),
            Packed::Struct { type_name, fields } => {
                let mut defs = Vec::with_capacity(fields.len());
                let mut values = Vec::with_capacity(fields.len());
                for (name, packed) in fields {
                    let value = packed.unpack();
                    defs.push(FieldDef::exported(&name, value.zero_like()));
                    values.push(value);
                }
                let layout = Heap::new(StructLayout::new(&type_name, defs));
                Value::Struct(StructValue::new(layout, values))
            }
            Packed::Ref(p) => Value::ptr(p.unpack()),
            Packed::Boxed(p) => Value::boxed(p.unpack()),
        }
    }
}
