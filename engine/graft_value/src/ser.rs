//! Untagged serde serialization of values.
//!
//! This is the field-name-tagged representation the codecs build on:
//! structs emit their exported fields only, in layout order; `Ref` and
//! `Boxed` nodes serialize transparently as their contents; `Null`
//! serializes as the format's null. Because a clone preserves layout
//! order and map insertion order, a value and its clone always encode
//! to identical bytes.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, SerializeTuple, Serializer};

use crate::value::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Uint(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Complex(c) => {
                let mut tup = serializer.serialize_tuple(2)?;
                tup.serialize_element(&c.re)?;
                tup.serialize_element(&c.im)?;
                tup.end()
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Array(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            Value::List(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs.iter() {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Struct(sv) => {
                let defs = sv.layout().fields();
                let exported = defs.iter().filter(|d| d.exported).count();
                let mut map = serializer.serialize_map(Some(exported))?;
                for (def, field) in defs.iter().zip(sv.fields()) {
                    if def.exported {
                        map.serialize_entry(def.name.as_str(), field)?;
                    }
                }
                map.end()
            }
            Value::Ref(p) | Value::Boxed(p) => (**p).serialize(serializer),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::composite::{FieldDef, StructLayout, StructValue};
    use crate::heap::Heap;
    use crate::value::Value;

    fn json(v: &Value) -> String {
        serde_json::to_string(v).unwrap()
    }

    #[test]
    fn scalars_and_null() {
        assert_eq!(json(&Value::Null), "null");
        assert_eq!(json(&Value::int(-3)), "-3");
        assert_eq!(json(&Value::uint(7)), "7");
        assert_eq!(json(&Value::str("hi")), "\"hi\"");
        assert_eq!(json(&Value::complex(1.0, 2.0)), "[1.0,2.0]");
    }

    #[test]
    fn structs_emit_exported_fields_in_layout_order() {
        let layout = Heap::new(StructLayout::new(
            "ser.tests.user",
            vec![
                FieldDef::exported("name", Value::str("")),
                FieldDef::private("secret", Value::str("")),
                FieldDef::exported("age", Value::Int(0)),
            ],
        ));
        let sv = StructValue::new(
            layout,
            vec![Value::str("ada"), Value::str("hidden"), Value::int(36)],
        );
        assert_eq!(json(&Value::Struct(sv)), r#"{"name":"ada","age":36}"#);
    }

    #[test]
    fn refs_and_boxes_serialize_transparently() {
        assert_eq!(json(&Value::ptr(Value::int(42))), "42");
        assert_eq!(json(&Value::boxed(Value::list(vec![Value::int(1)]))), "[1]");
    }

    #[test]
    fn maps_keep_insertion_order() {
        let m = Value::map([
            (Value::str("z"), Value::int(1)),
            (Value::str("a"), Value::int(2)),
        ]);
        assert_eq!(json(&m), r#"{"z":1,"a":2}"#);
    }
}
