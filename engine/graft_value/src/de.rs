//! Loose serde deserialization of values.
//!
//! Self-describing formats decode into the structural subset of the
//! model: scalars, strings, byte buffers, lists, and maps. Struct
//! identity is not reconstructed — objects decode as maps keyed by
//! strings, the way the original library's loose interface decoding
//! behaves. Integers that fit a signed word decode as `Int`.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::value::{Value, ValueMap};

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any structural value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(i64::try_from(v).map_or(Value::Uint(v), Value::Int))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::str(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::str(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::bytes(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        d.deserialize_any(ValueVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(v) = seq.next_element::<Value>()? {
            out.push(v);
        }
        Ok(Value::list(out))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut out = ValueMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<Value, Value>()? {
            out.insert(k, v);
        }
        Ok(Value::Map(crate::heap::Heap::new(out)))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::value::Value;

    #[test]
    fn decodes_scalars_and_null() {
        let v: Value = serde_json::from_str("null").unwrap();
        assert_eq!(v, Value::Null);
        let v: Value = serde_json::from_str("-5").unwrap();
        assert_eq!(v, Value::int(-5));
        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::float(2.5));
    }

    #[test]
    fn positive_integers_decode_signed_when_they_fit() {
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::int(42));
        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v, Value::uint(u64::MAX));
    }

    #[test]
    fn objects_decode_as_maps() {
        let v: Value = serde_json::from_str(r#"{"a":[1,2],"b":"s"}"#).unwrap();
        let m = v.as_map().unwrap();
        assert_eq!(
            m.get(&Value::str("a")),
            Some(&Value::list(vec![Value::int(1), Value::int(2)]))
        );
        assert_eq!(m.get(&Value::str("b")), Some(&Value::str("s")));
    }
}
