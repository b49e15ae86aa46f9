//! The runtime value enum and its structural operations.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::composite::StructValue;
use crate::heap::Heap;

/// Insertion-ordered map used by [`Value::Map`].
///
/// Insertion order is preserved so a duplicate that re-inserts entries
/// in iteration order serializes byte-identically to its source.
pub type ValueMap = IndexMap<Value, Value>;

/// Complex number scalar.
#[derive(Copy, Clone, Debug)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }
}

/// A node in the runtime value graph.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absent reference, list, map, or boxed value.
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(Complex),
    /// Immutable text; shared by value copies like any scalar.
    Str(Heap<String>),
    /// Byte buffer; duplicated as a single raw range by the cloner.
    Bytes(Heap<Vec<u8>>),
    /// Fixed-length sequence with value semantics: assignment copies
    /// the elements themselves (their heap children stay shared).
    Array(Vec<Value>),
    /// Growable sequence with reference semantics.
    List(Heap<Vec<Value>>),
    /// Insertion-ordered map with reference semantics.
    Map(Heap<ValueMap>),
    /// Named struct with per-field visibility.
    Struct(StructValue),
    /// Non-null pointer.
    Ref(Heap<Value>),
    /// Type-erased cell around a concrete value.
    Boxed(Heap<Value>),
}

impl Value {
    // Factory methods

    pub fn int(v: i64) -> Value {
        Value::Int(v)
    }

    pub fn uint(v: u64) -> Value {
        Value::Uint(v)
    }

    pub fn float(v: f64) -> Value {
        Value::Float(v)
    }

    pub fn complex(re: f64, im: f64) -> Value {
        Value::Complex(Complex::new(re, im))
    }

    pub fn str(v: impl Into<String>) -> Value {
        Value::Str(Heap::new(v.into()))
    }

    pub fn bytes(v: Vec<u8>) -> Value {
        Value::Bytes(Heap::new(v))
    }

    pub fn array(v: Vec<Value>) -> Value {
        Value::Array(v)
    }

    pub fn list(v: Vec<Value>) -> Value {
        Value::List(Heap::new(v))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(Heap::new(entries.into_iter().collect()))
    }

    /// Allocate a pointer to `v`.
    pub fn ptr(v: Value) -> Value {
        Value::Ref(Heap::new(v))
    }

    /// Box `v` in a type-erased cell.
    pub fn boxed(v: Value) -> Value {
        Value::Boxed(Heap::new(v))
    }

    // Accessors

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(sv) => Some(sv),
            _ => None,
        }
    }

    /// The value behind a `Ref` or `Boxed` node.
    pub fn pointee(&self) -> Option<&Value> {
        match self {
            Value::Ref(p) | Value::Boxed(p) => Some(p),
            _ => None,
        }
    }

    /// True iff this is the zero value for its runtime type.
    ///
    /// Reference kinds are zero only when absent (`Null`): a non-null
    /// empty list or map is not zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(v) => *v == 0,
            Value::Uint(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Complex(c) => c.re == 0.0 && c.im == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Array(xs) => xs.iter().all(Value::is_zero),
            Value::Struct(sv) => sv.fields().iter().all(Value::is_zero),
            Value::Bytes(_)
            | Value::List(_)
            | Value::Map(_)
            | Value::Ref(_)
            | Value::Boxed(_) => false,
        }
    }

    /// The typed zero for this value's runtime type.
    pub fn zero_like(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Bool(_) => Value::Bool(false),
            Value::Int(_) => Value::Int(0),
            Value::Uint(_) => Value::Uint(0),
            Value::Float(_) => Value::Float(0.0),
            Value::Complex(_) => Value::complex(0.0, 0.0),
            Value::Str(_) => Value::str(""),
            Value::Array(xs) => Value::Array(xs.iter().map(Value::zero_like).collect()),
            Value::Struct(sv) => Value::Struct(StructValue::zeroed(sv.layout().clone())),
            Value::Bytes(_)
            | Value::List(_)
            | Value::Map(_)
            | Value::Ref(_)
            | Value::Boxed(_) => Value::Null,
        }
    }
}

// Structural equality. Floats compare by bit pattern so `Value` can
// lawfully implement `Eq + Hash` and key maps; note that under this
// rule `0.0 != -0.0` and `NaN == NaN` for identical bit patterns.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Complex(a), Value::Complex(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            (Value::Boxed(a), Value::Boxed(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Uint(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Complex(c) => {
                c.re.to_bits().hash(state);
                c.im.to_bits().hash(state);
            }
            Value::Str(s) => s.as_str().hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Array(xs) => xs.hash(state),
            Value::List(xs) => (**xs).hash(state),
            // Maps hash by length only: entry order may differ between
            // maps that compare equal.
            Value::Map(m) => m.len().hash(state),
            Value::Struct(sv) => {
                sv.type_name().hash(state);
                sv.fields().hash(state);
            }
            Value::Ref(p) | Value::Boxed(p) => (**p).hash(state),
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

    use super::*;
    use crate::composite::{FieldDef, StructLayout};

    #[test]
    fn zero_detection() {
        assert!(Value::Null.is_zero());
        assert!(Value::int(0).is_zero());
        assert!(Value::str("").is_zero());
        assert!(Value::array(vec![Value::int(0), Value::Bool(false)]).is_zero());

        assert!(!Value::int(7).is_zero());
        // Absence, not emptiness, is the zero state of reference kinds.
        assert!(!Value::list(vec![]).is_zero());
        assert!(!Value::map([]).is_zero());
        assert!(!Value::bytes(vec![]).is_zero());
        assert!(!Value::ptr(Value::int(0)).is_zero());
    }

    #[test]
    fn zero_like_maps_reference_kinds_to_null() {
        assert_eq!(Value::list(vec![Value::int(1)]).zero_like(), Value::Null);
        assert_eq!(Value::map([]).zero_like(), Value::Null);
        assert_eq!(Value::ptr(Value::int(1)).zero_like(), Value::Null);
        assert_eq!(Value::str("x").zero_like(), Value::str(""));
        assert_eq!(Value::int(9).zero_like(), Value::int(0));
    }

    #[test]
    fn zero_like_zeroes_struct_fields() {
        let layout = Heap::new(StructLayout::new(
            "value.tests.pair",
            vec![
                FieldDef::exported("a", Value::Int(0)),
                FieldDef::exported("b", Value::Null),
            ],
        ));
        let sv = StructValue::new(layout, vec![Value::int(3), Value::list(vec![])]);
        let zero = Value::Struct(sv).zero_like();
        let zeroed = zero.as_struct().unwrap();
        assert_eq!(zeroed.fields(), &[Value::int(0), Value::Null]);
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::float(2.2), Value::float(2.2));
        assert_ne!(Value::float(0.0), Value::float(-0.0));
    }

    #[test]
    fn values_key_maps() {
        let m = Value::map([
            (Value::str("x"), Value::int(1)),
            (Value::int(2), Value::str("two")),
        ]);
        let m = m.as_map().unwrap();
        assert_eq!(m.get(&Value::str("x")), Some(&Value::int(1)));
        assert_eq!(m.get(&Value::int(2)), Some(&Value::str("two")));
    }

    #[test]
    fn map_preserves_insertion_order() {
        let m = Value::map([
            (Value::str("b"), Value::int(2)),
            (Value::str("a"), Value::int(1)),
        ]);
        let keys: Vec<_> = m.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Value::str("b"), Value::str("a")]);
    }
}
