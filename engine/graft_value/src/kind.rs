//! Kind classification for copy purposes.
//!
//! [`Kind`] is the closed classification the clone engine dispatches
//! on. Simple kinds are exactly the scalars that are safe to duplicate
//! by value assignment with no nested ownership: booleans, integers,
//! floats, complex numbers, and strings (immutable text). Everything
//! else needs composite or reference treatment.

use crate::value::Value;

/// Copy classification of a runtime type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Safe to copy by plain value assignment.
    Simple,
    Struct,
    Array,
    List,
    Map,
    /// Pointer (a `Null` value classifies here: an absent reference).
    Ref,
    Boxed,
}

impl Value {
    /// Classify this value's runtime type.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_)
            | Value::Int(_)
            | Value::Uint(_)
            | Value::Float(_)
            | Value::Complex(_)
            | Value::Str(_) => Kind::Simple,
            Value::Struct(_) => Kind::Struct,
            Value::Array(_) => Kind::Array,
            // A byte buffer is a slice with a raw-copy fast path.
            Value::Bytes(_) | Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Null | Value::Ref(_) => Kind::Ref,
            Value::Boxed(_) => Kind::Boxed,
        }
    }
}
