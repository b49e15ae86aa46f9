//! The recursive copier.
//!
//! Walks a source value and a destination slot in lock-step, applying
//! the kind classification and the override resolver at each node,
//! allocating fresh backing storage for composite kinds, and writing
//! leaves directly for Simple kinds.

use graft_value::{Heap, Kind, StructValue, Value, ValueMap};

use crate::facts::{FactsCache, TypeFacts};
use crate::registry::OverrideRegistry;

/// Deep-clone a value.
///
/// The result is structurally equal to `src` with every composite node
/// independently allocated — except where a type's own clone override
/// chooses to return shared state, and except for non-exported struct
/// fields when `keep_private` is true, which are preserved verbatim
/// (heap-typed private fields stay shared with the source, by design).
/// With `keep_private` false, non-exported fields are left at their
/// declared zero instead.
///
/// Cyclic value graphs are not detected: a cycle recurses until the
/// call stack is exhausted. This is a documented limitation, not an
/// error path.
pub fn clone_value(src: &Value, keep_private: bool) -> Value {
    let mut dst = src.zero_like();
    copy_into(&mut dst, src, keep_private);
    dst
}

/// Copy `src` into the destination slot.
///
/// `dst` must denote storage of the same runtime type as `src`, or be
/// an unallocated (`Null`) slot the copier may allocate to match. A
/// struct type's own clone method is consulted first; after that, a
/// zero-valued source returns immediately, touching nothing.
///
/// # Panics
///
/// Panics on a runtime type mismatch between a non-null `dst` and
/// `src`: that is a programming error, not a recoverable condition.
pub fn copy_into(dst: &mut Value, src: &Value, keep_private: bool) {
    // The override check precedes the zero check: a type that clones
    // itself is invoked even for its zero value.
    if let Value::Struct(sv) = src {
        let facts = FactsCache::global().facts_of(sv.layout(), OverrideRegistry::global());
        if try_override(dst, sv, facts) {
            return;
        }
        if src.is_zero() {
            return;
        }
        check_assignable(dst, src);
        copy_struct(dst, sv, keep_private, facts);
        return;
    }

    if src.is_zero() {
        return;
    }
    check_assignable(dst, src);

    match src {
        // Structs branch above; a zero Null returned above.
        Value::Null | Value::Struct(_) => {}
        Value::Bool(_)
        | Value::Int(_)
        | Value::Uint(_)
        | Value::Float(_)
        | Value::Complex(_)
        | Value::Str(_) => *dst = src.clone(),
        // Byte buffers duplicate as one raw range.
        Value::Bytes(b) => *dst = Value::Bytes(Heap::new((**b).clone())),
        Value::Array(xs) => {
            let mut out = Vec::with_capacity(xs.len());
            for x in xs {
                out.push(clone_node(x, keep_private));
            }
            *dst = Value::Array(out);
        }
        Value::List(xs) => {
            // Size to the source capacity so appends on the clone never
            // alias spare storage.
            let mut out = Vec::with_capacity(xs.capacity());
            for x in xs.iter() {
                out.push(clone_node(x, keep_private));
            }
            *dst = Value::List(Heap::new(out));
        }
        Value::Map(m) => {
            let mut out = ValueMap::with_capacity(m.len());
            for (k, v) in m.iter() {
                // Keys get the same kind-based treatment as values.
                out.insert(clone_node(k, keep_private), clone_node(v, keep_private));
            }
            *dst = Value::Map(Heap::new(out));
        }
        Value::Ref(p) => {
            let pointee = clone_node(p, keep_private);
            *dst = Value::Ref(Heap::new(pointee));
        }
        Value::Boxed(p) => {
            let inner = clone_node(p, keep_private);
            *dst = Value::Boxed(Heap::new(inner));
        }
    }
}

/// Clone a child node into a fresh zero-seeded slot.
///
/// Simple kinds short-circuit to a plain value copy — the primary
/// performance lever, checked before any recursion.
fn clone_node(src: &Value, keep_private: bool) -> Value {
    if src.kind() == Kind::Simple {
        return src.clone();
    }
    let mut dst = src.zero_like();
    copy_into(&mut dst, src, keep_private);
    dst
}

fn copy_struct(dst: &mut Value, src: &StructValue, keep_private: bool, facts: TypeFacts) {
    if facts.simple_struct {
        // Identical to per-field copy, since every field is Simple.
        *dst = Value::Struct(src.clone());
        return;
    }

    let mut out = if keep_private {
        // Bulk copy first: non-exported fields preserved verbatim,
        // including shared heap storage behind them.
        src.clone()
    } else {
        StructValue::zeroed(src.layout().clone())
    };
    for (i, def) in src.layout().fields().iter().enumerate() {
        if def.exported {
            out.fields_mut()[i] = clone_node(&src.fields()[i], keep_private);
        }
    }
    *dst = Value::Struct(out);
}

/// Invoke the type's own clone method if its facts name one.
///
/// The override's result counts as the whole node: the copier never
/// additionally traverses its children, and never re-allocates shared
/// state the override chose to return. Two adjustments apply to the
/// returned value: one boxed layer is unwrapped, and a returned
/// pointer is dereferenced once when the destination slot is not a
/// pointer slot.
fn try_override(dst: &mut Value, src: &StructValue, facts: TypeFacts) -> bool {
    let Some(slot) = facts.override_slot else {
        return false;
    };
    let Some(methods) = OverrideRegistry::global().methods_of(src.type_name()) else {
        return false;
    };
    let table = if slot.by_ref {
        &methods.by_ref
    } else {
        &methods.by_value
    };
    let Some(method) = table.get(slot.index) else {
        return false;
    };

    let receiver = if slot.by_ref {
        // The method wants a pointer; hand it an addressable copy.
        Value::ptr(Value::Struct(src.clone()))
    } else {
        Value::Struct(src.clone())
    };
    let mut out = method.invoke(&receiver);

    if let Value::Boxed(inner) = out {
        out = (*inner).clone();
    }
    if !matches!(dst, Value::Ref(_)) {
        if let Value::Ref(pointee) = out {
            out = (*pointee).clone();
        }
    }
    *dst = out;
    true
}

fn check_assignable(dst: &Value, src: &Value) {
    // An unallocated slot may take on any concrete type.
    if matches!(dst, Value::Null) {
        return;
    }
    let compatible = match (dst, src) {
        (Value::Struct(a), Value::Struct(b)) => a.type_name() == b.type_name(),
        _ => std::mem::discriminant(dst) == std::mem::discriminant(src),
    };
    assert!(
        compatible,
        "type mismatch: cannot copy {:?} into {:?} slot",
        src.kind(),
        dst.kind()
    );
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use graft_value::{FieldDef, StructLayout};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn simple_values_copy_directly() {
        assert_eq!(clone_value(&Value::int(42), true), Value::int(42));
        assert_eq!(clone_value(&Value::str("s"), true), Value::str("s"));
        assert_eq!(clone_value(&Value::Null, true), Value::Null);
    }

    #[test]
    fn zero_source_short_circuits() {
        // A zero source must leave a pre-seeded destination untouched
        // and allocate nothing.
        let mut dst = Value::int(0);
        copy_into(&mut dst, &Value::int(0), true);
        assert_eq!(dst, Value::int(0));

        let mut dst = Value::Null;
        copy_into(&mut dst, &Value::Null, true);
        assert_eq!(dst, Value::Null);
    }

    #[test]
    fn lists_get_fresh_backing_storage() {
        let src = Value::list(vec![Value::int(1), Value::int(2)]);
        let out = clone_value(&src, true);
        assert_eq!(out, src);
        match (&src, &out) {
            (Value::List(a), Value::List(b)) => assert!(!Heap::ptr_eq(a, b)),
            other => panic!("expected lists, got {other:?}"),
        }
    }

    #[test]
    fn list_clone_preserves_capacity() {
        let mut backing = Vec::with_capacity(32);
        backing.push(Value::int(1));
        let src = Value::List(Heap::new(backing));
        match clone_value(&src, true) {
            Value::List(out) => {
                assert_eq!(out.len(), 1);
                assert!(out.capacity() >= 32);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn bytes_fast_path_duplicates_buffer() {
        let src = Value::bytes(vec![1, 2, 3]);
        let out = clone_value(&src, true);
        assert_eq!(out, src);
        match (&src, &out) {
            (Value::Bytes(a), Value::Bytes(b)) => assert!(!Heap::ptr_eq(a, b)),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    #[test]
    fn map_keys_and_values_are_duplicated() {
        let key = Value::ptr(Value::int(1));
        let val = Value::list(vec![Value::int(2)]);
        let src = Value::map([(key.clone(), val.clone())]);
        let out = clone_value(&src, true);
        assert_eq!(out, src);

        let out_map = out.as_map().unwrap();
        let (out_key, out_val) = out_map.iter().next().unwrap();
        match (&key, out_key) {
            (Value::Ref(a), Value::Ref(b)) => assert!(!Heap::ptr_eq(a, b)),
            other => panic!("expected refs, got {other:?}"),
        }
        match (&val, out_val) {
            (Value::List(a), Value::List(b)) => assert!(!Heap::ptr_eq(a, b)),
            other => panic!("expected lists, got {other:?}"),
        }
    }

    #[test]
    fn boxed_values_are_reboxed() {
        let src = Value::boxed(Value::list(vec![Value::int(1)]));
        let out = clone_value(&src, true);
        assert_eq!(out, src);
        match (&src, &out) {
            (Value::Boxed(a), Value::Boxed(b)) => {
                assert!(!Heap::ptr_eq(a, b));
                match (&**a, &**b) {
                    (Value::List(la), Value::List(lb)) => assert!(!Heap::ptr_eq(la, lb)),
                    other => panic!("expected lists, got {other:?}"),
                }
            }
            other => panic!("expected boxed, got {other:?}"),
        }
    }

    #[test]
    fn simple_struct_bulk_copies() {
        let layout = Heap::new(StructLayout::new(
            "copy.tests.flat",
            vec![
                FieldDef::exported("a", Value::Int(0)),
                FieldDef::private("b", Value::str("")),
            ],
        ));
        let src = Value::Struct(StructValue::new(
            layout,
            vec![Value::int(5), Value::str("p")],
        ));
        // Bulk copy must preserve private fields even without
        // keep_private: all fields are Simple, so nothing is shared.
        let out = clone_value(&src, false);
        assert_eq!(out, src);
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn mismatched_slot_panics() {
        let mut dst = Value::int(0);
        copy_into(&mut dst, &Value::str("s"), true);
    }
}
