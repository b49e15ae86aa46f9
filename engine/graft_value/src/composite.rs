//! Struct layouts and struct values.
//!
//! A [`StructLayout`] is the immutable per-type descriptor: ordered
//! field definitions with visibility and a typed zero, plus a
//! name-to-index map for O(1) field access. Instances share their
//! layout through a [`Heap`] handle; only the field vector is
//! per-instance.

use rustc_hash::FxHashMap;

use crate::heap::Heap;
use crate::name::Name;
use crate::value::Value;

/// A single field declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: Name,
    /// Exported fields are deep-cloned; non-exported fields follow the
    /// caller's privacy policy.
    pub exported: bool,
    /// The field's typed zero value. Drives zero detection and the
    /// privacy reset path.
    pub zero: Value,
}

impl FieldDef {
    pub fn exported(name: &str, zero: Value) -> FieldDef {
        FieldDef {
            name: Name::intern(name),
            exported: true,
            zero,
        }
    }

    pub fn private(name: &str, zero: Value) -> FieldDef {
        FieldDef {
            name: Name::intern(name),
            exported: false,
            zero,
        }
    }
}

/// Immutable per-type struct descriptor.
#[derive(Debug)]
pub struct StructLayout {
    type_name: Name,
    fields: Vec<FieldDef>,
    index: FxHashMap<Name, usize>,
}

impl StructLayout {
    pub fn new(type_name: &str, fields: Vec<FieldDef>) -> StructLayout {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name, i))
            .collect();
        StructLayout {
            type_name: Name::intern(type_name),
            fields,
            index,
        }
    }

    pub fn type_name(&self) -> Name {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index of a field by name.
    pub fn index_of(&self, name: Name) -> Option<usize> {
        self.index.get(&name).copied()
    }
}

impl PartialEq for StructLayout {
    fn eq(&self, other: &Self) -> bool {
        // Layouts are per-type singletons in practice; the name is the
        // type identity and the fields pin the shape.
        self.type_name == other.type_name && self.fields == other.fields
    }
}

/// Struct instance.
///
/// `clone()` copies the field vector shallowly (every field is a
/// shallow `Value` copy, so nested heap storage stays shared) — the
/// same semantics as struct assignment in the value graph's source
/// model. The layout handle is always shared.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    layout: Heap<StructLayout>,
    fields: Vec<Value>,
}

impl StructValue {
    /// Build an instance from field values in layout order.
    ///
    /// # Panics
    ///
    /// Panics if the field count does not match the layout.
    pub fn new(layout: Heap<StructLayout>, fields: Vec<Value>) -> StructValue {
        assert_eq!(
            layout.len(),
            fields.len(),
            "struct {} expects {} fields, got {}",
            layout.type_name(),
            layout.len(),
            fields.len()
        );
        StructValue { layout, fields }
    }

    /// Build the zero instance: every field at its declared zero.
    pub fn zeroed(layout: Heap<StructLayout>) -> StructValue {
        let fields = layout.fields().iter().map(|f| f.zero.clone()).collect();
        StructValue { layout, fields }
    }

    pub fn layout(&self) -> &Heap<StructLayout> {
        &self.layout
    }

    pub fn type_name(&self) -> Name {
        self.layout.type_name()
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Value] {
        &mut self.fields
    }

    /// Field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let idx = self.layout.index_of(Name::intern(name))?;
        self.fields.get(idx)
    }

    /// Mutable field value by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        let idx = self.layout.index_of(Name::intern(name))?;
        self.fields.get_mut(idx)
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

    fn point_layout() -> Heap<StructLayout> {
        Heap::new(StructLayout::new(
            "composite.tests.point",
            vec![
                FieldDef::exported("x", Value::Int(0)),
                FieldDef::exported("y", Value::Int(0)),
                FieldDef::private("tag", Value::str("")),
            ],
        ))
    }

    #[test]
    fn field_lookup_by_name() {
        let layout = point_layout();
        let sv = StructValue::new(
            layout,
            vec![Value::int(1), Value::int(2), Value::str("origin")],
        );
        assert_eq!(sv.field("x"), Some(&Value::int(1)));
        assert_eq!(sv.field("tag"), Some(&Value::str("origin")));
        assert_eq!(sv.field("missing"), None);
    }

    #[test]
    fn zeroed_uses_declared_zeros() {
        let sv = StructValue::zeroed(point_layout());
        assert_eq!(
            sv.fields(),
            &[Value::int(0), Value::int(0), Value::str("")]
        );
    }

    #[test]
    fn shallow_clone_shares_heap_children() {
        let layout = Heap::new(StructLayout::new(
            "composite.tests.holder",
            vec![FieldDef::exported("items", Value::Null)],
        ));
        let items = Value::list(vec![Value::int(1)]);
        let sv = StructValue::new(layout, vec![items]);
        let copy = sv.clone();
        match (&sv.fields()[0], &copy.fields()[0]) {
            (Value::List(a), Value::List(b)) => assert!(Heap::ptr_eq(a, b)),
            other => panic!("expected lists, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "expects 3 fields")]
    fn field_count_mismatch_panics() {
        let _ = StructValue::new(point_layout(), vec![Value::int(1)]);
    }
}
