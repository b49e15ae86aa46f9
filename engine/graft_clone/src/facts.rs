//! Per-type derived facts, memoized process-wide.
//!
//! Two facts are derived per struct type: whether the type is composed
//! entirely of Simple fields (bulk-copyable in one assignment), and
//! whether it exposes a self-clone override, and at which method slot.
//! Facts are computed once per type identity and never recomputed or
//! invalidated; the cache is a [`LockedMap`] and inherits its
//! compute-outside-lock, install-with-recheck discipline.

use std::sync::OnceLock;

use graft_value::{Kind, Name, StructLayout};

use crate::lmap::LockedMap;
use crate::registry::{OverrideRegistry, ReturnShape, TypeMethods, CLONE_METHOD};

/// Where a type's self-clone override lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OverrideSlot {
    /// True if the method takes a ref receiver.
    pub by_ref: bool,
    /// Index into the receiver table it was found in.
    pub index: usize,
}

/// Immutable per-type facts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeFacts {
    /// Every declared field is of Simple kind; the whole struct can be
    /// duplicated with a single bulk assignment.
    pub simple_struct: bool,
    pub override_slot: Option<OverrideSlot>,
}

/// Process-wide facts cache, keyed by type identity.
pub struct FactsCache {
    facts: LockedMap<Name, TypeFacts>,
}

impl FactsCache {
    pub fn new() -> FactsCache {
        FactsCache {
            facts: LockedMap::new(),
        }
    }

    /// The process-wide cache instance.
    pub fn global() -> &'static FactsCache {
        static GLOBAL: OnceLock<FactsCache> = OnceLock::new();
        GLOBAL.get_or_init(FactsCache::new)
    }

    /// Facts for a struct type, computed on first sight.
    pub fn facts_of(&self, layout: &StructLayout, registry: &OverrideRegistry) -> TypeFacts {
        self.facts
            .get_or_create(layout.type_name(), || compute_facts(layout, registry))
    }

    /// Number of distinct types observed so far.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl Default for FactsCache {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_facts(layout: &StructLayout, registry: &OverrideRegistry) -> TypeFacts {
    let simple_struct = layout
        .fields()
        .iter()
        .all(|f| f.zero.kind() == Kind::Simple);
    let override_slot = registry
        .methods_of(layout.type_name())
        .and_then(|methods| resolve_slot(&methods));
    tracing::trace!(
        type_name = layout.type_name().as_str(),
        simple_struct,
        has_override = override_slot.is_some(),
        "type facts computed"
    );
    TypeFacts {
        simple_struct,
        override_slot,
    }
}

/// Find the self-clone slot: value-receiver candidates first, then
/// ref-receiver ones. A candidate must be named `clone`, take no
/// parameters, and return its own type or a pointer to it; anything
/// else is silently not an override.
fn resolve_slot(methods: &TypeMethods) -> Option<OverrideSlot> {
    let wanted = Name::intern(CLONE_METHOD);
    let qualifies = |m: &crate::registry::MethodDef| {
        m.name == wanted
            && m.params == 0
            && matches!(m.returns, ReturnShape::SelfValue | ReturnShape::SelfRef)
    };
    if let Some(index) = methods.by_value.iter().position(qualifies) {
        return Some(OverrideSlot {
            by_ref: false,
            index,
        });
    }
    methods
        .by_ref
        .iter()
        .position(qualifies)
        .map(|index| OverrideSlot {
            by_ref: true,
            index,
        })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use graft_value::{FieldDef, Value};

    use super::*;
    use crate::registry::MethodDef;

    fn layout(name: &str, fields: Vec<FieldDef>) -> StructLayout {
        StructLayout::new(name, fields)
    }

    #[test]
    fn all_simple_fields_make_a_simple_struct() {
        let cache = FactsCache::new();
        let reg = OverrideRegistry::new();
        let l = layout(
            "facts.tests.scalars",
            vec![
                FieldDef::exported("a", Value::Int(0)),
                FieldDef::private("b", Value::str("")),
            ],
        );
        assert!(cache.facts_of(&l, &reg).simple_struct);
    }

    #[test]
    fn a_composite_field_disqualifies_bulk_copy() {
        let cache = FactsCache::new();
        let reg = OverrideRegistry::new();
        let l = layout(
            "facts.tests.mixed",
            vec![
                FieldDef::exported("a", Value::Int(0)),
                FieldDef::exported("xs", Value::Null),
            ],
        );
        assert!(!cache.facts_of(&l, &reg).simple_struct);
    }

    #[test]
    fn value_receiver_slot_wins_over_ref_receiver() {
        let reg = OverrideRegistry::new();
        reg.register(
            "facts.tests.both",
            TypeMethods::new()
                .ref_method(MethodDef::new(
                    CLONE_METHOD,
                    0,
                    ReturnShape::SelfRef,
                    |r| r.clone(),
                ))
                .value_method(MethodDef::new(
                    CLONE_METHOD,
                    0,
                    ReturnShape::SelfValue,
                    |r| r.clone(),
                )),
        );
        let cache = FactsCache::new();
        let l = layout("facts.tests.both", vec![]);
        assert_eq!(
            cache.facts_of(&l, &reg).override_slot,
            Some(OverrideSlot {
                by_ref: false,
                index: 0
            })
        );
    }

    #[test]
    fn malformed_signatures_are_not_overrides() {
        let reg = OverrideRegistry::new();
        reg.register(
            "facts.tests.malformed",
            TypeMethods::new()
                // Wrong arity.
                .value_method(MethodDef::new(
                    CLONE_METHOD,
                    1,
                    ReturnShape::SelfValue,
                    |r| r.clone(),
                ))
                // Wrong return type.
                .value_method(MethodDef::new(CLONE_METHOD, 0, ReturnShape::Other, |r| {
                    r.clone()
                })),
        );
        let cache = FactsCache::new();
        let l = layout("facts.tests.malformed", vec![]);
        assert_eq!(cache.facts_of(&l, &reg).override_slot, None);
    }

    #[test]
    fn facts_never_change_once_installed() {
        let reg = OverrideRegistry::new();
        let cache = FactsCache::new();
        let l = layout("facts.tests.frozen", vec![]);
        assert_eq!(cache.facts_of(&l, &reg).override_slot, None);

        // Late registration: the cached facts stay as first computed.
        reg.register(
            "facts.tests.frozen",
            TypeMethods::new().value_method(MethodDef::new(
                CLONE_METHOD,
                0,
                ReturnShape::SelfValue,
                |r| r.clone(),
            )),
        );
        assert_eq!(cache.facts_of(&l, &reg).override_slot, None);
    }

    #[test]
    fn concurrent_callers_observe_one_fact() {
        let reg = OverrideRegistry::new();
        let cache = FactsCache::new();
        let l = layout(
            "facts.tests.concurrent",
            vec![FieldDef::exported("a", Value::Int(0))],
        );
        let facts: Vec<TypeFacts> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.facts_of(&l, &reg)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(facts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
    }
}
