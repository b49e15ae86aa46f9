//! Process-wide method registry: the self-clone capability surface.
//!
//! A struct type participates in override resolution by registering,
//! once, the methods it exposes — split into value-receiver and
//! ref-receiver tables, mirroring the two receiver forms a method set
//! can carry. The engine itself only ever looks for the [`CLONE_METHOD`]
//! slot, but the registry stores whole method tables so resolution has
//! to *search* and validate signatures, the way a reflection-based
//! lookup does.

use std::sync::Arc;
use std::sync::OnceLock;

use graft_value::{Heap, Name, Value};

use crate::lmap::LockedMap;

/// Method name the override resolver searches for.
pub const CLONE_METHOD: &str = "clone";

/// Declared shape of a method's single return value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    /// Returns the receiver's own type.
    SelfValue,
    /// Returns a pointer to the receiver's type.
    SelfRef,
    /// Anything else; such a method never qualifies as an override.
    Other,
}

/// Boxed method body. Receives the receiver value and returns the
/// method's single result.
pub type MethodFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A registered method.
#[derive(Clone)]
pub struct MethodDef {
    pub name: Name,
    /// Number of parameters beyond the receiver.
    pub params: usize,
    pub returns: ReturnShape,
    call: MethodFn,
}

impl MethodDef {
    pub fn new(
        name: &str,
        params: usize,
        returns: ReturnShape,
        call: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> MethodDef {
        MethodDef {
            name: Name::intern(name),
            params,
            returns,
            call: Arc::new(call),
        }
    }

    /// Invoke with a receiver and no further arguments.
    pub fn invoke(&self, receiver: &Value) -> Value {
        (self.call)(receiver)
    }
}

impl std::fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// A type's method set, split by receiver form.
#[derive(Clone, Debug, Default)]
pub struct TypeMethods {
    pub by_value: Vec<MethodDef>,
    pub by_ref: Vec<MethodDef>,
}

impl TypeMethods {
    pub fn new() -> TypeMethods {
        TypeMethods::default()
    }

    /// Add a value-receiver method (builder style).
    pub fn value_method(mut self, method: MethodDef) -> TypeMethods {
        self.by_value.push(method);
        self
    }

    /// Add a ref-receiver method (builder style).
    pub fn ref_method(mut self, method: MethodDef) -> TypeMethods {
        self.by_ref.push(method);
        self
    }
}

/// Process-wide registry of type method sets.
pub struct OverrideRegistry {
    methods: LockedMap<Name, Heap<TypeMethods>>,
}

impl OverrideRegistry {
    pub fn new() -> OverrideRegistry {
        OverrideRegistry {
            methods: LockedMap::new(),
        }
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static OverrideRegistry {
        static GLOBAL: OnceLock<OverrideRegistry> = OnceLock::new();
        GLOBAL.get_or_init(OverrideRegistry::new)
    }

    /// Register a type's method set.
    ///
    /// Method sets are static: registering after the type's facts have
    /// been cached has no effect on cloning, because facts are computed
    /// once per type and never invalidated.
    pub fn register(&self, type_name: &str, methods: TypeMethods) {
        self.methods.insert(Name::intern(type_name), Heap::new(methods));
    }

    /// The method set registered for `type_name`, if any.
    pub fn methods_of(&self, type_name: Name) -> Option<Heap<TypeMethods>> {
        self.methods.get(&type_name)
    }
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;

    #[test]
    fn registered_methods_are_visible() {
        let reg = OverrideRegistry::new();
        reg.register(
            "registry.tests.widget",
            TypeMethods::new().value_method(MethodDef::new(
                CLONE_METHOD,
                0,
                ReturnShape::SelfValue,
                |recv| recv.clone(),
            )),
        );
        let methods = reg
            .methods_of(Name::intern("registry.tests.widget"))
            .unwrap();
        assert_eq!(methods.by_value.len(), 1);
        assert!(methods.by_ref.is_empty());
        assert_eq!(methods.by_value[0].name, Name::intern(CLONE_METHOD));
    }

    #[test]
    fn unknown_types_have_no_methods() {
        let reg = OverrideRegistry::new();
        assert!(reg.methods_of(Name::intern("registry.tests.nowhere")).is_none());
    }

    #[test]
    fn invoke_passes_receiver_through() {
        let m = MethodDef::new("describe", 0, ReturnShape::Other, |recv| {
            Value::str(format!("got {:?}", recv.kind()))
        });
        assert_eq!(m.invoke(&Value::int(1)), Value::str("got Simple"));
    }
}
