//! Structural clone engine over the graft value graph.
//!
//! Given an arbitrary runtime [`Value`](graft_value::Value) — scalar,
//! struct, array, list, map, pointer, or boxed cell — [`clone_value`]
//! produces an independent copy that shares no mutable backing storage
//! with the source, while letting any struct type replace the default
//! structural copy with its own registered clone method, and letting
//! the caller choose whether non-exported struct state is preserved or
//! reset.
//!
//! # Architecture
//!
//! - [`LockedMap`] — the generic concurrent memoization primitive
//!   (get-or-create with compute-outside-lock, install-with-recheck).
//! - [`OverrideRegistry`] — process-wide method sets; a type's
//!   self-clone capability is an ordinary registered method.
//! - [`FactsCache`] — per-type derived facts (bulk-copyability,
//!   override slot), computed once per type identity, never evicted.
//! - [`copy_into`] — the recursive copier, dispatching on the value's
//!   [`Kind`](graft_value::Kind) with the override resolver consulted
//!   at every struct node.
//!
//! # Known limitation
//!
//! Reference cycles are not detected; cloning a cyclic graph recurses
//! until the call stack is exhausted. Cycle detection would change the
//! sharing and identity semantics callers rely on, so the limitation
//! is documented rather than fixed.

mod copy;
mod facts;
mod lmap;
mod registry;

#[cfg(test)]
mod tests;

pub use copy::{clone_value, copy_into};
pub use facts::{FactsCache, OverrideSlot, TypeFacts};
pub use lmap::LockedMap;
pub use registry::{MethodDef, MethodFn, OverrideRegistry, ReturnShape, TypeMethods, CLONE_METHOD};
