//! Dynamic runtime value model for the graft clone engine.
//!
//! Rust exposes no runtime reflection over arbitrary structs, so the
//! engine operates over an explicit value graph: every node is a
//! [`Value`], and composite nodes (lists, maps, structs, references,
//! boxed cells) own their children through [`Heap`] storage.
//!
//! # Sharing and identity
//!
//! `Value::clone()` is a *shallow* copy: composite variants share their
//! heap storage through `Arc`-backed [`Heap`] handles, the same way an
//! assignment shares backing storage in the value graph's source
//! semantics. Identity of composite nodes is [`Heap::ptr_eq`]. Deep,
//! storage-independent duplication is the job of the `graft_clone`
//! crate.
//!
//! # Zero values
//!
//! Every runtime type has a typed zero ([`Value::zero_like`]): scalars
//! zero out, reference kinds (lists, maps, references, boxed cells)
//! become [`Value::Null`] — absence, not emptiness, is their zero
//! state. Struct layouts declare a zero per field, which drives both
//! zero detection and privacy resets during cloning.

mod composite;
mod de;
mod heap;
mod kind;
mod name;
mod ser;
mod value;

pub use composite::{FieldDef, StructLayout, StructValue};
pub use heap::Heap;
pub use kind::Kind;
pub use name::Name;
pub use value::{Complex, Value, ValueMap};
