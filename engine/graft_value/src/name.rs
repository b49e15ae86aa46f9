//! Interned names for struct types and fields.
//!
//! Names are `Copy` handles into a process-wide interner, so type
//! identity comparisons and cache keys are integer comparisons. The
//! interner uses a read-lock fast path and a write lock with a
//! double-check for the insert path, so concurrent interning of the
//! same string installs it exactly once.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned identifier for a type or field name.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

struct Interner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| {
        RwLock::new(Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        })
    })
}

impl Name {
    /// Intern a string, returning its handle.
    pub fn intern(s: &str) -> Name {
        let shared = interner();

        // Fast path: already interned.
        {
            let guard = shared.read();
            if let Some(&id) = guard.map.get(s) {
                return Name(id);
            }
        }

        let mut guard = shared.write();

        // Double-check after acquiring the write lock.
        if let Some(&id) = guard.map.get(s) {
            return Name(id);
        }

        // Leak the string to get a 'static lifetime; the interner lives
        // for the whole process, so nothing is ever reclaimed anyway.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = u32::try_from(guard.strings.len()).unwrap_or_else(|_| {
            panic!("name interner exceeded {} entries", u32::MAX);
        });
        guard.strings.push(leaked);
        guard.map.insert(leaked, id);
        Name(id)
    }

    /// Resolve the handle back to its string.
    pub fn as_str(self) -> &'static str {
        interner().read().strings[self.0 as usize]
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
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
    fn interning_is_idempotent() {
        let a = Name::intern("point");
        let b = Name::intern("point");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "point");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        assert_ne!(Name::intern("left"), Name::intern("right"));
    }

    #[test]
    fn concurrent_interning_converges() {
        let names: Vec<Name> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| Name::intern("concurrent-name")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(names.windows(2).all(|w| w[0] == w[1]));
    }
}
