//! Generic concurrent map with get-or-create memoization.
//!
//! `LockedMap` is the library's shared memoization primitive: a
//! `RwLock`-guarded hash map whose [`LockedMap::get_or_create`] follows
//! the compute-outside-lock, install-with-recheck discipline. The type
//! facts cache is built from it.

use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Concurrent map returning values by clone.
///
/// Callers store cheap values (`Copy` facts, `Heap` handles), so the
/// clone on the read path costs a refcount bump at most.
pub struct LockedMap<K, V> {
    inner: RwLock<FxHashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> LockedMap<K, V> {
    pub fn new() -> Self {
        LockedMap {
            inner: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.write().insert(key, value);
    }

    /// Insert and return the previous value, if any.
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Visit entries under the read lock until `f` returns false.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V) -> bool) {
        for (k, v) in self.inner.read().iter() {
            if !f(k, v) {
                return;
            }
        }
    }

    /// Return the value for `key`, creating it with `init` on first use.
    ///
    /// `init` runs outside any lock (it may be expensive, and there is
    /// a chance its result will not be used); the install re-checks
    /// under the write lock and discards the second writer's result
    /// instead of double-applying it.
    pub fn get_or_create(&self, key: K, init: impl FnOnce() -> V) -> V {
        if let Some(v) = self.inner.read().get(&key) {
            return v.clone();
        }

        let created = init();

        let mut guard = self.inner.write();
        if let Some(v) = guard.get(&key) {
            // Raced with another writer; keep the installed value.
            return v.clone();
        }
        guard.insert(key, created.clone());
        created
    }
}

impl<K: Eq + Hash + Clone, V: Clone> LockedMap<K, V> {
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys().cloned().collect()
    }
}

impl<K: Eq + Hash, V: Clone> Default for LockedMap<K, V> {
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn basic_operations() {
        let m: LockedMap<&str, i64> = LockedMap::new();
        assert!(m.is_empty());
        m.insert("a", 1);
        assert_eq!(m.get(&"a"), Some(1));
        assert_eq!(m.swap("a", 2), Some(1));
        assert_eq!(m.remove(&"a"), Some(2));
        assert_eq!(m.get(&"a"), None);
    }

    #[test]
    fn get_or_create_memoizes() {
        let m: LockedMap<&str, i64> = LockedMap::new();
        let calls = AtomicUsize::new(0);
        let make = || {
            calls.fetch_add(1, Ordering::Relaxed);
            7
        };
        assert_eq!(m.get_or_create("k", make), 7);
        assert_eq!(m.get_or_create("k", make), 7);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn for_each_stops_early() {
        let m: LockedMap<i32, i32> = LockedMap::new();
        for i in 0..10 {
            m.insert(i, i);
        }
        let mut seen = 0;
        m.for_each(|_, _| {
            seen += 1;
            seen < 3
        });
        assert_eq!(seen, 3);
    }

    #[test]
    fn concurrent_get_or_create_installs_one_value() {
        let m: LockedMap<usize, usize> = LockedMap::new();
        let results: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let m = &m;
                    s.spawn(move || m.get_or_create(i % 4, move || i))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        // Every caller of the same key observed the same installed value.
        for key in 0..4 {
            let winner = m.get(&key).unwrap();
            for (i, r) in results.iter().enumerate() {
                if i % 4 == key {
                    assert_eq!(*r, winner);
                }
            }
        }
        assert_eq!(m.len(), 4);
    }
}
