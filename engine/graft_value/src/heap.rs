//! Shared heap storage for composite values.
//!
//! `Heap<T>` wraps an `Arc<T>`: cloning a heap handle shares the
//! backing storage, and [`Heap::ptr_eq`] is the identity test the
//! clone engine's no-aliasing guarantees are stated in terms of.

// Arc required: heap values are shared across threads and across
// shallow copies of their owners.
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared, reference-counted storage for a composite value.
pub struct Heap<T>(Arc<T>);

impl<T> Heap<T> {
    /// Allocate fresh backing storage.
    pub fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }

    /// True iff both handles point at the same backing storage.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<T: Clone> Heap<T> {
    /// Mutable access to the backing storage, detaching (copy-on-write)
    /// if it is shared with another handle.
    pub fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }
}

impl<T> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        // Content equality; identity is ptr_eq.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl<T: Eq> Eq for Heap<T> {}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_storage() {
        let a = Heap::new(vec![1, 2, 3]);
        let b = a.clone();
        assert!(Heap::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_allocations_are_distinct() {
        let a = Heap::new(vec![1, 2, 3]);
        let b = Heap::new(vec![1, 2, 3]);
        assert!(!Heap::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn make_mut_detaches_shared_storage() {
        let mut a = Heap::new(vec![1, 2, 3]);
        let b = a.clone();
        a.make_mut()[0] = 9;
        assert_eq!(*a, vec![9, 2, 3]);
        assert_eq!(*b, vec![1, 2, 3]);
        assert!(!Heap::ptr_eq(&a, &b));
    }
}
