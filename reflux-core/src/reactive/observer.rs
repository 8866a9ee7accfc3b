//! Observer types for the reactive system.
//!
//! An Observer is any computation that re-runs when the atoms it read change.
//! Observers are compared by identity, never by value: two closures with the
//! same body are still two different observers.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an observer.
///
/// Each observer gets a unique ID when created. The registry keys its
/// subscriber sets by this ID, which is what makes notification
/// deduplication possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Generate a new unique observer ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reactive function together with its identity.
///
/// Cloning an observer is cheap and keeps the same identity, so the clone
/// stored in the registry and the one on the observer stack compare equal.
#[derive(Clone)]
pub struct Observer {
    id: ObserverId,
    run: Rc<dyn Fn()>,
}

impl Observer {
    /// Wrap a callable as an observer with a fresh identity.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            id: ObserverId::new(),
            run: Rc::new(run),
        }
    }

    /// Get the observer's unique ID.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Invoke the observer's function.
    ///
    /// This does not enter a tracking context; use the runtime to run an
    /// observer so its reads are recorded.
    pub(crate) fn call(&self) {
        (self.run)();
    }
}

impl PartialEq for Observer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Observer {}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn observer_ids_are_unique() {
        let id1 = ObserverId::new();
        let id2 = ObserverId::new();
        let id3 = ObserverId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn observer_call_invokes_function() {
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let observer = Observer::new(move || called_clone.set(true));

        assert!(!called.get());
        observer.call();
        assert!(called.get());
    }

    #[test]
    fn clones_share_identity() {
        let a = Observer::new(|| {});
        let b = a.clone();
        let c = Observer::new(|| {});

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_uses_hash_prefix() {
        let id = ObserverId::new();
        assert_eq!(id.to_string(), format!("#{}", id.as_u64()));
    }
}
