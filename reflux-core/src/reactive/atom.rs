//! Atom Implementation
//!
//! An Atom is the fundamental reactive primitive. It holds a value and lets
//! the runtime know whenever it is read or written.
//!
//! # How Atoms Work
//!
//! 1. When an atom is read while an observer is running, the runtime records
//!    an edge from the atom to that observer.
//!
//! 2. When an atom is written outside a transaction, every subscribed
//!    observer re-runs synchronously, in subscription order.
//!
//! 3. When an atom is written inside a transaction, the value changes
//!    immediately but notification waits for the transaction to commit.
//!
//! Writes never compare against the previous value: setting the same value
//! twice notifies twice.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ReactiveError;

use super::runtime::Runtime;

/// Unique identifier for an atom.
///
/// IDs are assigned from a process-wide counter and never reused, so they
/// stay unique across runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u64);

impl AtomId {
    /// Allocate the next atom ID.
    pub(crate) fn new() -> Self {
        static ATOM_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust
/// use reflux_core::{Runtime, RuntimeConfig};
///
/// let runtime = Runtime::new(RuntimeConfig::default());
/// let count = runtime.atom(0);
///
/// assert_eq!(count.get(), 0);
/// count.set(5)?;
/// assert_eq!(count.get(), 5);
/// # Ok::<(), reflux_core::ReactiveError>(())
/// ```
pub struct Atom<T> {
    /// Unique identifier for this atom.
    id: AtomId,

    /// The current value. Shared by clones of this atom.
    value: Rc<RefCell<T>>,

    /// The runtime this atom reports reads and writes to.
    runtime: Runtime,
}

impl<T> Atom<T>
where
    T: Clone + 'static,
{
    /// Create a new atom bound to `runtime`.
    pub(crate) fn new(runtime: Runtime, value: T) -> Self {
        Self {
            id: AtomId::new(),
            value: Rc::new(RefCell::new(value)),
            runtime,
        }
    }

    /// Get the atom's unique ID.
    pub fn id(&self) -> AtomId {
        self.id
    }

    /// Get the current value.
    ///
    /// If an observer is running, it becomes a subscriber of this atom.
    pub fn get(&self) -> T {
        self.runtime.track(self.id);
        self.value.borrow().clone()
    }

    /// Get the current value without tracking.
    ///
    /// Use this when an observer needs to peek at an atom without
    /// re-running when it changes.
    pub fn get_untracked(&self) -> T {
        self.value.borrow().clone()
    }

    /// Overwrite the value and notify subscribers.
    ///
    /// Inside a transaction this only marks the atom dirty. Outside one,
    /// every subscriber runs before this returns; failures from those runs
    /// are reported here once all subscribers have been attempted (or at the
    /// first failure under [`FailurePolicy::FailFast`]).
    ///
    /// [`FailurePolicy::FailFast`]: crate::FailurePolicy::FailFast
    pub fn set(&self, value: T) -> Result<(), ReactiveError> {
        *self.value.borrow_mut() = value;
        self.runtime.mark_changed(self.id)
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> Result<(), ReactiveError>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get_untracked();
        self.set(f(&current))
    }

    /// Number of observers currently subscribed to this atom.
    pub fn subscriber_count(&self) -> usize {
        self.runtime.subscriber_count(self.id)
    }

    /// The runtime this atom belongs to.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> Debug for Atom<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id)
            .field("value", &*self.value.borrow())
            .field("subscriber_count", &self.runtime.subscriber_count(self.id))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
