//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects atoms, autoruns and
//! transactions. It owns the observer stack, the dependency registry and the
//! transaction stack, and it decides what happens when an atom is read or
//! written.
//!
//! # How It Works
//!
//! 1. When an atom is read, the runtime checks the observer stack. If an
//!    observer is running, an edge from the atom to that observer is added
//!    to the registry.
//!
//! 2. When an atom is written, the runtime either:
//!    a. records the atom as dirty in the innermost transaction, or
//!    b. runs every subscriber of the atom right away.
//!
//! 3. Each observer run pushes the observer onto the stack, so the reads it
//!    makes while re-running are tracked again.
//!
//! # Threading
//!
//! A runtime is a cheap `Rc` handle and is confined to the thread that
//! created it. [`Runtime::current`] returns a per-thread default runtime,
//! which is what the free functions [`atom`], [`autorun`](super::autorun())
//! and [`transaction`](super::transaction()) use.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::Serialize;

use crate::config::{FailurePolicy, RuntimeConfig};
use crate::error::ReactiveError;

use super::atom::{Atom, AtomId};
use super::context::{ObserverFrame, ObserverStack};
use super::observer::{Observer, ObserverId};
use super::registry::DependencyRegistry;
use super::transaction::TransactionStack;

thread_local! {
    static CURRENT: Runtime = Runtime::new(RuntimeConfig::default());
}

/// Mutable engine state, borrowed only between observer runs.
#[derive(Debug, Default)]
pub(crate) struct RuntimeState {
    pub(crate) observers: ObserverStack,
    pub(crate) registry: DependencyRegistry,
    pub(crate) transactions: TransactionStack,
}

struct RuntimeInner {
    config: RuntimeConfig,
    state: RefCell<RuntimeState>,
}

/// A reactive engine instance.
///
/// Cloning a runtime yields another handle to the same engine.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

/// Point-in-time counters describing a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Atoms with at least one subscriber.
    pub tracked_atoms: usize,
    /// Total atom -> observer edges.
    pub edges: usize,
    /// Observers currently running.
    pub observer_depth: usize,
    /// Transactions currently open.
    pub transaction_depth: usize,
}

impl Runtime {
    /// Create a new, independent runtime.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                state: RefCell::new(RuntimeState::default()),
            }),
        }
    }

    /// The default runtime of the calling thread.
    pub fn current() -> Self {
        CURRENT.with(Runtime::clone)
    }

    /// The configuration this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub(crate) fn state(&self) -> &RefCell<RuntimeState> {
        &self.inner.state
    }

    /// Create an atom owned by this runtime.
    pub fn atom<T>(&self, value: T) -> Atom<T>
    where
        T: Clone + 'static,
    {
        Atom::new(self.clone(), value)
    }

    /// Record that the running observer, if any, read `atom`.
    pub(crate) fn track(&self, atom: AtomId) {
        let mut state = self.state().borrow_mut();
        let RuntimeState {
            observers,
            registry,
            ..
        } = &mut *state;

        if let Some(observer) = observers.top() {
            if registry.subscribe(atom, observer) {
                tracing::trace!(
                    atom = atom.as_u64(),
                    observer = %observer.id(),
                    "dependency recorded"
                );
            }
        }
    }

    /// React to a write of `atom`.
    pub(crate) fn mark_changed(&self, atom: AtomId) -> Result<(), ReactiveError> {
        let subscribers = {
            let mut state = self.state().borrow_mut();
            if let Some(frame) = state.transactions.innermost_mut() {
                frame.dirty.insert(atom);
                tracing::trace!(atom = atom.as_u64(), "write deferred to transaction");
                return Ok(());
            }
            state.registry.subscribers(atom)
        };

        self.notify(subscribers)
    }

    /// Run each observer once, isolating failures per observer.
    pub(crate) fn notify(&self, observers: Vec<Observer>) -> Result<(), ReactiveError> {
        if observers.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = observers.len(), "notifying observers");

        let mut failures = Vec::new();
        for observer in &observers {
            if let Err(err) = self.run_observer(observer) {
                if self.inner.config.failure_policy == FailurePolicy::FailFast {
                    return Err(err);
                }
                failures.push(err);
            }
        }

        ReactiveError::collect(failures)
    }

    /// Run `observer` as the current reader.
    ///
    /// A panic inside the observer is caught and returned as an error; the
    /// observer stack is unwound by the frame guard either way.
    pub(crate) fn run_observer(&self, observer: &Observer) -> Result<(), ReactiveError> {
        {
            let mut state = self.state().borrow_mut();
            let limit = self.inner.config.max_depth;
            if state.observers.depth() >= limit {
                tracing::warn!(observer = %observer.id(), limit, "observer nesting limit reached");
                return Err(ReactiveError::DepthExceeded {
                    observer: observer.id(),
                    limit,
                });
            }

            if self.inner.config.prune_stale_edges {
                let pruned = state.registry.forget(observer.id());
                tracing::trace!(observer = %observer.id(), pruned, "edges pruned before re-run");
            }
        }

        let _frame = ObserverFrame::enter(self, observer.clone());
        panic::catch_unwind(AssertUnwindSafe(|| observer.call())).map_err(|payload| {
            let message = panic_message(&*payload);
            tracing::warn!(observer = %observer.id(), %message, "observer panicked");
            ReactiveError::ObserverPanicked {
                observer: observer.id(),
                message,
            }
        })
    }

    /// Number of observers subscribed to `atom`.
    pub(crate) fn subscriber_count(&self, atom: AtomId) -> usize {
        self.state().borrow().registry.subscriber_count(atom)
    }

    /// The observer currently running, if any.
    pub fn current_observer(&self) -> Option<ObserverId> {
        self.state().borrow().observers.top().map(Observer::id)
    }

    /// Check if reads are currently being tracked.
    pub fn is_tracking(&self) -> bool {
        !self.state().borrow().observers.is_empty()
    }

    /// Check if a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.state().borrow().transactions.is_active()
    }

    /// Snapshot of the runtime's counters.
    pub fn stats(&self) -> RuntimeStats {
        let state = self.state().borrow();
        RuntimeStats {
            tracked_atoms: state.registry.atom_count(),
            edges: state.registry.edge_count(),
            observer_depth: state.observers.depth(),
            transaction_depth: state.transactions.depth(),
        }
    }

    /// Drop every dependency edge.
    ///
    /// Atoms keep their values; observers stop being notified until they are
    /// run again. Refused while anything is running, since the open frames
    /// would otherwise be popped from an empty stack.
    pub fn reset(&self) -> Result<(), ReactiveError> {
        let registry = {
            let mut state = self.state().borrow_mut();
            if !state.observers.is_empty() || state.transactions.is_active() {
                return Err(ReactiveError::ResetWhileActive {
                    observers: state.observers.depth(),
                    transactions: state.transactions.depth(),
                });
            }
            std::mem::take(&mut state.registry)
        };

        tracing::debug!(edges = registry.edge_count(), "runtime reset");
        // Observers may own the last handles to atoms; drop them outside the borrow.
        drop(registry);
        Ok(())
    }

    /// Check if two handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Create an atom on the calling thread's default runtime.
pub fn atom<T>(value: T) -> Atom<T>
where
    T: Clone + 'static,
{
    Runtime::current().atom(value)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
