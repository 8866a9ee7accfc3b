//! Transactions
//!
//! A transaction batches writes. While one is active, `Atom::set` updates the
//! value immediately but only records the atom as dirty in the innermost
//! transaction. When the body returns, the transaction is popped and every
//! observer of every dirty atom runs exactly once.
//!
//! # Lifecycle
//!
//! Idle -> Active (frame pushed) -> Committing (frame popped, observers
//! resolved and notified) -> Idle.
//!
//! The frame is owned by a [`TransactionScope`] guard. If the body panics,
//! the guard pops the frame and discards its dirty set without notifying
//! anyone, so a failing body never leaves a stale frame behind.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::config::NestingPolicy;
use crate::error::ReactiveError;

use super::atom::AtomId;
use super::runtime::{Runtime, RuntimeState};

/// Unique identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TransactionId(u64);

impl TransactionId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One in-flight batching scope and the atoms written during it.
#[derive(Debug)]
pub(crate) struct TransactionFrame {
    pub(crate) id: TransactionId,
    pub(crate) dirty: IndexSet<AtomId>,
}

/// Stack of in-flight transactions; the last frame is the innermost.
#[derive(Debug, Default)]
pub(crate) struct TransactionStack {
    frames: SmallVec<[TransactionFrame; 4]>,
}

impl TransactionStack {
    pub(crate) fn push(&mut self, id: TransactionId) {
        self.frames.push(TransactionFrame {
            id,
            dirty: IndexSet::new(),
        });
    }

    pub(crate) fn pop(&mut self) -> Option<TransactionFrame> {
        self.frames.pop()
    }

    pub(crate) fn innermost_mut(&mut self) -> Option<&mut TransactionFrame> {
        self.frames.last_mut()
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Guard owning a pushed transaction frame.
///
/// Call [`TransactionScope::finish`] on the success path; dropping an
/// unfinished scope abandons the transaction.
pub(crate) struct TransactionScope<'rt> {
    runtime: &'rt Runtime,
    id: TransactionId,
    finished: bool,
}

impl<'rt> TransactionScope<'rt> {
    /// Push a fresh frame with an empty dirty set.
    pub(crate) fn begin(runtime: &'rt Runtime) -> Self {
        let id = TransactionId::new();
        let depth = {
            let mut state = runtime.state().borrow_mut();
            state.transactions.push(id);
            state.transactions.depth()
        };
        tracing::debug!(transaction = ?id, depth, "transaction started");
        Self {
            runtime,
            id,
            finished: false,
        }
    }

    /// Pop this scope's frame and hand back its dirty set.
    pub(crate) fn finish(mut self) -> IndexSet<AtomId> {
        self.finished = true;
        self.pop_frame().map(|frame| frame.dirty).unwrap_or_default()
    }

    fn pop_frame(&self) -> Option<TransactionFrame> {
        let popped = self.runtime.state().borrow_mut().transactions.pop();
        let popped_id = popped.as_ref().map(|frame| frame.id);
        if popped_id != Some(self.id) {
            tracing::error!(
                expected = ?self.id,
                actual = ?popped_id,
                "transaction stack discipline violated"
            );
        }
        debug_assert_eq!(popped_id, Some(self.id), "TransactionScope mismatch");
        popped
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let discarded = self.pop_frame().map_or(0, |frame| frame.dirty.len());
        tracing::warn!(
            transaction = ?self.id,
            discarded,
            "transaction body panicked; dirty atoms discarded"
        );
    }
}

impl Runtime {
    /// Run `body` with notifications batched until it returns.
    ///
    /// Every observer subscribed to an atom written inside `body` runs once
    /// after `body` returns, however many of its atoms were written and
    /// however often. The body's return value is handed back once all
    /// observers have been attempted.
    ///
    /// If `body` panics, the transaction is discarded without notifying
    /// anyone and the panic keeps unwinding. Atom values written before the
    /// panic are not rolled back.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    /// use reflux_core::Runtime;
    ///
    /// let runtime = Runtime::default();
    /// let count = runtime.atom(0);
    /// let log = Rc::new(RefCell::new(Vec::new()));
    ///
    /// let (reader, sink) = (count.clone(), log.clone());
    /// runtime.autorun(move || sink.borrow_mut().push(reader.get()))?;
    ///
    /// runtime.transaction(|| -> Result<(), reflux_core::ReactiveError> {
    ///     count.set(1)?;
    ///     count.set(2)?;
    ///     count.set(3)
    /// })??;
    /// assert_eq!(*log.borrow(), vec![0, 3]);
    /// # Ok::<(), reflux_core::ReactiveError>(())
    /// ```
    pub fn transaction<R, F>(&self, body: F) -> Result<R, ReactiveError>
    where
        F: FnOnce() -> R,
    {
        let scope = TransactionScope::begin(self);
        let output = body();
        let dirty = scope.finish();

        let observers = {
            let mut state = self.state().borrow_mut();
            let RuntimeState {
                registry,
                transactions,
                ..
            } = &mut *state;

            match (self.config().nesting, transactions.innermost_mut()) {
                (NestingPolicy::Flatten, Some(parent)) => {
                    tracing::trace!(
                        dirty = dirty.len(),
                        "dirty atoms handed to enclosing transaction"
                    );
                    parent.dirty.extend(dirty);
                    Vec::new()
                }
                _ => {
                    let observers = registry.resolve(&dirty);
                    tracing::debug!(
                        dirty = dirty.len(),
                        observers = observers.len(),
                        "transaction committed"
                    );
                    observers
                }
            }
        };

        self.notify(observers)?;
        Ok(output)
    }
}

/// Run `body` as a transaction on the calling thread's default runtime.
pub fn transaction<R, F>(body: F) -> Result<R, ReactiveError>
where
    F: FnOnce() -> R,
{
    Runtime::current().transaction(body)
}
