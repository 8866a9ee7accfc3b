//! Reactive Context
//!
//! The reactive context tracks which observer is currently running.
//! This enables automatic dependency tracking: when an atom is read,
//! the runtime registers the observer on top of the stack as a dependent.
//!
//! # Implementation
//!
//! Each runtime owns an [`ObserverStack`]. Entering an observer pushes it,
//! and the returned [`ObserverFrame`] guard pops it when dropped, so the
//! stack stays balanced even if the observer panics.
//!
//! This design supports nested contexts (an autorun created inside another
//! observer, or an observer re-run by a write made from another observer).

use smallvec::SmallVec;

use super::observer::{Observer, ObserverId};
use super::runtime::Runtime;

/// LIFO stack of currently executing observers.
///
/// Reactive nesting is rarely deep, so the first few frames live inline.
#[derive(Debug, Default)]
pub struct ObserverStack {
    frames: SmallVec<[Observer; 8]>,
}

impl ObserverStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an observer, making it the current reader.
    pub fn push(&mut self, observer: Observer) {
        self.frames.push(observer);
    }

    /// Pop the current reader.
    pub fn pop(&mut self) -> Option<Observer> {
        self.frames.pop()
    }

    /// The current reader, if any observer is running.
    pub fn top(&self) -> Option<&Observer> {
        self.frames.last()
    }

    /// Check if any observer is running.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Guard that pops the observer stack when dropped.
///
/// This ensures the stack is properly maintained even if the observer
/// panics.
pub(crate) struct ObserverFrame<'rt> {
    runtime: &'rt Runtime,
    observer_id: ObserverId,
}

impl<'rt> ObserverFrame<'rt> {
    /// Push `observer` onto the runtime's stack for the lifetime of the guard.
    pub(crate) fn enter(runtime: &'rt Runtime, observer: Observer) -> Self {
        let observer_id = observer.id();
        runtime.state().borrow_mut().observers.push(observer);
        Self {
            runtime,
            observer_id,
        }
    }
}

impl Drop for ObserverFrame<'_> {
    fn drop(&mut self) {
        let popped = self.runtime.state().borrow_mut().observers.pop();

        // Every push is owned by a frame, so a mismatch means the stack was
        // corrupted from inside the crate.
        let popped_id = popped.as_ref().map(Observer::id);
        if popped_id != Some(self.observer_id) {
            tracing::error!(
                expected = %self.observer_id,
                actual = ?popped_id,
                "observer stack discipline violated"
            );
        }
        debug_assert_eq!(
            popped_id,
            Some(self.observer_id),
            "ObserverFrame mismatch: expected {:?}, got {:?}",
            self.observer_id,
            popped_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn stack_tracks_top() {
        let mut stack = ObserverStack::new();
        assert!(stack.is_empty());
        assert!(stack.top().is_none());

        let outer = Observer::new(|| {});
        let inner = Observer::new(|| {});

        stack.push(outer.clone());
        stack.push(inner.clone());
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top(), Some(&inner));

        assert_eq!(stack.pop(), Some(inner));
        assert_eq!(stack.top(), Some(&outer));
        assert_eq!(stack.pop(), Some(outer));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn frame_pops_on_drop() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let observer = Observer::new(|| {});

        {
            let _frame = ObserverFrame::enter(&runtime, observer.clone());
            assert_eq!(runtime.current_observer(), Some(observer.id()));
        }

        assert!(runtime.current_observer().is_none());
    }

    #[test]
    fn nested_frames() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let outer = Observer::new(|| {});
        let inner = Observer::new(|| {});

        {
            let _outer = ObserverFrame::enter(&runtime, outer.clone());
            {
                let _inner = ObserverFrame::enter(&runtime, inner.clone());
                assert_eq!(runtime.current_observer(), Some(inner.id()));
            }
            assert_eq!(runtime.current_observer(), Some(outer.id()));
        }

        assert!(runtime.current_observer().is_none());
    }

    #[test]
    fn frame_pops_when_body_panics() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let observer = Observer::new(|| {});

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _frame = ObserverFrame::enter(&runtime, observer.clone());
            panic!("boom");
        }));

        assert!(result.is_err());
        assert!(runtime.current_observer().is_none());
    }
}
