//! Autorun
//!
//! An autorun is a side-effecting observer that runs once immediately and
//! then again whenever an atom it read changes.
//!
//! # How Autoruns Work
//!
//! 1. The function is wrapped in an [`Observer`] with a fresh identity.
//!
//! 2. The observer is pushed onto the observer stack and run, so every atom
//!    it reads records it as a subscriber.
//!
//! 3. Later writes to those atoms re-run it the same way.
//!
//! There is no disposer: an autorun stays subscribed for as long as the
//! runtime keeps its edges (see [`Runtime::reset`]).

use crate::error::ReactiveError;

use super::observer::{Observer, ObserverId};
use super::runtime::Runtime;

impl Runtime {
    /// Run `effect` now and re-run it whenever an atom it reads changes.
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
    /// count.set(1)?;
    /// count.set(2)?;
    /// assert_eq!(*log.borrow(), vec![0, 1, 2]);
    /// # Ok::<(), reflux_core::ReactiveError>(())
    /// ```
    pub fn autorun<F>(&self, effect: F) -> Result<ObserverId, ReactiveError>
    where
        F: Fn() + 'static,
    {
        let observer = Observer::new(effect);
        self.autorun_observer(&observer)?;
        Ok(observer.id())
    }

    /// Run an existing observer as an autorun.
    ///
    /// Because observers are identified by [`ObserverId`], running the same
    /// observer twice does not create duplicate subscriptions.
    pub fn autorun_observer(&self, observer: &Observer) -> Result<(), ReactiveError> {
        tracing::debug!(observer = %observer.id(), "autorun started");
        self.run_observer(observer)
    }
}

/// Run `effect` as an autorun on the calling thread's default runtime.
pub fn autorun<F>(effect: F) -> Result<ObserverId, ReactiveError>
where
    F: Fn() + 'static,
{
    Runtime::current().autorun(effect)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn autorun_runs_on_creation() {
        let rt = Runtime::default();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        rt.autorun(move || run_count_clone.set(run_count_clone.get() + 1)).unwrap();

        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn autorun_without_reads_is_never_rerun() {
        let rt = Runtime::default();
        let atom = rt.atom(0);
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        rt.autorun(move || run_count_clone.set(run_count_clone.get() + 1)).unwrap();
        atom.set(1).unwrap();
        atom.set(2).unwrap();

        assert_eq!(run_count.get(), 1);
        assert_eq!(rt.stats().edges, 0);
    }

    #[test]
    fn autorun_reruns_on_each_write() {
        let rt = Runtime::default();
        let atom = rt.atom(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (reader, sink) = (atom.clone(), log.clone());
        rt.autorun(move || sink.borrow_mut().push(reader.get())).unwrap();

        atom.set(1).unwrap();
        atom.set(2).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn identical_write_still_notifies() {
        let rt = Runtime::default();
        let atom = rt.atom(5);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (reader, sink) = (atom.clone(), log.clone());
        rt.autorun(move || sink.borrow_mut().push(reader.get())).unwrap();

        atom.set(5).unwrap();
        assert_eq!(*log.borrow(), vec![5, 5]);
    }

    #[test]
    fn same_observer_subscribes_once() {
        let rt = Runtime::default();
        let atom = rt.atom(0);
        let run_count = Rc::new(Cell::new(0));

        let (reader, runs) = (atom.clone(), run_count.clone());
        let observer = Observer::new(move || {
            reader.get();
            runs.set(runs.get() + 1);
        });
        rt.autorun_observer(&observer).unwrap();
        rt.autorun_observer(&observer).unwrap();
        assert_eq!(run_count.get(), 2);
        assert_eq!(atom.subscriber_count(), 1);

        atom.set(1).unwrap();
        assert_eq!(run_count.get(), 3);
    }

    #[test]
    fn panicking_first_run_is_reported() {
        let rt = Runtime::default();
        let err = rt.autorun(|| panic!("broken")).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(!rt.is_tracking());
    }

    #[test]
    fn nested_autorun_tracks_its_own_reads() {
        let rt = Runtime::default();
        let outer_atom = rt.atom(0);
        let inner_atom = rt.atom(0);
        let created = Rc::new(Cell::new(false));

        let (rt_inner, outer_reader, inner_reader, flag) = (
            rt.clone(),
            outer_atom.clone(),
            inner_atom.clone(),
            created.clone(),
        );
        rt.autorun(move || {
            outer_reader.get();
            if !flag.get() {
                flag.set(true);
                let reader = inner_reader.clone();
                rt_inner
                    .autorun(move || {
                        reader.get();
                    })
                    .unwrap();
            }
        })
        .unwrap();

        assert_eq!(outer_atom.subscriber_count(), 1);
        assert_eq!(inner_atom.subscriber_count(), 1);
        assert!(!rt.is_tracking());
    }

    #[test]
    fn free_function_uses_thread_runtime() {
        let atom = crate::reactive::atom(1);
        let seen = Rc::new(Cell::new(0));

        let (reader, sink) = (atom.clone(), seen.clone());
        autorun(move || sink.set(reader.get())).unwrap();
        atom.set(9).unwrap();

        assert_eq!(seen.get(), 9);
        assert!(atom.runtime().ptr_eq(&Runtime::current()));
    }
}
