//! Reflux Core
//!
//! This crate provides the engine behind the Reflux reactive state library.
//! It implements:
//!
//! - Atoms: mutable cells that record who reads them
//! - Autoruns: functions that re-run when the atoms they read change
//! - Transactions: scopes that batch writes into one deduplicated
//!   notification pass
//!
//! # Architecture
//!
//! - `reactive`: atoms, observers, the dependency registry and the runtime
//! - `config`: runtime configuration
//! - `error`: the crate's error type
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use reflux_core::{atom, autorun, transaction};
//!
//! let count = atom(0);
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let (reader, sink) = (count.clone(), log.clone());
//! autorun(move || sink.borrow_mut().push(reader.get()))?;
//!
//! count.set(1)?;
//! transaction(|| -> Result<(), reflux_core::ReactiveError> {
//!     count.set(2)?;
//!     count.set(3)
//! })??;
//!
//! assert_eq!(*log.borrow(), vec![0, 1, 3]);
//! # Ok::<(), reflux_core::ReactiveError>(())
//! ```

pub mod config;
pub mod error;
pub mod reactive;

pub use config::{FailurePolicy, NestingPolicy, RuntimeConfig};
pub use error::ReactiveError;
pub use reactive::{
    atom, autorun, transaction, Atom, AtomId, Observer, ObserverId, Runtime, RuntimeStats,
};
