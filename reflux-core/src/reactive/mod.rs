//! Reactive Primitives
//!
//! This module implements the reactive engine: atoms, autoruns and
//! transactions.
//!
//! # Concepts
//!
//! ## Atoms
//!
//! An Atom is a container for mutable state. When an atom is read while an
//! observer is running, the atom records that observer as a dependent. When
//! the atom is written, all dependents run again.
//!
//! ## Autoruns
//!
//! An autorun is an observer that runs once immediately, tracking every atom
//! it reads, and re-runs whenever one of them changes.
//!
//! ## Transactions
//!
//! A transaction batches writes. Observers of atoms written inside the
//! transaction run once, after its body returns.
//!
//! # Implementation Notes
//!
//! Each [`Runtime`] keeps a stack of running observers. Reading an atom
//! checks the top of that stack, so dependencies are discovered without the
//! caller passing any context around.
//!
//! Edges are additive: an observer stays subscribed to every atom it ever
//! read unless the runtime is configured to prune stale edges.

mod atom;
mod autorun;
mod context;
mod observer;
mod registry;
mod runtime;
mod transaction;

pub use atom::{Atom, AtomId};
pub use autorun::autorun;
pub use context::ObserverStack;
pub use observer::{Observer, ObserverId};
pub use registry::DependencyRegistry;
pub use runtime::{atom, Runtime, RuntimeStats};
pub use transaction::transaction;
