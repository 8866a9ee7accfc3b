//! Error types for the reactive engine.
//!
//! Observers are plain closures, so the only way one can fail is by
//! panicking. The runtime catches each panic at the observer boundary and
//! turns it into a [`ReactiveError`], which is returned from the `set`,
//! `autorun` or `transaction` call that triggered the run.

use thiserror::Error;

use crate::reactive::ObserverId;

/// All errors produced by the reactive engine.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// An observer panicked while running.
    #[error("observer {observer} panicked: {message}")]
    ObserverPanicked {
        /// The observer that panicked
        observer: ObserverId,
        /// The panic payload, if it was a string
        message: String,
    },

    /// Running an observer would nest deeper than the configured limit.
    ///
    /// This usually means an observer writes an atom it also reads.
    #[error("observer {observer} would exceed the maximum nesting depth of {limit}")]
    DepthExceeded {
        /// The observer that was not run
        observer: ObserverId,
        /// The configured limit
        limit: usize,
    },

    /// Several observers failed during one notification pass.
    #[error("{} observers failed during notification", .0.len())]
    Aggregate(Vec<ReactiveError>),

    /// `reset` was called while an observer or transaction was running.
    #[error(
        "cannot reset runtime while {observers} observer(s) and {transactions} transaction(s) \
         are active"
    )]
    ResetWhileActive {
        /// Observer stack depth at the time of the call
        observers: usize,
        /// Transaction stack depth at the time of the call
        transactions: usize,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    /// Fold the failures of one notification pass into a single result.
    pub(crate) fn collect(mut failures: Vec<ReactiveError>) -> Result<(), ReactiveError> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(ReactiveError::Aggregate(failures)),
        }
    }

    /// Every individual failure contained in this error.
    ///
    /// Aggregates are flattened; any other variant yields itself.
    pub fn failures(&self) -> Vec<&ReactiveError> {
        match self {
            ReactiveError::Aggregate(inner) => inner.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panicked(message: &str) -> ReactiveError {
        ReactiveError::ObserverPanicked {
            observer: ObserverId::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn collect_empty_is_ok() {
        assert!(ReactiveError::collect(Vec::new()).is_ok());
    }

    #[test]
    fn collect_single_is_unwrapped() {
        let err = ReactiveError::collect(vec![panicked("one")]).unwrap_err();
        assert!(matches!(err, ReactiveError::ObserverPanicked { .. }));
    }

    #[test]
    fn collect_many_aggregates() {
        let err = ReactiveError::collect(vec![panicked("a"), panicked("b")]).unwrap_err();
        assert_eq!(err.to_string(), "2 observers failed during notification");
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn failures_flattens_nested_aggregates() {
        let nested = ReactiveError::Aggregate(vec![
            panicked("a"),
            ReactiveError::Aggregate(vec![panicked("b"), panicked("c")]),
        ]);
        assert_eq!(nested.failures().len(), 3);
    }

    #[test]
    fn panic_message_is_displayed() {
        let err = panicked("boom");
        assert!(err.to_string().ends_with("panicked: boom"));
    }
}
