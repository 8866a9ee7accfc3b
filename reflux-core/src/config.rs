//! Runtime configuration.
//!
//! Every knob has a default that matches plain additive-edge semantics, so
//! `RuntimeConfig::default()` is what most callers want. Configs can also be
//! loaded from JSON; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ReactiveError;

/// How a transaction started inside another transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingPolicy {
    /// The inner transaction notifies its own observers when its body
    /// returns, even though the outer transaction is still active.
    #[default]
    Independent,

    /// The inner transaction hands its dirty atoms to the enclosing one;
    /// only the outermost commit notifies.
    Flatten,
}

/// What to do when an observer fails during a notification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Run every observer, then report all failures together.
    #[default]
    Aggregate,

    /// Stop at the first failing observer and report it.
    FailFast,
}

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Commit behavior of nested transactions.
    pub nesting: NestingPolicy,

    /// Failure handling during notification.
    pub failure_policy: FailurePolicy,

    /// Drop an observer's edges before each re-run so that only the atoms
    /// read on the latest run keep it subscribed.
    ///
    /// Off by default: edges are additive and a stale edge can re-run an
    /// observer for an atom it no longer reads.
    pub prune_stale_edges: bool,

    /// Maximum observer nesting depth before a run is refused.
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            nesting: NestingPolicy::default(),
            failure_policy: FailurePolicy::default(),
            prune_stale_edges: false,
            max_depth: 256,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ReactiveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the nested transaction policy.
    pub fn with_nesting(mut self, nesting: NestingPolicy) -> Self {
        self.nesting = nesting;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable pruning of stale edges on re-run.
    pub fn with_prune_stale_edges(mut self, prune: bool) -> Self {
        self.prune_stale_edges = prune;
        self
    }

    /// Set the maximum observer nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
