//! Error types for the reconcile crate
//!
//! Probe absence is `Ok(None)` everywhere, never an error. The variants
//! here are the failure kinds that get recorded per device; none of them
//! aborts a reconciliation pass.

use thiserror::Error;

/// Errors that can occur while probing or mutating the registration store
#[derive(Error, Debug)]
pub enum Error {
    /// The device registration store could not be reached at all
    #[error("registration store unreachable: {0}")]
    Probe(String),

    /// An install/remove/configure call against the store failed
    #[error("{operation} failed for {target}: {detail}")]
    Mutation {
        operation: &'static str,
        target: String,
        detail: String,
    },

    /// A post-action re-probe did not observe the expected state
    #[error("device {device} not observed after {action}")]
    Verification {
        device: String,
        action: &'static str,
    },

    /// One or more settings failed while the rest were still applied
    #[error("{failed} of {total} settings failed for {device}; first: {first}")]
    PartialConfig {
        device: String,
        failed: usize,
        total: usize,
        first: String,
    },
}

impl Error {
    /// Shorthand for a mutation failure
    pub fn mutation(operation: &'static str, target: impl Into<String>, detail: impl ToString) -> Self {
        Self::Mutation {
            operation,
            target: target.into(),
            detail: detail.to_string(),
        }
    }
}

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, Error>;
