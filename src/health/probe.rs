//! Probe abstraction.
//!
//! # Responsibilities
//! - Ask one target whether it is alive
//! - Report failure as an error value, never a panic
//!
//! The monitor imposes the timeout from outside; implementations do not
//! need their own deadline.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Why a probe did not succeed. The monitor folds every variant into a
/// plain failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    #[error("probe panicked")]
    Panicked,
}

/// Result of a single probe as seen by the threshold policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure,
}

impl<E> From<&Result<(), E>> for ProbeOutcome {
    fn from(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Success,
            Err(_) => ProbeOutcome::Failure,
        }
    }
}

/// Liveness check against a single target.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &str) -> Result<(), ProbeError>;
}
