//! Error types for fetching and batch coordination.
//!
//! Per-target failures (`FetchError`) never abort a batch: they are folded
//! into the report as failure results. Only `BatchError` escapes
//! `Coordinator::run_batch`.

use std::time::Duration;
use thiserror::Error;

/// Why a single target could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure before a response was obtained.
    #[error("{0}")]
    Transport(String),

    /// Failure while draining the response body.
    #[error("while reading body: {0}")]
    BodyRead(String),

    /// The per-retrieval deadline elapsed.
    #[error("timed out after {:.2}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The batch was cancelled before this retrieval finished.
    #[error("cancelled")]
    Cancelled,

    /// The target could not be turned into a request.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The unit of work panicked before producing a result.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl FetchError {
    /// Short machine-readable kind, used by structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::BodyRead(_) => "body_read",
            FetchError::Timeout(_) => "timeout",
            FetchError::Cancelled => "cancelled",
            FetchError::InvalidTarget(_) => "invalid_target",
            FetchError::Panicked(_) => "panicked",
        }
    }
}

/// Batch-level failure: the report could not be completed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Fewer results were collected than targets submitted, i.e. a unit
    /// ended in a way that could not be attributed to its target.
    #[error("batch incomplete: expected {expected} results, received {received}")]
    Incomplete { expected: usize, received: usize },
}
