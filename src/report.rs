//! Per-target results and the batch report.

use crate::error::FetchError;
use crate::target::Target;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of retrieving one target.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// The body was fully drained.
    Success {
        target: Target,
        elapsed: Duration,
        bytes: u64,
        /// HTTP status code of the response
        status: u16,
    },
    /// The retrieval failed; `elapsed` is absent when it never started.
    Failure {
        target: Target,
        elapsed: Option<Duration>,
        error: FetchError,
    },
}

impl FetchResult {
    pub fn target(&self) -> &Target {
        match self {
            FetchResult::Success { target, .. } | FetchResult::Failure { target, .. } => target,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            FetchResult::Success { elapsed, .. } => Some(*elapsed),
            FetchResult::Failure { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// Body size for a success, `None` for a failure.
    pub fn bytes(&self) -> Option<u64> {
        match self {
            FetchResult::Success { bytes, .. } => Some(*bytes),
            FetchResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { error, .. } => Some(error),
        }
    }
}

/// Results of one batch, in completion order, plus total elapsed time.
#[derive(Debug, Clone)]
pub struct Report {
    results: Vec<FetchResult>,
    elapsed: Duration,
    started_at: DateTime<Utc>,
}

impl Report {
    pub(crate) fn new(
        results: Vec<FetchResult>,
        elapsed: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Report {
            results,
            elapsed,
            started_at,
        }
    }

    /// Results in the order they completed, not the order submitted.
    pub fn results(&self) -> &[FetchResult] {
        &self.results
    }

    /// Wall-clock time from batch start to the last result collected.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Sum of body sizes over all successes.
    pub fn total_bytes(&self) -> u64 {
        self.results.iter().filter_map(FetchResult::bytes).sum()
    }

    /// Find the result for a target, if one was collected.
    pub fn get(&self, target: &str) -> Option<&FetchResult> {
        self.results.iter().find(|r| r.target().as_str() == target)
    }
}
