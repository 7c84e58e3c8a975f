//! Fetch coordinator.
//!
//! Runs one unit of work per target in a `JoinSet` and fans their results
//! back in as the tasks finish:
//! - Each unit times its own retrieval and drains the body, counting bytes
//! - Results are collected in completion order, one per target
//! - A failing or panicking target becomes a failure result; it never
//!   aborts the batch
//! - Optional per-retrieval timeout, concurrency limit and cancellation

use crate::error::{BatchError, FetchError};
use crate::report::{FetchResult, Report};
use crate::target::Target;
use crate::transport::{drain, Transport};
use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

/// Knobs applied to every retrieval in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Deadline for a single retrieval, covering connect and body drain.
    /// `None` leaves timing to the transport.
    pub timeout: Option<Duration>,
    /// Maximum retrievals in progress at once (`None` = unbounded, 0 is
    /// treated as 1).
    pub max_concurrency: Option<usize>,
}

/// Retrieves batches of targets concurrently over a transport.
pub struct Coordinator<T: Transport> {
    transport: Arc<T>,
    options: BatchOptions,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, BatchOptions::default())
    }

    pub fn with_options(transport: T, options: BatchOptions) -> Self {
        Coordinator {
            transport: Arc::new(transport),
            options,
        }
    }

    /// Retrieve every target and return the completed report.
    pub async fn run_batch<I>(&self, targets: I) -> Result<Report, BatchError>
    where
        I: IntoIterator,
        I::Item: Into<Target>,
    {
        self.run_batch_with_cancel(targets, CancellationToken::new())
            .await
    }

    /// Like `run_batch`, but stops early once `cancel` fires.
    ///
    /// Units still waiting or in flight at cancellation report
    /// `FetchError::Cancelled`, so the report still holds one result per
    /// target.
    pub async fn run_batch_with_cancel<I>(
        &self,
        targets: I,
        cancel: CancellationToken,
    ) -> Result<Report, BatchError>
    where
        I: IntoIterator,
        I::Item: Into<Target>,
    {
        self.run_batch_observed(targets, cancel, |_| {}).await
    }

    /// Like `run_batch_with_cancel`, calling `on_result` for each result as
    /// it is collected, before the report is finalised.
    pub async fn run_batch_observed<I, F>(
        &self,
        targets: I,
        cancel: CancellationToken,
        mut on_result: F,
    ) -> Result<Report, BatchError>
    where
        I: IntoIterator,
        I::Item: Into<Target>,
        F: FnMut(&FetchResult),
    {
        let targets: Vec<Target> = targets.into_iter().map(Into::into).collect();
        let expected = targets.len();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            targets = expected,
            timeout_ms = self.options.timeout.map(|t| t.as_millis() as u64),
            max_concurrency = self.options.max_concurrency,
            "Starting batch"
        );

        if expected == 0 {
            return Ok(Report::new(Vec::new(), start.elapsed(), started_at));
        }

        let limit = self
            .options
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut units = JoinSet::new();
        let mut pending: HashMap<Id, Target> = HashMap::with_capacity(expected);

        for target in targets {
            let transport = Arc::clone(&self.transport);
            let limit = limit.clone();
            let cancel = cancel.clone();
            let timeout = self.options.timeout;
            let unit_target = target.clone();

            let handle = units.spawn(async move {
                run_unit(transport.as_ref(), unit_target, limit, timeout, &cancel).await
            });
            pending.insert(handle.id(), target);
        }

        let mut results = Vec::with_capacity(expected);
        while let Some(joined) = units.join_next_with_id().await {
            let result = match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    result
                }
                Err(err) => match pending.remove(&err.id()) {
                    Some(target) => lost_unit(target, err),
                    None => continue,
                },
            };

            match &result {
                FetchResult::Success {
                    target,
                    elapsed,
                    bytes,
                    status,
                } => {
                    debug!(
                        url = %target,
                        status,
                        bytes,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Fetched"
                    );
                }
                FetchResult::Failure { target, error, .. } => {
                    debug!(url = %target, error = %error, "Fetch failed");
                }
            }
            on_result(&result);
            results.push(result);
        }

        let elapsed = start.elapsed();
        if results.len() != expected {
            error!(
                expected,
                received = results.len(),
                "Unit result could not be attributed to a target"
            );
            return Err(BatchError::Incomplete {
                expected,
                received: results.len(),
            });
        }

        info!(
            results = results.len(),
            failures = results.iter().filter(|r| !r.is_success()).count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );

        Ok(Report::new(results, elapsed, started_at))
    }
}

/// Failure result for a unit whose task ended without returning.
fn lost_unit(target: Target, err: JoinError) -> FetchResult {
    let error = if err.is_panic() {
        FetchError::Panicked(panic_message(err.into_panic()))
    } else {
        FetchError::Cancelled
    };
    error!(url = %target, error = %error, "Unit did not complete");

    FetchResult::Failure {
        target,
        elapsed: None,
        error,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One target's unit of work: wait for a slot, retrieve, time it.
async fn run_unit<T: Transport>(
    transport: &T,
    target: Target,
    limit: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> FetchResult {
    let _permit = match limit {
        Some(limit) => tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return FetchResult::Failure {
                    target,
                    elapsed: None,
                    error: FetchError::Cancelled,
                };
            }
            permit = limit.acquire_owned() => permit.ok(),
        },
        None => None,
    };

    trace!(url = %target, "Retrieval started");
    let start = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        outcome = retrieve(transport, &target, timeout) => outcome,
    };
    let elapsed = start.elapsed();

    match outcome {
        Ok((status, bytes)) => FetchResult::Success {
            target,
            elapsed,
            bytes,
            status,
        },
        Err(error) => FetchResult::Failure {
            target,
            elapsed: Some(elapsed),
            error,
        },
    }
}

/// Open the target and drain its body, under the optional deadline.
async fn retrieve<T: Transport>(
    transport: &T,
    target: &Target,
    timeout: Option<Duration>,
) -> Result<(u16, u64), FetchError> {
    let fetch = async {
        let mut response = transport.open(target).await?;
        let bytes = drain(response.body.as_mut()).await?;
        Ok::<_, FetchError>((response.status, bytes))
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| FetchError::Timeout(limit))?,
        None => fetch.await,
    }
}
