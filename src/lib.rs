//! fetchall: fetch URLs concurrently and report their times and sizes
//!
//! Each target is retrieved by its own task; results are collected over a
//! channel in the order they complete, followed by the total elapsed time.
//!
//! Features:
//! - Body drained and counted chunk by chunk, never buffered whole
//! - Per-target failures reported inline, never aborting the batch
//! - Optional per-request timeout, concurrency limit and cancellation
//! - Pluggable transport (reqwest-backed HTTP by default)
//! - Configuration via CLI arguments or TOML file

pub mod config;
pub mod coordinator;
pub mod error;
pub mod output;
pub mod report;
pub mod target;
pub mod transport;

#[cfg(test)]
mod fixture;

pub use coordinator::{BatchOptions, Coordinator};
pub use error::{BatchError, FetchError};
pub use report::{FetchResult, Report};
pub use target::Target;
pub use transport::{HttpTransport, Transport};
