//! Retrieval transports.
//!
//! The coordinator only needs to open a GET against a target and pull the
//! body chunk by chunk. Implementations:
//! - `http`: reqwest-backed HTTP/HTTPS client
//! - `scripted`: in-memory transport with programmable delays (tests only)

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{HttpTransport, DEFAULT_USER_AGENT};

use crate::error::FetchError;
use crate::target::Target;
use async_trait::async_trait;
use bytes::Bytes;

/// An opened response whose body has not been read yet.
pub struct Response {
    pub status: u16,
    pub body: Box<dyn Body>,
}

/// Source of body chunks.
#[async_trait]
pub trait Body: Send {
    /// Next chunk of the body, or `None` once it is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError>;
}

/// Issues a retrieval against a target.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect and receive response headers. Failures here are
    /// `Transport` or `InvalidTarget` errors.
    async fn open(&self, target: &Target) -> Result<Response, FetchError>;
}

/// Read a body to the end, counting and discarding its bytes.
pub async fn drain(body: &mut dyn Body) -> Result<u64, FetchError> {
    let mut total = 0u64;
    while let Some(chunk) = body.next_chunk().await? {
        total += chunk.len() as u64;
    }
    Ok(total)
}
