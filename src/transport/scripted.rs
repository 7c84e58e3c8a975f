//! In-memory transport with per-target scripted behaviour.

use super::{Body, Response, Transport};
use crate::error::FetchError;
use crate::target::Target;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CHUNK_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub enum Script {
    /// Respond after `delay` with a body of `len` bytes.
    Body { delay: Duration, len: usize },
    /// Fail to connect after `delay`.
    Refuse { delay: Duration },
    /// Respond, then fail after `after` body bytes.
    BodyError { after: usize },
    /// Panic inside the retrieval.
    Panic,
}

#[derive(Default)]
pub struct ScriptedTransport {
    scripts: HashMap<String, Script>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, target: &str, delay_ms: u64, len: usize) -> Self {
        self.scripts.insert(
            target.to_string(),
            Script::Body {
                delay: Duration::from_millis(delay_ms),
                len,
            },
        );
        self
    }

    pub fn refuse(mut self, target: &str, delay_ms: u64) -> Self {
        self.scripts.insert(
            target.to_string(),
            Script::Refuse {
                delay: Duration::from_millis(delay_ms),
            },
        );
        self
    }

    pub fn script(mut self, target: &str, script: Script) -> Self {
        self.scripts.insert(target.to_string(), script);
        self
    }

    /// Highest number of retrievals observed in progress at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, target: &Target) -> Result<Response, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));

        let script = self
            .scripts
            .get(target.as_str())
            .cloned()
            .unwrap_or(Script::Refuse {
                delay: Duration::ZERO,
            });

        match script {
            Script::Body { delay, len } => {
                tokio::time::sleep(delay).await;
                Ok(Response {
                    status: 200,
                    body: Box::new(ScriptedBody {
                        remaining: len,
                        fail_after: None,
                        _guard: guard,
                    }),
                })
            }
            Script::Refuse { delay } => {
                tokio::time::sleep(delay).await;
                Err(FetchError::Transport(format!(
                    "dial {}: connection refused",
                    target
                )))
            }
            Script::BodyError { after } => Ok(Response {
                status: 200,
                body: Box::new(ScriptedBody {
                    remaining: usize::MAX,
                    fail_after: Some(after),
                    _guard: guard,
                }),
            }),
            Script::Panic => panic!("scripted panic for {target}"),
        }
    }
}

struct ScriptedBody {
    remaining: usize,
    fail_after: Option<usize>,
    _guard: InFlight,
}

#[async_trait]
impl Body for ScriptedBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        if let Some(after) = self.fail_after {
            if after == 0 {
                return Err(FetchError::BodyRead("connection reset".into()));
            }
            let n = after.min(CHUNK_SIZE);
            self.fail_after = Some(after - n);
            return Ok(Some(Bytes::from(vec![0u8; n])));
        }
        if self.remaining == 0 {
            return Ok(None);
        }
        let n = self.remaining.min(CHUNK_SIZE);
        self.remaining -= n;
        Ok(Some(Bytes::from(vec![0u8; n])))
    }
}
