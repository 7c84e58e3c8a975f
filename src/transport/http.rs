//! HTTP transport over reqwest.

use super::{Body, Response, Transport};
use crate::error::FetchError;
use crate::target::Target;
use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error as StdError;
use tracing::trace;

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("fetchall/", env!("CARGO_PKG_VERSION"));

/// HTTP/HTTPS transport backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, target: &Target) -> Result<Response, FetchError> {
        let url = reqwest::Url::parse(target.as_str())
            .map_err(|e| FetchError::InvalidTarget(format!("{}: {e}", target)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(describe(&e)))?;

        let status = response.status().as_u16();
        trace!(url = %target, status, "Response headers received");

        Ok(Response {
            status,
            body: Box::new(HttpBody(response)),
        })
    }
}

struct HttpBody(reqwest::Response);

#[async_trait]
impl Body for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        self.0
            .chunk()
            .await
            .map_err(|e| FetchError::BodyRead(describe(&e)))
    }
}

/// Render an error with its source chain, e.g.
/// `error sending request for url (...): client error (Connect): ...`.
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
