//! Retrieval targets.

use std::fmt;
use std::sync::Arc;

/// Scheme prefixed to targets that carry none.
pub const DEFAULT_SCHEME: &str = "http://";

/// An immutable retrieval identifier, usually a URL.
///
/// Cloning is cheap; every result for a target shares the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Arc<str>);

impl Target {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Target(id.into())
    }

    /// Build a target, prefixing `scheme` when the input has neither
    /// `http://` nor `https://`.
    pub fn with_default_scheme(id: &str, scheme: &str) -> Self {
        let id = id.trim();
        if has_http_scheme(id) {
            Target::new(id)
        } else {
            Target::new(format!("{scheme}{id}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_http_scheme(id: &str) -> bool {
    let lower = id.get(..8).unwrap_or(id).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::new(id)
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::new(id)
    }
}
