//! Error types for loading and scheduling operations.

use thiserror::Error;

/// Errors produced by the loading pipeline.
///
/// `Clone` so a single settlement can be fanned out to every waiter of a
/// deduplicated url.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Adapter-reported failure for a url.
    #[error("load failed for {url}: {reason}")]
    Failed {
        /// Url that failed to load.
        url: String,
        /// Adapter-supplied failure reason.
        reason: String,
    },
    /// Deadline elapsed before the adapter settled.
    #[error("load timed out for {url} after {timeout_ms}ms")]
    Timeout {
        /// Url whose attempt timed out.
        url: String,
        /// Deadline that was exceeded.
        timeout_ms: u64,
    },
    /// Descriptor names a resource kind with no registered adapter.
    /// Fatal immediately; never retried.
    #[error("no adapter registered for resource kind `{kind}`")]
    UnsupportedType {
        /// The unregistered kind, as its wire name.
        kind: String,
    },
    /// The scheduler was dropped while the load was still pending.
    #[error("load abandoned for {url}: scheduler shut down")]
    Abandoned {
        /// Url whose handle will never settle normally.
        url: String,
    },
    /// Invalid configuration rejected at build time.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
