//! Crawl error taxonomy.
//!
//! Fetcher and protocol layers return these as typed outcomes; the scheduler
//! maps each variant to a requeue/drop/escalate decision.

use thiserror::Error;

/// Errors that can occur while fetching or parsing a resource.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transient network failure. Retryable with backoff.
    #[error("network error: {0}")]
    TransientNetwork(#[from] reqwest::Error),

    /// The site served an HTML challenge page in place of JSON.
    /// Retryable, but with aggressive backoff, and counted toward the
    /// systemic failure threshold.
    #[error("rate limited: challenge page served instead of JSON")]
    RateLimited,

    /// Unexpected HTTP status from a resource endpoint.
    #[error("HTTP error {0}")]
    Http(u16),

    /// Terminal for this resource (deleted or private video). Never retried
    /// and not counted as a systemic failure.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The document did not have the expected shape. The offending item is
    /// skipped and the stream continues.
    #[error("protocol mismatch for {resource_id}: {detail}")]
    ProtocolMismatch { resource_id: String, detail: String },

    /// The result store rejected a batch write.
    #[error("result store error: {0}")]
    Store(String),

    /// Bad caller input (malformed resource ID, missing session, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CrawlError {
    /// Shorthand for a protocol mismatch on a given resource.
    pub fn mismatch(resource_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            resource_id: resource_id.into(),
            detail: detail.into(),
        }
    }

    /// Whether the scheduler may requeue a job that failed with this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransientNetwork(_) | Self::RateLimited => true,
            Self::Http(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this failure should count toward the systemic
    /// failure-threshold window in the batch sink.
    pub fn is_systemic(&self) -> bool {
        match self {
            Self::RateLimited | Self::TransientNetwork(_) => true,
            Self::Http(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
