//! Error taxonomy for the GitHub client.

use thiserror::Error;

/// Errors raised while talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Non-retryable HTTP status. Aborts the collection run.
    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The retry ceiling was reached while the rate limit was still exhausted.
    #[error("GitHub rate limit still exhausted after {attempts} retries")]
    RateLimitExhausted { attempts: u32 },

    /// Network-level failure (connect, timeout, TLS).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not match the expected payload.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl GithubError {
    /// Whether the error came from an exhausted rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GithubError::RateLimitExhausted { .. })
    }
}
