//! Rate-limit handling.
//!
//! Every response is assessed by [`assess`], a pure function of the status,
//! the headers and the current time. The collector acts on the result:
//! return the body, sleep and retry the same request, or fail.
//!
//! GitHub signals an exhausted primary rate limit with a 403 (or 429) and an
//! `x-ratelimit-reset` header holding the epoch second at which the window
//! resets. Secondary limits use `retry-after` instead.

use chrono::DateTime;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Epoch second at which the current rate-limit window resets.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Bounds on how long and how often a request is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive retries allowed for one request before giving up.
    pub max_retries: u32,
    /// First backoff step when the server gives no reset hint.
    pub base_backoff: Duration,
    /// Upper bound on any single wait.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_backoff: Duration::from_secs(2),
            max_wait: Duration::from_secs(3600),
        }
    }
}

impl From<&crate::config::RetryConfig> for RetryPolicy {
    fn from(config: &crate::config::RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_secs(config.base_backoff_seconds),
            max_wait: Duration::from_secs(config.max_wait_seconds),
        }
    }
}

/// What to do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// Success, parse the body.
    Proceed,
    /// Rate limited, sleep this long and retry the same request.
    Retry(Duration),
    /// Non-retryable failure.
    Fail,
}

/// Assess a response.
///
/// `attempt` is the 1-based number of the retry that would follow; it only
/// drives the exponential backoff used when no header says how long to wait.
pub fn assess(
    status: StatusCode,
    headers: &HeaderMap,
    now_epoch: i64,
    attempt: u32,
    policy: &RetryPolicy,
) -> Assessment {
    if status.is_success() {
        return Assessment::Proceed;
    }

    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return Assessment::Fail;
    }

    if let Some(reset) = header_i64(headers, RATE_LIMIT_RESET) {
        let secs = (reset - now_epoch).max(0) as u64 + 1;
        return Assessment::Retry(clamp(Duration::from_secs(secs), policy));
    }

    if let Some(secs) = retry_after(headers, now_epoch) {
        return Assessment::Retry(clamp(Duration::from_secs(secs), policy));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = policy.base_backoff.saturating_mul(1 << exponent);
        return Assessment::Retry(clamp(backoff, policy));
    }

    Assessment::Fail
}

fn clamp(wait: Duration, policy: &RetryPolicy) -> Duration {
    wait.min(policy.max_wait)
}

/// `retry-after` as delay-seconds or as an HTTP date.
fn retry_after(headers: &HeaderMap, now_epoch: i64) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(secs) = value.parse::<i64>() {
        return Some(secs.max(0) as u64);
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some((at.timestamp() - now_epoch).max(0) as u64)
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}
