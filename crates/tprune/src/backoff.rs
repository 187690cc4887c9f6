//! Rate-limit backoff
//!
//! When the platform answers with HTTP 429 it tells us, in seconds, how long
//! until the quota resets. We sleep exactly that long; the wait always comes
//! from the server hint, never from a local schedule.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Response header carrying the seconds until the rate-limit window resets
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Default number of consecutive rate-limited attempts tolerated per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A rate-limited response, as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// Raw value of the reset header, if the response had one
    pub reset: Option<String>,
}

impl RateLimit {
    pub fn new(reset: Option<String>) -> Self {
        Self { reset }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reset {
            Some(reset) => write!(f, "rate limited (reset in {reset}s)"),
            None => f.write_str("rate limited"),
        }
    }
}

/// Reset hint errors. Any of these makes the run fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackoffError {
    #[error("missing X-Rate-Limit-Reset header")]
    MissingReset,
    #[error("invalid X-Rate-Limit-Reset header value {0:?}")]
    InvalidReset(String),
}

/// What to do after sleeping off a rate limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitMode {
    /// Re-issue the same request after the reset window
    #[default]
    Retry,
    /// Sleep once, then give up on the request that was rate limited
    Stop,
}

impl FromStr for RateLimitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retry" => Ok(RateLimitMode::Retry),
            "stop" => Ok(RateLimitMode::Stop),
            other => Err(format!("Unknown rate-limit mode: {other}. Use retry or stop.")),
        }
    }
}

/// How a fetcher or destroyer reacts to rate limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub mode: RateLimitMode,
    /// Rate-limited attempts tolerated for one request in `Retry` mode
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            mode: RateLimitMode::Retry,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BackoffPolicy {
    /// Whether another attempt should follow the `attempt`-th rate limit (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.mode == RateLimitMode::Retry && attempt <= self.max_retries
    }
}

/// Parse a reset hint into the duration to wait.
pub fn reset_delay(raw: Option<&str>) -> Result<Duration, BackoffError> {
    let raw = raw.ok_or(BackoffError::MissingReset)?;
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| BackoffError::InvalidReset(raw.to_string()))
}

/// Sleep for the reset window announced by a rate-limited response.
///
/// Returns the time slept.
pub async fn back_off(limit: &RateLimit) -> Result<Duration, BackoffError> {
    let delay = reset_delay(limit.reset.as_deref())?;
    warn!(reset_secs = delay.as_secs(), "Rate limited, backing off");
    tokio::time::sleep(delay).await;
    Ok(delay)
}
