//! Error types for tprune

use thiserror::Error;

use crate::backoff::BackoffError;
use crate::client::ApiError;
use crate::item::ResourceKind;

/// Main error type for a pruning run.
///
/// Every variant is fatal: a run either completes its sweeps or stops at the
/// first one of these.
#[derive(Error, Debug)]
pub enum PruneError {
    /// Configuration errors, detected before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// The account behind the credentials could not be resolved
    #[error("failed to verify credentials: {0}")]
    Verify(#[source] ApiError),

    /// Listing a page of items failed
    #[error("failed to fetch {kind}: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: ApiError,
    },

    /// Deleting a single item failed
    #[error("failed to delete {kind} {id}: {source}")]
    Delete {
        kind: ResourceKind,
        id: i64,
        #[source]
        source: ApiError,
    },

    /// The rate-limit reset hint could not be used
    #[error("failed to back off: {0}")]
    Backoff(#[from] BackoffError),

    /// Gave up on a request that stayed rate limited
    #[error("rate limited while {action} after {attempts} attempt(s)")]
    RateLimited { action: String, attempts: u32 },

    /// An item carried a creation timestamp that could not be parsed
    #[error("failed to parse created_at {value:?} of item {id}: {source}")]
    Timestamp {
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Result type alias for tprune operations
pub type Result<T> = std::result::Result<T, PruneError>;
