//! Paginated fetcher
//!
//! Walks one remote collection from the newest item downwards, one page of
//! up to [`PAGE_SIZE`] items per call. The fetcher keeps a single `max_id`
//! watermark and an explicit terminal state, so callers never have to read
//! side-channel fields to tell "done" from "failed".

use tracing::{debug, warn};

use crate::backoff::{BackoffPolicy, RateLimitMode, back_off};
use crate::client::{ApiError, Remote};
use crate::error::{PruneError, Result};
use crate::item::{Account, Item, ResourceKind};

/// Items requested per page
pub const PAGE_SIZE: u32 = 200;

/// Collection a fetcher walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The account's own timeline
    Timeline { screen_name: String },
    /// The account's favorites
    Favorites { user_id: i64 },
}

impl Source {
    pub fn for_account(kind: ResourceKind, account: &Account) -> Self {
        match kind {
            ResourceKind::Posts => Source::Timeline {
                screen_name: account.screen_name.clone(),
            },
            ResourceKind::Favorites => Source::Favorites {
                user_id: account.id,
            },
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Source::Timeline { .. } => ResourceKind::Posts,
            Source::Favorites { .. } => ResourceKind::Favorites,
        }
    }
}

/// Where a fetcher is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// More pages may exist
    Active,
    /// Walked to the end, or gave up after a rate limit in `Stop` mode
    Exhausted,
    /// A fatal error was returned; no further requests are made
    Failed,
}

/// Lazy, page-at-a-time walk over one collection
pub struct Fetcher<'a> {
    remote: &'a dyn Remote,
    source: Source,
    backoff: BackoffPolicy,
    /// `None` until the first page; then the highest id the next page may hold
    cursor: Option<i64>,
    state: FetchState,
}

impl<'a> Fetcher<'a> {
    pub fn new(remote: &'a dyn Remote, source: Source, backoff: BackoffPolicy) -> Self {
        Self {
            remote,
            source,
            backoff,
            cursor: None,
            state: FetchState::Active,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.source.kind()
    }

    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Fetch the next page.
    ///
    /// `Ok(Some(items))` carries a non-empty page. `Ok(None)` means the walk
    /// is over without error. An `Err` is fatal for the run and moves the
    /// fetcher to [`FetchState::Failed`]; later calls return `Ok(None)`.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Item>>> {
        if self.state != FetchState::Active {
            return Ok(None);
        }

        let kind = self.kind();
        let mut attempts = 0;

        loop {
            match self.request().await {
                Ok(items) if items.is_empty() => {
                    debug!(%kind, cursor = ?self.cursor, "No more items");
                    self.state = FetchState::Exhausted;
                    return Ok(None);
                }
                Ok(items) => {
                    debug!(%kind, count = items.len(), cursor = ?self.cursor, "Fetched page");
                    self.advance(&items);
                    return Ok(Some(items));
                }
                Err(ApiError::RateLimited(limit)) => {
                    attempts += 1;
                    if let Err(e) = back_off(&limit).await {
                        self.state = FetchState::Failed;
                        return Err(e.into());
                    }
                    if self.backoff.should_retry(attempts) {
                        debug!(%kind, attempts, "Retrying page after backoff");
                        continue;
                    }
                    if self.backoff.mode == RateLimitMode::Stop {
                        warn!(%kind, cursor = ?self.cursor, "Stopping after rate limit");
                        self.state = FetchState::Exhausted;
                        return Ok(None);
                    }
                    self.state = FetchState::Failed;
                    return Err(PruneError::RateLimited {
                        action: format!("fetching {kind}"),
                        attempts,
                    });
                }
                Err(source) => {
                    self.state = FetchState::Failed;
                    return Err(PruneError::Fetch { kind, source });
                }
            }
        }
    }

    async fn request(&self) -> std::result::Result<Vec<Item>, ApiError> {
        match &self.source {
            Source::Timeline { screen_name } => {
                self.remote
                    .user_timeline(screen_name, self.cursor, PAGE_SIZE)
                    .await
            }
            Source::Favorites { user_id } => {
                self.remote
                    .favorites(*user_id, self.cursor, PAGE_SIZE)
                    .await
            }
        }
    }

    /// Move the watermark just below the oldest item of a non-empty page.
    ///
    /// Ids are positive, so a next cursor at or below zero means nothing older
    /// exists; a cursor that fails to move down means the server ignored it.
    fn advance(&mut self, items: &[Item]) {
        let Some(min) = items.iter().map(|i| i.id).min() else {
            return;
        };

        match min.checked_sub(1) {
            Some(next) if next > 0 && self.cursor.is_none_or(|c| next < c) => {
                self.cursor = Some(next);
            }
            next => {
                warn!(kind = %self.kind(), min, ?next, cursor = ?self.cursor,
                    "Cursor cannot move further down, ending walk");
                self.state = FetchState::Exhausted;
            }
        }
    }
}
