//! Test utilities for tprune - a scripted in-memory remote
//!
//! [`FakeRemote`] answers list calls from per-collection queues of scripted
//! pages (an empty queue answers with an empty page) and records every call
//! so tests can assert on cursors and deletions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::backoff::RateLimit;
use crate::client::{ApiError, Remote};
use crate::item::{Account, CREATED_AT_FORMAT, Item, ResourceKind};

/// A call observed by [`FakeRemote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VerifyCredentials,
    UserTimeline {
        screen_name: String,
        max_id: Option<i64>,
        count: u32,
    },
    Favorites {
        user_id: i64,
        max_id: Option<i64>,
        count: u32,
    },
    DestroyStatus(i64),
    DestroyFavorite(i64),
}

/// Generated page ids start just above this value
pub const GENERATED_ID_BASE: i64 = 1000;

type Scripted<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// Scripted [`Remote`] for unit and integration tests
#[derive(Debug)]
pub struct FakeRemote {
    account: Account,
    posts: Scripted<Vec<Item>>,
    favorites: Scripted<Vec<Item>>,
    deletes: Scripted<()>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRemote {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            posts: Mutex::new(VecDeque::new()),
            favorites: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a page answer for the given collection
    pub fn push_page(&self, kind: ResourceKind, page: Result<Vec<Item>, ApiError>) -> &Self {
        let queue = match kind {
            ResourceKind::Posts => &self.posts,
            ResourceKind::Favorites => &self.favorites,
        };
        queue.lock().expect("fake remote lock poisoned").push_back(page);
        self
    }

    /// Queue pages of the given sizes with descending ids, newest first.
    ///
    /// The oldest generated id is [`GENERATED_ID_BASE`] + 1.
    pub fn push_pages(&self, kind: ResourceKind, sizes: &[usize], created_at: DateTime<Utc>) {
        let mut next_id = GENERATED_ID_BASE + sizes.iter().sum::<usize>() as i64;
        for &size in sizes {
            let page = (0..size)
                .map(|_| {
                    let item = item_at(next_id, created_at, "generated");
                    next_id -= 1;
                    item
                })
                .collect();
            self.push_page(kind, Ok(page));
        }
    }

    /// Queue an answer for the next delete call; unscripted deletes succeed
    pub fn push_delete(&self, result: Result<(), ApiError>) -> &Self {
        self.deletes
            .lock()
            .expect("fake remote lock poisoned")
            .push_back(result);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("fake remote lock poisoned").clone()
    }

    /// Ids passed to delete calls for the given collection
    pub fn deleted(&self, kind: ResourceKind) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match (kind, c) {
                (ResourceKind::Posts, Call::DestroyStatus(id)) => Some(id),
                (ResourceKind::Favorites, Call::DestroyFavorite(id)) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .expect("fake remote lock poisoned")
            .push(call);
    }

    fn next_page(queue: &Scripted<Vec<Item>>) -> Result<Vec<Item>, ApiError> {
        queue
            .lock()
            .expect("fake remote lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn next_delete(&self) -> Result<(), ApiError> {
        self.deletes
            .lock()
            .expect("fake remote lock poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn verify_credentials(&self) -> Result<Account, ApiError> {
        self.record(Call::VerifyCredentials);
        Ok(self.account.clone())
    }

    async fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError> {
        self.record(Call::UserTimeline {
            screen_name: screen_name.to_string(),
            max_id,
            count,
        });
        Self::next_page(&self.posts)
    }

    async fn favorites(
        &self,
        user_id: i64,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError> {
        self.record(Call::Favorites {
            user_id,
            max_id,
            count,
        });
        Self::next_page(&self.favorites)
    }

    async fn destroy_status(&self, id: i64) -> Result<(), ApiError> {
        self.record(Call::DestroyStatus(id));
        self.next_delete()
    }

    async fn destroy_favorite(&self, id: i64) -> Result<(), ApiError> {
        self.record(Call::DestroyFavorite(id));
        self.next_delete()
    }
}

/// The account every test fake answers with
pub fn test_account() -> Account {
    Account {
        id: 6253282,
        screen_name: "pruner".to_string(),
    }
}

/// An item created at `created_at`
pub fn item_at(id: i64, created_at: DateTime<Utc>, text: &str) -> Item {
    Item {
        id,
        created_at: created_at.format(CREATED_AT_FORMAT).to_string(),
        text: text.to_string(),
        user: None,
    }
}

/// An item of the given age relative to `now`
pub fn item_aged(id: i64, now: DateTime<Utc>, age: TimeDelta, text: &str) -> Item {
    item_at(id, now - age, text)
}

/// A rate-limited answer carrying the given reset header value
pub fn rate_limited(reset: Option<&str>) -> ApiError {
    ApiError::RateLimited(RateLimit::new(reset.map(str::to_string)))
}
