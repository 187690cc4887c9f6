//! Destroyer
//!
//! Applies the retention policy to fetched items and deletes the evicted ones
//! through the delete endpoint matching the item's collection.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::backoff::{BackoffPolicy, back_off};
use crate::client::{ApiError, Remote};
use crate::error::{PruneError, Result};
use crate::item::{Item, ResourceKind};
use crate::policy::{Decision, KeepReason, RetentionPolicy};

/// What happened to one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Kept(KeepReason),
    Deleted,
    /// Evicted, but left alone because of a dry run
    WouldDelete,
}

/// Deletes items that fall outside a [`RetentionPolicy`]
pub struct Destroyer<'a> {
    remote: &'a dyn Remote,
    policy: RetentionPolicy,
    backoff: BackoffPolicy,
    dry_run: bool,
    now: DateTime<Utc>,
}

impl<'a> Destroyer<'a> {
    /// Create a destroyer; the current time is captured once and used for
    /// every decision it makes.
    pub fn new(remote: &'a dyn Remote, policy: RetentionPolicy, backoff: BackoffPolicy) -> Self {
        Self {
            remote,
            policy,
            backoff,
            dry_run: false,
            now: Utc::now(),
        }
    }

    /// Evaluate ages against `now` instead of the construction time
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Decide as usual but never call the delete endpoints
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Apply the policy to one item and delete it when evicted.
    pub async fn process(&self, kind: ResourceKind, item: &Item) -> Result<Outcome> {
        let reason = match self.policy.decide(item, self.now)? {
            Decision::Keep(reason) => reason,
            Decision::Evict if self.dry_run => {
                info!(id = item.id, "Would delete {}", kind.label());
                return Ok(Outcome::WouldDelete);
            }
            Decision::Evict => {
                info!(id = item.id, "Deleting {}", kind.label());
                self.delete(kind, item.id).await?;
                return Ok(Outcome::Deleted);
            }
        };

        info!(id = item.id, reason = %reason, "Keeping {}", kind.label());
        Ok(Outcome::Kept(reason))
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<()> {
        let mut attempts = 0;

        loop {
            let result = match kind {
                ResourceKind::Posts => self.remote.destroy_status(id).await,
                ResourceKind::Favorites => self.remote.destroy_favorite(id).await,
            };

            match result {
                Ok(()) => return Ok(()),
                Err(ApiError::RateLimited(limit)) => {
                    attempts += 1;
                    back_off(&limit).await?;
                    if self.backoff.should_retry(attempts) {
                        debug!(id, %kind, attempts, "Retrying delete after backoff");
                        continue;
                    }
                    return Err(PruneError::RateLimited {
                        action: format!("deleting {kind} {id}"),
                        attempts,
                    });
                }
                Err(source) => return Err(PruneError::Delete { kind, id, source }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::RateLimitMode;
    use crate::testing::{Call, FakeRemote, item_aged, rate_limited, test_account};
    use chrono::{TimeDelta, TimeZone};
    use reqwest::StatusCode;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn policy() -> RetentionPolicy {
        RetentionPolicy::new(
            Duration::from_secs(24 * 60 * 60),
            [42],
            ["#archive".to_string()],
        )
        .unwrap()
    }

    fn destroyer(remote: &FakeRemote, mode: RateLimitMode) -> Destroyer<'_> {
        let backoff = BackoffPolicy {
            mode,
            max_retries: 2,
        };
        Destroyer::new(remote, policy(), backoff).with_now(now())
    }

    #[tokio::test]
    async fn test_mixed_items_are_kept_or_deleted() {
        let remote = FakeRemote::new(test_account());
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let items = [
            item_aged(1, now(), TimeDelta::hours(48), "gone"),
            item_aged(42, now(), TimeDelta::hours(48), "gone"),
            item_aged(3, now(), TimeDelta::hours(48), "keep #archive"),
            item_aged(4, now(), TimeDelta::hours(1), "new"),
        ];

        let mut outcomes = Vec::new();
        for item in &items {
            outcomes.push(destroyer.process(ResourceKind::Posts, item).await.unwrap());
        }

        assert_eq!(
            outcomes,
            vec![
                Outcome::Deleted,
                Outcome::Kept(KeepReason::PinnedId),
                Outcome::Kept(KeepReason::Keyword("#archive".to_string())),
                Outcome::Kept(KeepReason::TooYoung),
            ]
        );
        assert_eq!(remote.calls(), vec![Call::DestroyStatus(1)]);
    }

    #[tokio::test]
    async fn test_favorites_use_favorite_endpoint() {
        let remote = FakeRemote::new(test_account());
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = item_aged(9, now(), TimeDelta::days(3), "liked");

        destroyer
            .process(ResourceKind::Favorites, &item)
            .await
            .unwrap();
        assert_eq!(remote.calls(), vec![Call::DestroyFavorite(9)]);
    }

    #[tokio::test]
    async fn test_dry_run_never_deletes() {
        let remote = FakeRemote::new(test_account());
        let destroyer = destroyer(&remote, RateLimitMode::Retry).with_dry_run(true);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let outcome = destroyer.process(ResourceKind::Posts, &item).await.unwrap();
        assert_eq!(outcome, Outcome::WouldDelete);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_now_is_captured_once() {
        let remote = FakeRemote::new(test_account());
        let destroyer = Destroyer::new(&remote, policy(), BackoffPolicy::default());
        let first = destroyer.now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(destroyer.now(), first);
    }

    #[tokio::test]
    async fn test_delete_error_is_fatal() {
        let remote = FakeRemote::new(test_account());
        remote.push_delete(Err(ApiError::Status {
            status: StatusCode::FORBIDDEN,
            body: "not yours".to_string(),
        }));
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let err = destroyer
            .process(ResourceKind::Posts, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, PruneError::Delete { id: 9, .. }));
        assert!(err.to_string().contains("403"));
        assert_eq!(remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_timestamp_aborts_before_delete() {
        let remote = FakeRemote::new(test_account());
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = Item {
            id: 9,
            created_at: "not a date".to_string(),
            text: "old".to_string(),
            user: None,
        };

        let err = destroyer
            .process(ResourceKind::Posts, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, PruneError::Timestamp { .. }));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_delete_is_retried() {
        let remote = FakeRemote::new(test_account());
        remote.push_delete(Err(rate_limited(Some("5"))));
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let start = tokio::time::Instant::now();
        let outcome = destroyer.process(ResourceKind::Posts, &item).await.unwrap();

        assert_eq!(outcome, Outcome::Deleted);
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(
            remote.calls(),
            vec![Call::DestroyStatus(9), Call::DestroyStatus(9)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_delete_in_stop_mode_aborts() {
        let remote = FakeRemote::new(test_account());
        remote.push_delete(Err(rate_limited(Some("5"))));
        let destroyer = destroyer(&remote, RateLimitMode::Stop);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let start = tokio::time::Instant::now();
        let err = destroyer
            .process(ResourceKind::Posts, &item)
            .await
            .unwrap_err();

        assert!(matches!(err, PruneError::RateLimited { attempts: 1, .. }));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(remote.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_delete_retries_are_bounded() {
        let remote = FakeRemote::new(test_account());
        for _ in 0..3 {
            remote.push_delete(Err(rate_limited(Some("1"))));
        }
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let err = destroyer
            .process(ResourceKind::Posts, &item)
            .await
            .unwrap_err();

        assert!(matches!(err, PruneError::RateLimited { attempts: 3, .. }));
        assert_eq!(
            err.to_string(),
            "rate limited while deleting posts 9 after 3 attempt(s)"
        );
        assert_eq!(remote.calls(), vec![Call::DestroyStatus(9); 3]);
    }

    #[tokio::test]
    async fn test_rate_limited_delete_without_reset_fails_to_back_off() {
        let remote = FakeRemote::new(test_account());
        remote.push_delete(Err(rate_limited(None)));
        let destroyer = destroyer(&remote, RateLimitMode::Retry);
        let item = item_aged(9, now(), TimeDelta::days(3), "old");

        let err = destroyer
            .process(ResourceKind::Favorites, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, PruneError::Backoff(_)));
    }
}
