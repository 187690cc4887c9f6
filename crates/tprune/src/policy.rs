//! Retention policy
//!
//! Decides, for one item at one instant, whether the item is kept or evicted.
//! Rules are checked top to bottom and the first keep-rule that matches wins;
//! eviction is the fallthrough.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{PruneError, Result};
use crate::item::Item;

/// Age and allow-list rules for what survives a run
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    max_age: TimeDelta,
    keep_ids: HashSet<i64>,
    keep_keywords: Vec<String>,
}

/// Why an item was kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepReason {
    /// Younger than the maximum age
    TooYoung,
    /// Listed in the kept identifiers
    PinnedId,
    /// Body contains the given kept keyword
    Keyword(String),
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepReason::TooYoung => f.write_str("younger than max age"),
            KeepReason::PinnedId => f.write_str("id is kept"),
            KeepReason::Keyword(k) => write!(f, "contains keyword {k:?}"),
        }
    }
}

/// Outcome of evaluating the policy against one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Keep(KeepReason),
    Evict,
}

impl Decision {
    pub fn is_evict(&self) -> bool {
        matches!(self, Decision::Evict)
    }
}

impl RetentionPolicy {
    /// Build a policy. `max_age` must be non-zero.
    pub fn new(
        max_age: Duration,
        keep_ids: impl IntoIterator<Item = i64>,
        keep_keywords: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        if max_age.is_zero() {
            return Err(PruneError::Config("max age is required".to_string()));
        }
        let max_age = TimeDelta::from_std(max_age)
            .map_err(|e| PruneError::Config(format!("max age out of range: {e}")))?;

        Ok(Self {
            max_age,
            keep_ids: keep_ids.into_iter().collect(),
            keep_keywords: keep_keywords
                .into_iter()
                .filter(|k| !k.is_empty())
                .collect(),
        })
    }

    pub fn max_age(&self) -> TimeDelta {
        self.max_age
    }

    pub fn keep_ids(&self) -> &HashSet<i64> {
        &self.keep_ids
    }

    pub fn keep_keywords(&self) -> &[String] {
        &self.keep_keywords
    }

    /// Evaluate the policy for `item` as of `now`.
    ///
    /// Fails only when the item's creation timestamp cannot be parsed.
    pub fn decide(&self, item: &Item, now: DateTime<Utc>) -> Result<Decision> {
        let created_at = item
            .created_at_time()
            .map_err(|source| PruneError::Timestamp {
                id: item.id,
                value: item.created_at.clone(),
                source,
            })?;

        if now - created_at < self.max_age {
            return Ok(Decision::Keep(KeepReason::TooYoung));
        }
        if self.keep_ids.contains(&item.id) {
            return Ok(Decision::Keep(KeepReason::PinnedId));
        }
        if let Some(keyword) = self.keep_keywords.iter().find(|k| item.text.contains(k.as_str())) {
            return Ok(Decision::Keep(KeepReason::Keyword(keyword.clone())));
        }
        Ok(Decision::Evict)
    }
}
