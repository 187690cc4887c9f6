//! Items fetched from the remote account
//!
//! Posts and favorites share one shape; [`ResourceKind`] records which
//! collection an item came from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the platform, e.g. `Wed Oct 10 20:19:24 +0000 2018`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A post or a favorited post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Platform-wide unique identifier
    pub id: i64,
    /// Creation timestamp as sent by the platform
    pub created_at: String,
    /// Body of the post (`full_text` in extended mode)
    #[serde(default, alias = "full_text")]
    pub text: String,
    /// Owning account; only the id survives `trim_user`
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Reference to the account that owns an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
}

impl Item {
    /// Parse the platform timestamp into UTC
    pub fn created_at_time(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).map(|t| t.with_timezone(&Utc))
    }
}

/// The account the credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: i64,
    pub screen_name: String,
}

/// Remote collection an item is pruned from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The account's own timeline, reposts included
    Posts,
    /// Posts the account has favorited
    Favorites,
}

impl ResourceKind {
    /// Every kind, in sweep order
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Posts, ResourceKind::Favorites];

    /// Singular label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Posts => "Tweet",
            ResourceKind::Favorites => "Favorite",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Posts => "posts",
            ResourceKind::Favorites => "favorites",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "posts" | "tweets" => Ok(ResourceKind::Posts),
            "favorites" | "likes" => Ok(ResourceKind::Favorites),
            other => Err(format!(
                "Unknown resource: {other}. Use posts or favorites."
            )),
        }
    }
}
