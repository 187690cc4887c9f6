//! tprune - retention-policy driven pruning for a Twitter account
//!
//! Walks the account's posts and favorites page by page, keeps what the
//! retention policy protects and deletes the rest.

pub mod auth;
pub mod backoff;
pub mod client;
pub mod config;
pub mod destroyer;
pub mod error;
pub mod fetcher;
pub mod item;
pub mod policy;
pub mod sweep;
pub mod testing;

pub use auth::Credentials;
pub use client::{ApiError, Remote, TwitterClient};
pub use config::Config;
pub use error::{PruneError, Result};
pub use item::{Account, Item, ResourceKind};
pub use policy::{Decision, KeepReason, RetentionPolicy};
pub use sweep::{Pruner, Report, Settings, SweepStats};
