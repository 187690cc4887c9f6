//! Sweep orchestration
//!
//! Resolves the account, then drains each configured collection in order,
//! one page and one item at a time. The first error aborts the whole run.

use serde::Serialize;
use tracing::{info, warn};

use crate::backoff::BackoffPolicy;
use crate::client::Remote;
use crate::destroyer::{Destroyer, Outcome};
use crate::error::{PruneError, Result};
use crate::fetcher::{Fetcher, Source};
use crate::item::{Account, ResourceKind};
use crate::policy::RetentionPolicy;

/// Everything a run needs besides the remote
#[derive(Debug, Clone)]
pub struct Settings {
    /// Expected screen name; the verified account is used either way
    pub username: Option<String>,
    /// Collections to sweep, in order
    pub resources: Vec<ResourceKind>,
    pub policy: RetentionPolicy,
    pub backoff: BackoffPolicy,
    pub dry_run: bool,
}

/// Counters for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub kind: ResourceKind,
    pub pages: u32,
    pub scanned: u64,
    pub kept: u64,
    pub deleted: u64,
    pub would_delete: u64,
}

impl SweepStats {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            pages: 0,
            scanned: 0,
            kept: 0,
            deleted: 0,
            would_delete: 0,
        }
    }

    fn record(&mut self, outcome: &Outcome) {
        self.scanned += 1;
        match outcome {
            Outcome::Kept(_) => self.kept += 1,
            Outcome::Deleted => self.deleted += 1,
            Outcome::WouldDelete => self.would_delete += 1,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub account_id: i64,
    pub screen_name: String,
    pub dry_run: bool,
    pub sweeps: Vec<SweepStats>,
}

/// Drives fetchers and a destroyer over the configured collections
pub struct Pruner<'a> {
    remote: &'a dyn Remote,
    settings: Settings,
}

impl<'a> Pruner<'a> {
    pub fn new(remote: &'a dyn Remote, settings: Settings) -> Self {
        Self { remote, settings }
    }

    pub async fn run(&self) -> Result<Report> {
        let account = self
            .remote
            .verify_credentials()
            .await
            .map_err(PruneError::Verify)?;
        info!(id = account.id, username = %account.screen_name, "Verified credentials");

        let mismatch = self
            .settings
            .username
            .as_deref()
            .filter(|expected| !expected.eq_ignore_ascii_case(&account.screen_name));
        if let Some(expected) = mismatch {
            warn!(
                expected = %expected,
                verified = %account.screen_name,
                "Configured username does not match the credentials, using the verified account"
            );
        }

        let policy = &self.settings.policy;
        info!(
            max_age_secs = policy.max_age().num_seconds(),
            keep_ids = policy.keep_ids().len(),
            keep_keywords = policy.keep_keywords().len(),
            dry_run = self.settings.dry_run,
            "Applying retention policy"
        );

        let destroyer = Destroyer::new(
            self.remote,
            self.settings.policy.clone(),
            self.settings.backoff,
        )
        .with_dry_run(self.settings.dry_run);

        let mut sweeps = Vec::new();
        for kind in dedup(&self.settings.resources) {
            sweeps.push(self.sweep(kind, &account, &destroyer).await?);
        }

        Ok(Report {
            account_id: account.id,
            screen_name: account.screen_name,
            dry_run: self.settings.dry_run,
            sweeps,
        })
    }

    async fn sweep(
        &self,
        kind: ResourceKind,
        account: &Account,
        destroyer: &Destroyer<'_>,
    ) -> Result<SweepStats> {
        info!(%kind, "Starting sweep");
        let mut fetcher = Fetcher::new(
            self.remote,
            Source::for_account(kind, account),
            self.settings.backoff,
        );
        let mut stats = SweepStats::new(kind);

        while let Some(page) = fetcher.next_page().await? {
            stats.pages += 1;
            for item in &page {
                let outcome = destroyer.process(kind, item).await?;
                stats.record(&outcome);
            }
        }

        info!(
            %kind,
            scanned = stats.scanned,
            kept = stats.kept,
            deleted = stats.deleted,
            would_delete = stats.would_delete,
            "Finished sweep"
        );
        Ok(stats)
    }
}

/// Keep the first occurrence of each kind
fn dedup(kinds: &[ResourceKind]) -> Vec<ResourceKind> {
    let mut seen = Vec::new();
    for kind in kinds {
        if !seen.contains(kind) {
            seen.push(*kind);
        }
    }
    seen
}
