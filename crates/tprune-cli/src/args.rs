use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tprune::Config;
use tprune::backoff::RateLimitMode;
use tprune::config::{parse_keep_ids, parse_keep_keywords, parse_resources};

use crate::error::CliResult;

/// tprune - delete old tweets and favorites according to a retention policy
#[derive(Parser, Debug)]
#[command(name = "tprune")]
#[command(about = "Delete old tweets and favorites according to a retention policy")]
#[command(version)]
pub struct Cli {
    #[clap(long, short = 'c', env = "TPRUNE_CONFIG", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(long, env = "TPRUNE_USERNAME", help = "Username to target")]
    pub username: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_CONSUMER_KEY",
        hide_env_values = true,
        help = "Twitter Consumer Key"
    )]
    pub consumer_key: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_CONSUMER_SECRET",
        hide_env_values = true,
        help = "Twitter Consumer Secret"
    )]
    pub consumer_secret: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_OAUTH_TOKEN",
        hide_env_values = true,
        help = "Twitter OAuth Token"
    )]
    pub oauth_token: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_OAUTH_TOKEN_SECRET",
        hide_env_values = true,
        help = "Twitter OAuth Token Secret"
    )]
    pub oauth_token_secret: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_MAX_AGE",
        value_parser = humantime::parse_duration,
        help = "Maximum age to keep, e.g. 720h or 30days. Older tweets are deleted."
    )]
    pub max_age: Option<Duration>,

    #[clap(long, env = "TPRUNE_KEEP_IDS", help = "Comma-separated tweet IDs to keep forever")]
    pub keep_ids: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_KEEP_KEYWORDS",
        help = "Comma-separated keywords; tweets containing any are kept forever"
    )]
    pub keep_keywords: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_RESOURCES",
        help = "Comma-separated collections to prune: posts, favorites [default: posts,favorites]"
    )]
    pub resources: Option<String>,

    #[clap(
        long,
        env = "TPRUNE_ON_RATE_LIMIT",
        help = "After backing off a rate limit: retry the request, or stop [default: retry]"
    )]
    pub on_rate_limit: Option<RateLimitMode>,

    #[clap(
        long,
        env = "TPRUNE_MAX_RETRIES",
        help = "Rate-limited attempts tolerated per request in retry mode [default: 3]"
    )]
    pub max_retries: Option<u32>,

    #[clap(
        long,
        env = "TPRUNE_DRY_RUN",
        help = "Log what would be deleted without deleting anything"
    )]
    pub dry_run: bool,

    #[clap(long, short, env = "TPRUNE_JSON", help = "Print the summary as JSON")]
    pub json: bool,

    #[clap(long, env = "TPRUNE_LOG_LEVEL", help = "Log level [default: info]")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overlay flags on top of the file configuration
    pub fn apply(&self, config: &mut Config) -> CliResult<()> {
        let account = &mut config.account;
        for (flag, field) in [
            (&self.username, &mut account.username),
            (&self.consumer_key, &mut account.consumer_key),
            (&self.consumer_secret, &mut account.consumer_secret),
            (&self.oauth_token, &mut account.oauth_token),
            (&self.oauth_token_secret, &mut account.oauth_token_secret),
        ] {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }

        if let Some(max_age) = self.max_age {
            config.retention.max_age = Some(max_age);
        }
        if let Some(ids) = &self.keep_ids {
            config.retention.keep_ids = parse_keep_ids(ids)?;
        }
        if let Some(keywords) = &self.keep_keywords {
            config.retention.keep_keywords = parse_keep_keywords(keywords);
        }
        if let Some(resources) = &self.resources {
            config.sweep.resources = parse_resources(resources)?;
        }
        if let Some(mode) = self.on_rate_limit {
            config.sweep.on_rate_limit = mode;
        }
        if let Some(max_retries) = self.max_retries {
            config.sweep.max_retries = max_retries;
        }
        if self.dry_run {
            config.sweep.dry_run = true;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }

        Ok(())
    }
}
