use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::auth::Credentials;
use crate::backoff::{BackoffPolicy, DEFAULT_MAX_RETRIES, RateLimitMode};
use crate::client::DEFAULT_BASE_URL;
use crate::error::{PruneError, Result};
use crate::item::ResourceKind;
use crate::policy::RetentionPolicy;
use crate::sweep::Settings;

/// Main configuration structure for tprune
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Account and OAuth credentials
    #[serde(default)]
    pub account: AccountConfig,
    /// What to keep
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Which collections to sweep and how to treat rate limits
    #[serde(default)]
    pub sweep: SweepConfig,
    /// API endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Account and credential configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccountConfig {
    /// Screen name of the account to prune
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub oauth_token: String,
    #[serde(default)]
    pub oauth_token_secret: String,
}

/// Retention rules
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RetentionConfig {
    /// Items older than this are deleted unless another rule keeps them
    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
    /// Item ids kept forever
    #[serde(default)]
    pub keep_ids: Vec<i64>,
    /// Substrings that keep an item forever (case-sensitive)
    #[serde(default)]
    pub keep_keywords: Vec<String>,
}

/// Sweep behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Collections to prune, in order
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceKind>,
    /// Retry a rate-limited request after backing off, or stop
    #[serde(default)]
    pub on_rate_limit: RateLimitMode,
    /// Rate-limited attempts tolerated per request in retry mode
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Log what would be deleted without deleting it
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            on_rate_limit: RateLimitMode::default(),
            max_retries: default_max_retries(),
            dry_run: false,
        }
    }
}

fn default_resources() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. "https://api.twitter.com/1.1"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Reject configurations that cannot start a run.
    ///
    /// Checked before any network activity.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("username", &self.account.username),
            ("consumer-key", &self.account.consumer_key),
            ("consumer-secret", &self.account.consumer_secret),
            ("oauth-token", &self.account.oauth_token),
            ("oauth-token-secret", &self.account.oauth_token_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PruneError::Config(format!("--{name} is required")));
            }
        }

        if self.retention.max_age.is_none_or(|d| d.is_zero()) {
            return Err(PruneError::Config("--max-age is required".to_string()));
        }
        if self.sweep.resources.is_empty() {
            return Err(PruneError::Config(
                "at least one resource to prune is required".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(PruneError::Config("api timeout must be non-zero".to_string()));
        }
        Url::parse(&self.api.base_url).map_err(|e| {
            PruneError::Config(format!("invalid api base url {}: {e}", self.api.base_url))
        })?;

        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.account.consumer_key.trim(),
            self.account.consumer_secret.trim(),
            self.account.oauth_token.trim(),
            self.account.oauth_token_secret.trim(),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Validate and build the run settings
    pub fn settings(&self) -> Result<Settings> {
        self.validate()?;

        let policy = RetentionPolicy::new(
            self.retention.max_age.unwrap_or_default(),
            self.retention.keep_ids.iter().copied(),
            self.retention.keep_keywords.iter().cloned(),
        )?;

        Ok(Settings {
            username: Some(self.account.username.trim().to_string()),
            resources: self.sweep.resources.clone(),
            policy,
            backoff: BackoffPolicy {
                mode: self.sweep.on_rate_limit,
                max_retries: self.sweep.max_retries,
            },
            dry_run: self.sweep.dry_run,
        })
    }
}

/// Parse a comma-separated list of item ids. Empty input is an empty list.
pub fn parse_keep_ids(value: &str) -> Result<Vec<i64>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|e| PruneError::Config(format!("invalid keep id {s:?}: {e}")))
        })
        .collect()
}

/// Parse a comma-separated list of keywords, dropping empty entries.
pub fn parse_keep_keywords(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated list of resource kinds.
pub fn parse_resources(value: &str) -> Result<Vec<ResourceKind>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<ResourceKind>().map_err(PruneError::Config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.account = AccountConfig {
            username: "pruner".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            oauth_token: "tok".to_string(),
            oauth_token_secret: "ts".to_string(),
        };
        config.retention.max_age = Some(Duration::from_secs(3600));
        config
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.account.username.is_empty());
        assert!(config.retention.max_age.is_none());
        assert!(config.retention.keep_ids.is_empty());
        assert_eq!(
            config.sweep.resources,
            vec![ResourceKind::Posts, ResourceKind::Favorites]
        );
        assert_eq!(config.sweep.on_rate_limit, RateLimitMode::Retry);
        assert_eq!(config.sweep.max_retries, 3);
        assert!(!config.sweep.dry_run);
        assert_eq!(config.api.base_url, "https://api.twitter.com/1.1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r##"
[account]
username = "pruner"
consumer_key = "ck"
consumer_secret = "cs"
oauth_token = "tok"
oauth_token_secret = "ts"

[retention]
max_age = "30days"
keep_ids = [42, 1050118621198921728]
keep_keywords = ["#archive", "pinned"]

[sweep]
resources = ["favorites"]
on_rate_limit = "stop"
max_retries = 5
dry_run = true

[api]
base_url = "http://localhost:8080/1.1"
timeout_secs = 10

[log]
level = "debug"
"##;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.account.username, "pruner");
        assert_eq!(
            config.retention.max_age,
            Some(Duration::from_secs(30 * 24 * 60 * 60))
        );
        assert_eq!(config.retention.keep_ids, vec![42, 1050118621198921728]);
        assert_eq!(config.retention.keep_keywords, vec!["#archive", "pinned"]);
        assert_eq!(config.sweep.resources, vec![ResourceKind::Favorites]);
        assert_eq!(config.sweep.on_rate_limit, RateLimitMode::Stop);
        assert_eq!(config.sweep.max_retries, 5);
        assert!(config.sweep.dry_run);
        assert_eq!(config.api.base_url, "http://localhost:8080/1.1");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.log.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[retention]
max_age = "24h"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");
        assert_eq!(config.retention.max_age, Some(Duration::from_secs(86400)));
        assert_eq!(config.sweep.resources.len(), 2);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_validate_requires_each_field() {
        let cases: [(&str, fn(&mut Config)); 6] = [
            ("--username", |c| c.account.username.clear()),
            ("--consumer-key", |c| c.account.consumer_key.clear()),
            ("--consumer-secret", |c| c.account.consumer_secret = " ".to_string()),
            ("--oauth-token", |c| c.account.oauth_token.clear()),
            ("--oauth-token-secret", |c| c.account.oauth_token_secret.clear()),
            ("--max-age", |c| c.retention.max_age = None),
        ];

        for (flag, break_it) in cases {
            let mut config = valid_config();
            break_it(&mut config);
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains(flag),
                "expected {flag} in {err}"
            );
        }
    }

    #[test]
    fn test_validate_rejects_zero_max_age() {
        let mut config = valid_config();
        config.retention.max_age = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = valid_config();
        config.api.base_url = "::not a url".to_string();
        assert!(matches!(config.validate(), Err(PruneError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_resources() {
        let mut config = valid_config();
        config.sweep.resources.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_builds_policy() {
        let mut config = valid_config();
        config.retention.keep_ids = vec![42];
        config.retention.keep_keywords = vec!["#archive".to_string()];
        config.sweep.on_rate_limit = RateLimitMode::Stop;

        let settings = config.settings().unwrap();
        assert_eq!(settings.username.as_deref(), Some("pruner"));
        assert!(settings.policy.keep_ids().contains(&42));
        assert_eq!(settings.policy.keep_keywords(), ["#archive".to_string()]);
        assert_eq!(settings.backoff.mode, RateLimitMode::Stop);
        assert_eq!(settings.backoff.max_retries, 3);
    }

    #[test]
    fn test_parse_keep_ids() {
        assert!(parse_keep_ids("").unwrap().is_empty());
        assert_eq!(parse_keep_ids("42").unwrap(), vec![42]);
        assert_eq!(parse_keep_ids("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_keep_ids("1,two").is_err());
        assert!(parse_keep_ids("1,").is_err());
    }

    #[test]
    fn test_parse_keep_keywords() {
        assert!(parse_keep_keywords("").is_empty());
        assert_eq!(
            parse_keep_keywords("#archive, pinned,"),
            vec!["#archive", " pinned"]
        );
    }

    #[test]
    fn test_parse_resources() {
        assert_eq!(
            parse_resources("favorites,posts").unwrap(),
            vec![ResourceKind::Favorites, ResourceKind::Posts]
        );
        assert_eq!(parse_resources("posts,").unwrap(), vec![ResourceKind::Posts]);
        assert!(parse_resources("posts,dms").is_err());
    }
}
