use std::fmt;

/// CLI failure, split by how the process should exit
#[derive(Debug)]
pub enum CliError {
    /// Bad flags or configuration; the run never started
    Usage(String),
    /// The run started and failed
    Runtime(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Runtime(_) => 1,
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, CliError::Usage(_))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) | CliError::Runtime(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<tprune::PruneError> for CliError {
    fn from(e: tprune::PruneError) -> Self {
        match e {
            tprune::PruneError::Config(_) => CliError::Usage(e.to_string()),
            other => CliError::Runtime(other.to_string()),
        }
    }
}

/// A malformed base URL is a usage error, any other client failure a runtime one
impl From<tprune::ApiError> for CliError {
    fn from(e: tprune::ApiError) -> Self {
        match e {
            tprune::ApiError::Url(_) => CliError::Usage(format!("invalid api configuration: {e}")),
            other => CliError::Runtime(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Runtime(format!("JSON error: {e}"))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("bad".into()).exit_code(), 2);
        assert_eq!(CliError::Runtime("bad".into()).exit_code(), 1);
    }

    #[test]
    fn test_config_errors_are_usage_errors() {
        let err: CliError = tprune::PruneError::Config("--max-age is required".into()).into();
        assert!(err.is_usage());
        assert!(err.to_string().contains("--max-age is required"));

        let err: CliError = tprune::PruneError::RateLimited {
            action: "fetching posts".into(),
            attempts: 4,
        }
        .into();
        assert!(!err.is_usage());
    }

    #[test]
    fn test_client_setup_errors() {
        let err: CliError = tprune::TwitterClient::new(
            "::not a url",
            tprune::Credentials::new("ck", "cs", "tok", "ts"),
            std::time::Duration::from_secs(5),
        )
        .unwrap_err()
        .into();
        assert!(err.is_usage());
        assert_eq!(err.exit_code(), 2);

        let err: CliError = tprune::ApiError::Signing("failed to initialize hmac".into()).into();
        assert!(!err.is_usage());
        assert_eq!(err.exit_code(), 1);
    }
}
