use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{CliError, CliResult};

/// Filter directive for the given level. Dependencies stay at `warn`.
pub fn filter_directive(level: &str) -> CliResult<String> {
    let level = level.trim();
    LevelFilter::from_str(level).map_err(|_| {
        CliError::Usage(format!(
            "invalid log level {level:?}: expected one of trace, debug, info, warn, error, off"
        ))
    })?;
    let level = level.to_ascii_lowercase();
    Ok(format!("warn,tprune={level},tprune_cli={level}"))
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(level: &str) -> CliResult<()> {
    let directive = filter_directive(level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
