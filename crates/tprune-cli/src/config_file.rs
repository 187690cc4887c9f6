use std::path::{Path, PathBuf};

use tprune::Config;

use crate::error::{CliError, CliResult};

/// Candidate config files, first match wins
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".tprune").join("config.toml")),
        dirs::config_dir().map(|c| c.join("tprune").join("config.toml")),
        Some(PathBuf::from("tprune.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the default locations are
/// searched and a missing file yields defaults. Returns the path actually
/// read so it can be logged once logging is up.
pub fn load_config(config_path: Option<&Path>) -> CliResult<(Config, Option<PathBuf>)> {
    match config_path {
        Some(path) => Ok((read_config(path)?, Some(path.to_path_buf()))),
        None => load_first(&default_config_paths()),
    }
}

fn load_first(paths: &[PathBuf]) -> CliResult<(Config, Option<PathBuf>)> {
    for path in paths {
        if path.exists() {
            return Ok((read_config(path)?, Some(path.clone())));
        }
    }
    Ok((Config::default(), None))
}

fn read_config(path: &Path) -> CliResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Usage(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str(&content).map_err(|e| {
        CliError::Usage(format!(
            "Failed to parse config {}: {e}",
            path.display()
        ))
    })
}
