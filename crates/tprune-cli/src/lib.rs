//! tprune command line front end
//!
//! Flag parsing, config file discovery, logging setup and report rendering
//! around the `tprune` library.

pub mod args;
pub mod config_file;
pub mod error;
pub mod logging;
pub mod output;

pub use args::Cli;
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
