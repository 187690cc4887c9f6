//! tprune - delete old tweets and favorites according to a retention policy

use clap::{CommandFactory, Parser};
use tracing::info;

use tprune::{Pruner, TwitterClient};
use tprune_cli::Cli;
use tprune_cli::config_file::load_config;
use tprune_cli::error::CliResult;
use tprune_cli::logging::init_logging;
use tprune_cli::output::{OutputFormat, print_report};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if e.is_usage() {
            eprintln!();
            let _ = Cli::command().print_help();
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let (mut config, source) = load_config(cli.config.as_deref())?;
    cli.apply(&mut config)?;
    init_logging(&config.log.level)?;

    match source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using flags and defaults"),
    }

    let settings = config.settings()?;
    let client =
        TwitterClient::new(&config.api.base_url, config.credentials(), config.timeout())?;

    let report = Pruner::new(&client, settings).run().await?;
    print_report(&report, OutputFormat::from_json_flag(cli.json))
}
