//! Logfan CLI -- run one log fan-out invocation from a stream batch.
//!
//! Entry point: parses arguments, initializes logging, dispatches to the
//! subcommand handler and maps errors to exit codes.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use tracing::{error, info};

use logfan_core::config::LogfanConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging only needs [general]; a broken config is reported by the command itself.
    let general = match cli.config.as_deref() {
        Some(path) => LogfanConfig::load(path)
            .await
            .map(|c| c.general)
            .unwrap_or_default(),
        None => LogfanConfig::from_env()
            .map(|c| c.general)
            .unwrap_or_default(),
    };
    logging::init_tracing(&general, cli.log_level.as_deref())?;
    logfan_core::metrics::describe_all();

    info!(version = env!("CARGO_PKG_VERSION"), "logfan starting");

    if let Err(err) = run(cli).await {
        error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Process(args) => commands::process::execute(args, config_path, &writer).await,
        Commands::Config(args) => commands::config::execute(args, config_path, &writer).await,
    }
}
