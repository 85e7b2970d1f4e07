//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Logfan -- classify, archive, index and alert on a batch of log records.
///
/// Use `logfan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logfan", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logfan.toml configuration file.
    ///
    /// When omitted, defaults plus `LOGFAN_*` environment overrides are used.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one invocation over a stream batch.
    Process(ProcessArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- process ----

/// Shape of the input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Stream trigger envelope (`{"Records":[{"kinesis":{"data":"<base64>"}}]}`).
    Event,
    /// One raw JSON record per line.
    Lines,
}

/// Decode a stream batch and fan it out to the archive, search and webhook sinks.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input file (`-` reads stdin).
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Input format.
    #[arg(long, default_value = "event")]
    pub format: InputFormat,

    /// Invocation time for archive keys (RFC 3339), for replaying old batches.
    #[arg(long, value_parser = parse_invocation_time)]
    pub at: Option<DateTime<FixedOffset>>,
}

fn parse_invocation_time(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value).map_err(|e| format!("expected RFC 3339 time: {e}"))
}

// ---- config ----

/// Manage logfan configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, archive, search, notify, alert).
        #[arg(long)]
        section: Option<String>,
    },
}
