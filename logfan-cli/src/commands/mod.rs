//! Command handlers -- one module per subcommand

pub mod config;
pub mod process;

use std::path::Path;

use logfan_core::config::LogfanConfig;

use crate::error::CliError;

/// Load the effective configuration.
///
/// With a path: file, then `LOGFAN_*` overrides, then validation.
/// Without one: defaults plus `LOGFAN_*` overrides.
pub async fn load_config(path: Option<&Path>) -> Result<LogfanConfig, CliError> {
    let config = match path {
        Some(path) => LogfanConfig::load(path).await?,
        None => LogfanConfig::from_env()?,
    };
    Ok(config)
}

/// Human-readable name of the configuration source.
pub fn config_source(path: Option<&Path>) -> String {
    path.map_or_else(
        || "(defaults + environment)".to_owned(),
        |p| p.display().to_string(),
    )
}
