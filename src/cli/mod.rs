//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

pub use types::{Cli, Commands};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

/// Load configuration, install logging and run the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    let _logger = init_logging(&config)?;

    match cli.command {
        Commands::Ask(args) => commands::ask::execute(args, config, cli.json).await,
        Commands::Serve(args) => commands::serve::execute(args, config, cli.json).await,
        Commands::Index(args) => commands::index::execute(args, config, cli.json).await,
        Commands::Check(args) => commands::check::execute(args, config, cli.json).await,
    }
}

fn init_logging(config: &Config) -> Result<LoggerImpl> {
    let log_config = LogConfig::try_from(&config.logging)
        .map_err(anyhow::Error::msg)
        .context("Invalid logging configuration")?;
    LoggerImpl::init(&log_config)
}

/// Print `err` in the selected output mode and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {:#}", console::style("Error:").red().bold(), err);
    }
    std::process::exit(1)
}

/// File name component of `path`, if it is valid UTF-8.
pub(crate) fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}
