//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{ask::AskArgs, check::CheckArgs, index::IndexArgs, serve::ServeArgs};

#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(about = "Larder - retrieval-augmented recipe assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./larder.yaml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask for a recipe suggestion from text and/or a photo
    Ask(AskArgs),

    /// Run the chat HTTP API until interrupted
    Serve(ServeArgs),

    /// Compute embeddings for records that have none
    Index(IndexArgs),

    /// Check database connectivity and configured backends
    Check(CheckArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["larder", "ask", "pancakes?", "--json", "--config", "x.yaml"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
        match cli.command {
            Commands::Ask(args) => assert_eq!(args.message.as_deref(), Some("pancakes?")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["larder", "serve", "--host", "0.0.0.0", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_index_default_batch_size() {
        let cli = Cli::try_parse_from(["larder", "index"]).unwrap();
        match cli.command {
            Commands::Index(args) => assert_eq!(args.batch_size, 100),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
