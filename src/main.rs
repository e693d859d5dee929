//! Larder CLI entry point.

use clap::Parser;

use larder::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = larder::cli::run(cli).await {
        larder::cli::handle_error(err, json);
    }
}
