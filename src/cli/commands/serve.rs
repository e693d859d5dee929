//! Implementation of the `larder serve` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::adapters::http::{ChatHttpConfig, ChatHttpServer};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::SessionStore;
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct ServeOutput {
    pub address: String,
    pub message: String,
}

impl CommandOutput for ServeOutput {
    fn to_human(&self) -> String {
        format!("{} ({})", self.message, self.address)
    }
}

pub async fn execute(args: ServeArgs, mut config: Config, json_mode: bool) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let http_config = ChatHttpConfig::from(&config.server);
    let address = format!("{}:{}", http_config.host, http_config.port);
    let ctx = AppContext::build(config).await?;

    let mut server = ChatHttpServer::new(http_config, ctx.orchestrator.clone());
    if let Some(ref sessions) = ctx.sessions {
        server = server.with_sessions(sessions.clone() as std::sync::Arc<dyn SessionStore>);
    }

    if !json_mode {
        println!("Serving chat API on http://{address} (Ctrl-C to stop)");
    }

    server
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    output(
        &ServeOutput {
            address,
            message: "Server stopped".to_string(),
        },
        json_mode,
    );
    Ok(())
}
