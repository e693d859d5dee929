//! Implementation of the `larder ask` command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::file_name;
use crate::cli::output::progress::create_spinner;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Answer, AnswerRequest, Config, ImageInput, SourceRef};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// What you would like to cook or ask about
    pub message: Option<String>,

    /// Photo of your ingredients
    #[arg(short, long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Conversation to continue (requires session.enabled)
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskOutput {
    pub reply: String,
    pub ok: bool,
    pub labels: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl From<Answer> for AskOutput {
    fn from(answer: Answer) -> Self {
        Self {
            reply: answer.text,
            ok: answer.ok,
            labels: answer.detected_labels,
            sources: answer.sources,
            session_id: answer.session_id,
        }
    }
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if !self.labels.is_empty() {
            lines.push(format!("{} {}", style("Detected:").dim(), self.labels.join(", ")));
            lines.push(String::new());
        }
        if self.ok {
            lines.push(self.reply.clone());
        } else {
            lines.push(style(&self.reply).yellow().to_string());
        }
        if !self.sources.is_empty() {
            lines.push(String::new());
            lines.push(style("Based on:").dim().to_string());
            lines.push(TableFormatter::new().format_sources(&self.sources));
        }
        if let Some(ref id) = self.session_id {
            lines.push(format!("\n{} {}", style("Session:").dim(), id));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: AskArgs, config: Config, json_mode: bool) -> Result<()> {
    let mut request = AnswerRequest::new(args.message.unwrap_or_default());

    if let Some(ref path) = args.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        request = request.with_image(ImageInput::new(bytes, file_name(path)));
    }
    if let Some(session) = args.session {
        request = request.with_session(session);
    }

    let ctx = AppContext::build(config).await?;

    let spinner = create_spinner("Thinking about recipes...", json_mode);
    let answer = ctx.orchestrator.respond(request).await;
    spinner.finish_and_clear();

    output(&AskOutput::from(answer), json_mode);
    Ok(())
}
