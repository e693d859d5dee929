//! Implementation of the `larder check` command.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::postgres::verify_connection;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Status of one component.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRow {
    pub component: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckRow {
    fn new(component: &str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            component: component.to_string(),
            ok,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub ok: bool,
    pub checks: Vec<CheckRow>,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_checks(&self.checks)
    }
}

/// Static rows describing the configured backends.
pub fn configured_backends(config: &Config) -> Vec<CheckRow> {
    let completion = &config.completion;
    let completion_detail = match completion.backend.as_str() {
        "remote" => format!("{} at {}", completion.remote.model, completion.remote.api_url),
        "local" => format!("{} at {}", completion.local.model, completion.local.url),
        other => other.to_string(),
    };
    let has_key = completion
        .remote
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());

    let mut rows = vec![
        CheckRow::new(
            "embedding",
            true,
            format!(
                "{} ({}, {} dims) at {}",
                config.embedding.provider, config.embedding.model, config.embedding.dimension, config.embedding.base_url
            ),
        ),
        CheckRow::new(
            &format!("completion:{}", completion.backend),
            completion.backend != "remote" || has_key,
            if completion.backend == "remote" && !has_key {
                format!("{completion_detail} (no API key)")
            } else {
                completion_detail
            },
        ),
    ];

    rows.push(if config.detection.enabled {
        CheckRow::new("detection", true, format!("loads on first image from {}", config.detection.url))
    } else {
        CheckRow::new("detection", true, "disabled")
    });

    rows.push(CheckRow::new(
        "sessions",
        true,
        if config.session.enabled {
            format!("in memory, last {} turns in context", config.session.history_turns)
        } else {
            "disabled".to_string()
        },
    ));
    rows
}

pub async fn execute(_args: CheckArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    let target = format!(
        "{}@{}:{}/{}",
        ctx.config.database.user, ctx.config.database.host, ctx.config.database.port, ctx.config.database.name
    );
    let database = match verify_connection(&ctx.pool).await {
        Ok(version) => CheckRow::new("database", true, format!("{target}: {version}")),
        Err(e) => CheckRow::new("database", false, format!("{target}: {e}")),
    };

    let mut checks = vec![database];
    checks.extend(configured_backends(&ctx.config));

    let ok = checks.iter().all(|c| c.ok);
    output(&CheckOutput { ok, checks }, json_mode);

    if !ok {
        bail!("one or more checks failed");
    }
    Ok(())
}
