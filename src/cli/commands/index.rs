//! Implementation of the `larder index` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::progress::create_progress_bar;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::AppContext;
use crate::services::{IndexReport, DEFAULT_BATCH_SIZE};

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Records embedded per request and inserted per transaction
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    #[serde(flatten)]
    pub report: IndexReport,
    pub embeddings_table: String,
}

impl CommandOutput for IndexOutput {
    fn to_human(&self) -> String {
        if self.report.pending == 0 {
            return "Every record already has an embedding.".to_string();
        }
        format!(
            "Embedded {} of {} pending records, inserted {} rows into {}",
            self.report.embedded, self.report.pending, self.report.inserted, self.embeddings_table
        )
    }
}

pub async fn execute(args: IndexArgs, config: Config, json_mode: bool) -> Result<()> {
    let embeddings_table = config.database.embeddings_table.clone();
    let ctx = AppContext::build(config).await?;

    let bar = create_progress_bar(0, json_mode);
    let report = ctx
        .indexer()
        .run(args.batch_size, |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await
        .context("Embedding backfill failed")?;
    bar.finish_and_clear();

    output(&IndexOutput { report, embeddings_table }, json_mode);
    Ok(())
}
