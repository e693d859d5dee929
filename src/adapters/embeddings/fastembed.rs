//! In-process embedding engine backed by `fastembed`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

/// Keeps one loaded `TextEmbedding` behind a mutex; inference runs on
/// blocking threads.
pub struct FastEmbedProvider {
    dimension: usize,
    max_batch_size: usize,
    inner: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Load `model_name` (e.g. `BAAI/bge-base-en-v1.5`). Model files are
    /// downloaded on first use, so this runs on a blocking thread.
    pub async fn load(model_name: &str, max_batch_size: usize) -> DomainResult<Self> {
        let label = model_name.trim().to_string();
        if label.is_empty() {
            return Err(DomainError::ValidationFailed(
                "fastembed model name cannot be empty".to_string(),
            ));
        }

        tokio::task::spawn_blocking(move || {
            let embedding_model = EmbeddingModel::from_str(&label).map_err(|err| {
                DomainError::EmbeddingFailed(format!("failed to parse fastembed model `{label}`: {err}"))
            })?;
            let model_info = TextEmbedding::get_model_info(&embedding_model).map_err(|err| {
                DomainError::EmbeddingFailed(format!(
                    "unable to read metadata for fastembed model `{label}`: {err}"
                ))
            })?;
            let text_embedding = TextEmbedding::try_new(TextInitOptions::new(embedding_model.clone()))
                .map_err(|err| {
                    DomainError::EmbeddingFailed(format!(
                        "failed to initialise fastembed model `{label}`: {err}"
                    ))
                })?;

            tracing::info!(model = %label, dimension = model_info.dim, "fastembed model loaded");
            Ok(Self {
                dimension: model_info.dim,
                max_batch_size: max_batch_size.max(1),
                inner: Arc::new(Mutex::new(text_embedding)),
            })
        })
        .await
        .map_err(|e| DomainError::EmbeddingFailed(format!("fastembed loader panicked: {e}")))?
    }

    async fn run(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            inner
                .lock()
                .embed(texts, None)
                .map_err(|err| DomainError::EmbeddingFailed(format!("fastembed inference failed: {err}")))
        })
        .await
        .map_err(|e| DomainError::EmbeddingFailed(format!("fastembed worker panicked: {e}")))?
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.run(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::EmbeddingFailed("fastembed returned no embedding".to_string()))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        let mut outputs = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(self.max_batch_size) {
            let vectors = self.run(chunk.iter().map(|i| i.text.clone()).collect()).await?;
            outputs.extend(
                chunk
                    .iter()
                    .zip(vectors)
                    .map(|(input, vector)| EmbeddingOutput { id: input.id, vector }),
            );
        }
        Ok(outputs)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
