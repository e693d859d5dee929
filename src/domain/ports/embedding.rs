//! Embedding provider port.
//!
//! Converts text into dense vectors for similarity search against the
//! recipe corpus. Used both at query time and by the corpus indexer.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};

/// A single embedding request item.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Corpus record the text belongs to.
    pub id: i64,
    /// Text to embed.
    pub text: String,
}

/// A single embedding result.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// Correlation ID matching the input.
    pub id: i64,
    /// The embedding vector.
    pub vector: Vec<f32>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "fastembed").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// Implementations chunk internally when the provider has per-request limits.
    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>>;

    /// Maximum number of texts per single provider call.
    fn max_batch_size(&self) -> usize;
}

/// Reject vectors whose length differs from the configured dimension.
pub fn ensure_dimension(vector: &[f32], expected: usize) -> DomainResult<()> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(DomainError::DimensionMismatch {
            expected,
            actual: vector.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dimension() {
        assert!(ensure_dimension(&[0.0; 4], 4).is_ok());
        let err = ensure_dimension(&[0.0; 3], 4).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }
}
