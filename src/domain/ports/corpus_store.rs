//! Corpus store ports: nearest-neighbour search over recipe embeddings,
//! and the write side used to build the index.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CorpusRecord, PendingRecord};

/// Read side: similarity search over the recipe corpus.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// The `top_k` records nearest to `embedding` by cosine distance,
    /// nearest first. Returns fewer when the corpus is smaller.
    async fn search(&self, embedding: &[f32], top_k: usize) -> DomainResult<Vec<CorpusRecord>>;
}

/// Write side: schema setup and embedding ingestion.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync {
    /// Create the vector extension and embeddings table if missing.
    async fn ensure_schema(&self, dimension: usize) -> DomainResult<()>;

    /// Records that have no embedding row yet, in id order.
    async fn pending_records(&self) -> DomainResult<Vec<PendingRecord>>;

    /// Insert `(id, vector)` rows, skipping ids that already exist.
    /// Returns the number of rows actually inserted.
    async fn insert_embeddings(&self, rows: &[(i64, Vec<f32>)]) -> DomainResult<u64>;

    /// Round-trip to the server; returns its version string.
    async fn verify_connection(&self) -> DomainResult<String>;
}
