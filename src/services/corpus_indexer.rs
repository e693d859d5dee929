//! Backfills embedding rows for corpus records that have none.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::ports::{ensure_dimension, EmbeddingIndex, EmbeddingInput, EmbeddingProvider};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Outcome of one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Records without an embedding when the run started.
    pub pending: usize,
    /// Vectors computed.
    pub embedded: usize,
    /// Rows actually written (existing ids are skipped).
    pub inserted: u64,
}

pub struct CorpusIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn EmbeddingIndex>,
}

impl CorpusIndexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn EmbeddingIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed and insert pending records `batch_size` at a time.
    ///
    /// `progress(done, total)` is called after every committed batch.
    /// Errors abort the run; batches already inserted stay inserted.
    #[instrument(skip(self, progress))]
    pub async fn run<F>(&self, batch_size: usize, progress: F) -> DomainResult<IndexReport>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let dimension = self.embedder.dimension();
        self.index.ensure_schema(dimension).await?;

        let pending = self.index.pending_records().await?;
        let mut report = IndexReport {
            pending: pending.len(),
            ..IndexReport::default()
        };
        info!(pending = report.pending, "records awaiting embeddings");

        for batch in pending.chunks(batch_size.max(1)) {
            let inputs: Vec<EmbeddingInput> = batch
                .iter()
                .map(|record| EmbeddingInput {
                    id: record.id,
                    text: record.text.clone(),
                })
                .collect();
            let outputs = self.embedder.embed_batch(&inputs).await?;

            let mut rows = Vec::with_capacity(outputs.len());
            for output in outputs {
                ensure_dimension(&output.vector, dimension)?;
                rows.push((output.id, output.vector));
            }

            report.embedded += rows.len();
            report.inserted += self.index.insert_embeddings(&rows).await?;
            progress(report.embedded, report.pending);
        }

        info!(
            embedded = report.embedded,
            inserted = report.inserted,
            "embedding backfill complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::PendingRecord;
    use crate::domain::ports::EmbeddingOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CountingEmbedder {
        dimension: usize,
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
            Ok(vec![0.0; self.dimension])
        }

        async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
            self.batches.lock().unwrap().push(inputs.len());
            Ok(inputs
                .iter()
                .map(|i| EmbeddingOutput {
                    id: i.id,
                    vector: vec![i.id as f32; self.dimension],
                })
                .collect())
        }

        fn max_batch_size(&self) -> usize {
            64
        }
    }

    #[derive(Default)]
    struct MemoryIndex {
        schema_dimension: Mutex<Option<usize>>,
        pending: Vec<PendingRecord>,
        rows: Mutex<Vec<(i64, Vec<f32>)>>,
    }

    #[async_trait]
    impl EmbeddingIndex for MemoryIndex {
        async fn ensure_schema(&self, dimension: usize) -> DomainResult<()> {
            *self.schema_dimension.lock().unwrap() = Some(dimension);
            Ok(())
        }

        async fn pending_records(&self) -> DomainResult<Vec<PendingRecord>> {
            Ok(self.pending.clone())
        }

        async fn insert_embeddings(&self, rows: &[(i64, Vec<f32>)]) -> DomainResult<u64> {
            let mut stored = self.rows.lock().unwrap();
            let mut inserted = 0;
            for row in rows {
                if !stored.iter().any(|(id, _)| *id == row.0) {
                    stored.push(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        }

        async fn verify_connection(&self) -> DomainResult<String> {
            Ok("memory".to_string())
        }
    }

    fn pending(n: i64) -> Vec<PendingRecord> {
        (1..=n)
            .map(|id| PendingRecord {
                id,
                text: format!("recipe {id}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_backfills_in_batches() {
        let embedder = Arc::new(CountingEmbedder {
            dimension: 3,
            batches: Mutex::new(Vec::new()),
        });
        let index = Arc::new(MemoryIndex {
            pending: pending(250),
            ..MemoryIndex::default()
        });
        let indexer = CorpusIndexer::new(embedder.clone(), index.clone());

        let seen = Mutex::new(Vec::new());
        let report = indexer
            .run(DEFAULT_BATCH_SIZE, |done, total| seen.lock().unwrap().push((done, total)))
            .await
            .unwrap();

        assert_eq!(
            report,
            IndexReport {
                pending: 250,
                embedded: 250,
                inserted: 250
            }
        );
        assert_eq!(*embedder.batches.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(100, 250), (200, 250), (250, 250)]
        );
        assert_eq!(*index.schema_dimension.lock().unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let embedder = Arc::new(CountingEmbedder {
            dimension: 3,
            batches: Mutex::new(Vec::new()),
        });
        let indexer = CorpusIndexer::new(embedder, Arc::new(MemoryIndex::default()));
        let report = indexer.run(10, |_, _| {}).await.unwrap();
        assert_eq!(report, IndexReport::default());
    }

    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortEmbedder {
        fn name(&self) -> &'static str {
            "short"
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
            Ok(vec![0.0; 2])
        }

        async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
            Ok(inputs
                .iter()
                .map(|i| EmbeddingOutput {
                    id: i.id,
                    vector: vec![0.0; 2],
                })
                .collect())
        }

        fn max_batch_size(&self) -> usize {
            8
        }
    }

    #[tokio::test]
    async fn test_wrong_dimension_aborts() {
        let index = Arc::new(MemoryIndex {
            pending: pending(3),
            ..MemoryIndex::default()
        });
        let indexer = CorpusIndexer::new(Arc::new(ShortEmbedder), index.clone());
        let err = indexer.run(10, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, DomainError::DimensionMismatch { expected: 4, actual: 2 }));
        assert!(index.rows.lock().unwrap().is_empty());
    }
}
