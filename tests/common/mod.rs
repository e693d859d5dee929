//! Common test utilities for integration tests
//!
//! Fakes for the retrieval collaborators that have no lightweight HTTP
//! stand-in, plus small fixtures shared across test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use larder::domain::errors::{DomainError, DomainResult};
use larder::domain::models::CorpusRecord;
use larder::domain::ports::{CorpusStore, EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

/// Embedder returning a constant vector and recording the texts it saw.
pub struct StaticEmbedder {
    pub dimension: usize,
    pub texts: Mutex<Vec<String>>,
}

impl StaticEmbedder {
    pub fn new(dimension: usize) -> Arc<Self> {
        Arc::new(Self {
            dimension,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    fn name(&self) -> &'static str {
        "static"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(vec![0.1; self.dimension])
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Ok(inputs
            .iter()
            .map(|input| EmbeddingOutput {
                id: input.id,
                vector: vec![0.1; self.dimension],
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        64
    }
}

/// Corpus returning a fixed result set, or failing when `fail` is set.
pub struct FixedCorpus {
    pub records: Vec<CorpusRecord>,
    pub fail: bool,
    pub searches: AtomicUsize,
}

impl FixedCorpus {
    pub fn new(records: Vec<CorpusRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            fail: false,
            searches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            records: Vec::new(),
            fail: true,
            searches: AtomicUsize::new(0),
        })
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CorpusStore for FixedCorpus {
    async fn search(&self, _embedding: &[f32], top_k: usize) -> DomainResult<Vec<CorpusRecord>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DomainError::CorpusStoreFailed("connection refused".to_string()));
        }
        Ok(self.records.iter().take(top_k).cloned().collect())
    }
}

/// Three recipes with a mix of attributes.
pub fn sample_recipes() -> Vec<CorpusRecord> {
    vec![
        CorpusRecord::new(12, "Honey oat bars", "Chewy oat bars sweetened with honey.")
            .with_attribute("minutes", 35),
        CorpusRecord::new(40, "Apple crumble", "Baked apples under a buttery crumble.")
            .with_attribute("servings", 6),
        CorpusRecord::new(7, "Baked apples", "Whole apples baked with cinnamon."),
    ]
}

/// A bound listener that accepts connections and never answers.
pub async fn silent_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}"), handle)
}

/// Join `lines` into a `text/event-stream` body.
pub fn sse_body(lines: &[&str]) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    body
}
