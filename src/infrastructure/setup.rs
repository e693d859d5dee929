//! Composition root.
//!
//! Builds every collaborator from a loaded [`Config`] once at startup and
//! hands out shared handles. Nothing here touches the network: the
//! database pool connects lazily and the detector loads on first use.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::FutureExt;
use sqlx::PgPool;
use tracing::info;

use crate::adapters::completion::BackendRegistry;
use crate::adapters::detection::{DetectorLoader, HttpDetectorConfig, HttpObjectDetector, LazyDetector};
use crate::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::postgres::{create_lazy_pool, PgCorpusStore};
use crate::adapters::session::InMemorySessionStore;
use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::domain::ports::{CompletionBackend, EmbeddingProvider, ObjectDetector, SessionStore};
use crate::services::{CorpusIndexer, OrchestratorSettings, RetrievalOrchestrator};

/// Shared handles for one process.
pub struct AppContext {
    pub config: Config,
    pub pool: PgPool,
    pub corpus: Arc<PgCorpusStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub completion: Arc<dyn CompletionBackend>,
    pub detector: Option<Arc<LazyDetector>>,
    pub sessions: Option<Arc<InMemorySessionStore>>,
    pub orchestrator: Arc<RetrievalOrchestrator>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let pool = create_lazy_pool(&config.database);
        let corpus = Arc::new(
            PgCorpusStore::new(
                pool.clone(),
                config.database.records_table.clone(),
                config.database.embeddings_table.clone(),
            )
            .context("Invalid corpus table configuration")?,
        );

        let embedder = build_embedder(&config).await?;

        let completion = BackendRegistry::new(&config.completion)
            .create(&config.completion.backend)
            .context("Failed to create completion backend")?;

        let detector = config
            .detection
            .enabled
            .then(|| Arc::new(LazyDetector::new(detector_loader(&config))));

        let sessions = config
            .session
            .enabled
            .then(|| Arc::new(InMemorySessionStore::new(config.session.max_stored_turns)));

        let mut orchestrator = RetrievalOrchestrator::new(
            embedder.clone(),
            corpus.clone(),
            completion.clone(),
            OrchestratorSettings::from(&config),
        );
        if let Some(ref detector) = detector {
            orchestrator = orchestrator.with_detector(detector.clone() as Arc<dyn ObjectDetector>);
        }
        if let Some(ref sessions) = sessions {
            orchestrator = orchestrator.with_sessions(sessions.clone() as Arc<dyn SessionStore>);
        }

        info!(
            embedding = embedder.name(),
            completion = completion.name(),
            detection = config.detection.enabled,
            sessions = config.session.enabled,
            "application context ready"
        );

        Ok(Self {
            config,
            pool,
            corpus,
            embedder,
            completion,
            detector,
            sessions,
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn indexer(&self) -> CorpusIndexer {
        CorpusIndexer::new(self.embedder.clone(), self.corpus.clone())
    }
}

async fn build_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "openai" => {
            let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(&config.embedding))
                .context("Failed to create embedding provider")?;
            Ok(Arc::new(provider))
        }
        #[cfg(feature = "fastembed-engine")]
        "fastembed" => {
            let provider = crate::adapters::embeddings::FastEmbedProvider::load(
                &config.embedding.model,
                config.embedding.max_batch_size,
            )
            .await
            .context("Failed to load local embedding model")?;
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "fastembed-engine"))]
        "fastembed" => bail!("embedding provider 'fastembed' requires the fastembed-engine feature"),
        other => bail!("unknown embedding provider: {other}"),
    }
}

fn detector_loader(config: &Config) -> DetectorLoader {
    let detector_config = HttpDetectorConfig::from(&config.detection);
    Box::new(move || {
        let detector_config = detector_config.clone();
        async move {
            let detector = HttpObjectDetector::connect(detector_config).await?;
            Ok::<_, DomainError>(Arc::new(detector) as Arc<dyn ObjectDetector>)
        }
        .boxed()
    })
}
