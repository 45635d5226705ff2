use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use embedding_service::{EmbeddingConfig, OllamaEmbeddings};
use qa_engine::{Embedder, EngineConfig, QaEngine, embed::ollama::OllamaEmbedder};
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub engine: QaEngine,
    /// Embedding backend, checked by `/health`. `None` when semantic matching is off.
    pub embeddings: Option<Arc<OllamaEmbeddings>>,
    pub started_at: DateTime<Utc>,
    /// Idle time after which the sweeper evicts a session.
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(engine: QaEngine, embeddings: Option<Arc<OllamaEmbeddings>>) -> Self {
        Self {
            engine,
            embeddings,
            started_at: Utc::now(),
            session_ttl: EngineConfig::default().session_ttl,
        }
    }

    /// Load shared state from environment variables.
    ///
    /// The embedding backend is only configured (and therefore only required)
    /// when `SEMANTIC_MATCHING` is on.
    pub fn from_env() -> Result<Self, AppError> {
        let cfg = EngineConfig::from_env()?;

        let embeddings = if cfg.semantic_matching {
            let svc = OllamaEmbeddings::new(EmbeddingConfig::from_env()?)?;
            info!(
                endpoint = %svc.config().endpoint,
                model = %svc.config().model,
                "AppState: semantic matching enabled"
            );
            Some(Arc::new(svc))
        } else {
            info!("AppState: semantic matching disabled");
            None
        };

        let embedder = embeddings
            .clone()
            .map(|svc| Arc::new(OllamaEmbedder::new(svc)) as Arc<dyn Embedder>);
        let engine = QaEngine::from_config(&cfg, embedder);

        info!(
            knowledge_file = %cfg.knowledge_file.display(),
            fuzzy = cfg.thresholds.fuzzy,
            semantic = cfg.thresholds.semantic,
            ambiguity_gap = cfg.thresholds.ambiguity_gap,
            session_ttl_secs = cfg.session_ttl.as_secs(),
            "AppState: engine ready"
        );

        Ok(Self {
            session_ttl: cfg.session_ttl,
            ..Self::new(engine, embeddings)
        })
    }
}
