//! Request-boundary facade: one call per utterance.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::{
    config::EngineConfig,
    dialogue::{self, Transition},
    embed::Embedder,
    errors::{EngineError, StoreError},
    knowledge::{self, JsonFileStore, KnowledgeBase, KnowledgeStore},
    lexical::IndelRatio,
    matcher::Matcher,
    policy::Thresholds,
    reply::{self, BotReply},
    session::{DEFAULT_SESSION, SessionRegistry},
};

/// Wires the knowledge store, matcher, thresholds and session contexts.
///
/// Construct once, wrap in `Arc`, and share across request handlers.
pub struct QaEngine {
    store: Arc<dyn KnowledgeStore>,
    matcher: Matcher,
    thresholds: Thresholds,
    sessions: SessionRegistry,
}

impl QaEngine {
    pub fn new(store: Arc<dyn KnowledgeStore>, matcher: Matcher, thresholds: Thresholds) -> Self {
        Self {
            store,
            matcher,
            thresholds,
            sessions: SessionRegistry::new(),
        }
    }

    /// Builds an engine over a [`JsonFileStore`] at `cfg.knowledge_file` with
    /// the [`IndelRatio`] scorer. `embedder` is ignored when semantic
    /// matching is disabled.
    pub fn from_config(cfg: &EngineConfig, embedder: Option<Arc<dyn Embedder>>) -> Self {
        let embedder = embedder.filter(|_| cfg.semantic_matching);
        if cfg.semantic_matching && embedder.is_none() {
            warn!("semantic matching enabled but no embedder supplied; using lexical scores only");
        }
        let matcher = Matcher::new(Arc::new(IndelRatio), embedder, cfg.embedding_concurrency);
        let store = Arc::new(JsonFileStore::new(cfg.knowledge_file.clone()));
        Self::new(store, matcher, cfg.thresholds)
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Handles one utterance for `session` (or [`DEFAULT_SESSION`]).
    ///
    /// Never fails: input, store and embedding errors come back as a reply of
    /// kind `error`, and the session context is left untouched.
    #[instrument(skip_all, fields(session = %session.unwrap_or(DEFAULT_SESSION)))]
    pub async fn respond(&self, session: Option<&str>, input: &str) -> BotReply {
        let input = input.trim();
        if input.is_empty() {
            return BotReply::error(reply::EMPTY_INPUT);
        }

        let id = session.unwrap_or(DEFAULT_SESSION);
        let reply = {
            let handle = self.sessions.context(id).await;
            let mut ctx = handle.lock().await;

            match self.step(&ctx, input).await {
                Ok(Transition { reply, next, .. }) => {
                    ctx.commit(next);
                    reply
                }
                Err(err) => {
                    error!(error = %err, mode = ?ctx.mode(), "QaEngine::respond: step failed");
                    BotReply::error(reply::INTERNAL_ERROR)
                }
            }
        };

        self.sessions.release(id).await;
        reply
    }

    /// Loads the base, advances the dialogue and persists any write.
    /// The returned transition has already been written through.
    async fn step(
        &self,
        ctx: &dialogue::DialogueContext,
        input: &str,
    ) -> Result<Transition, EngineError> {
        let kb = self.store.load()?;
        let transition = dialogue::advance(ctx, input, kb, &self.matcher, &self.thresholds).await?;

        if let Some(kb) = &transition.write {
            self.store.save(kb)?;
            info!(entries = kb.len(), "QaEngine::step: knowledge updated");
        }

        Ok(transition)
    }

    /// Teaches `question` → `answer` directly, outside any dialogue.
    pub fn teach(&self, question: &str, answer: &str) -> BotReply {
        let answer = answer.trim();
        if question.trim().is_empty() || answer.is_empty() {
            return BotReply::error("Both a question and an answer are required.");
        }

        let result = self.store.load().and_then(|mut kb| {
            let key = knowledge::teach(&mut kb, question, answer);
            if key.is_empty() {
                return Ok(None);
            }
            self.store.save(&kb).map(|_| Some(key))
        });

        match result {
            Ok(Some(key)) => {
                info!(question = %key, "QaEngine::teach: stored");
                BotReply::success(reply::LEARNED)
            }
            Ok(None) => BotReply::error(reply::EMPTY_INPUT),
            Err(err) => {
                error!(error = %err, "QaEngine::teach: store failed");
                BotReply::error(reply::INTERNAL_ERROR)
            }
        }
    }

    /// Current persisted knowledge base.
    pub fn knowledge(&self) -> Result<KnowledgeBase, StoreError> {
        self.store.load()
    }
}
