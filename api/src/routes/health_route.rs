//! GET /health: engine status plus a check of the embedding backend.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use chrono::Utc;
use embedding_service::EmbeddingHealth;
use qa_engine::Thresholds;
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when the store or embedding backend is unhealthy.
    pub status: &'static str,
    pub uptime_secs: i64,
    /// Entry count, `None` when the knowledge file cannot be read.
    pub knowledge_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_error: Option<String>,
    pub semantic_matching: bool,
    pub thresholds: Thresholds,
    pub sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingHealth>,
}

/// Always `200`; unhealthy parts show up as `status: "degraded"`.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let (knowledge_entries, knowledge_error) = match state.engine.knowledge() {
        Ok(kb) => (Some(kb.len()), None),
        Err(err) => (None, Some(err.to_string())),
    };

    let embedding = match &state.embeddings {
        Some(svc) => Some(svc.health().await),
        None => None,
    };

    let healthy = knowledge_error.is_none() && embedding.as_ref().is_none_or(|h| h.ok);

    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        knowledge_entries,
        knowledge_error,
        semantic_matching: state.engine.matcher().has_embedder(),
        thresholds: *state.engine.thresholds(),
        sessions: state.engine.sessions().len().await,
        embedding,
    };

    ApiResponse::success(report).into_response_with_status(StatusCode::OK)
}
