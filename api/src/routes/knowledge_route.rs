//! GET /knowledge: the persisted question → answer mapping.

use std::sync::Arc;

use axum::{Json, extract::State};
use qa_engine::KnowledgeBase;
use tracing::error;

use crate::{core::app_state::AppState, error_handler::AppResult};

pub async fn knowledge(State(state): State<Arc<AppState>>) -> AppResult<Json<KnowledgeBase>> {
    let kb = state.engine.knowledge().inspect_err(|err| {
        error!(error = %err, "knowledge: load failed");
    })?;
    Ok(Json(kb))
}
