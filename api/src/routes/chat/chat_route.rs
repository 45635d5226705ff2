//! POST /get_response: one dialogue turn.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use qa_engine::BotReply;
use tracing::debug;

use crate::{
    core::app_state::AppState,
    routes::{chat::chat_request::ChatRequest, request_id},
};

/// Handler: POST /get_response
///
/// Always `200`: input and backend problems come back as `type: "error"`.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/get_response \
///   -H 'content-type: application/json' \
///   -d '{"input":"What is your name?","session_id":"alice"}'
/// ```
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Json<BotReply> {
    let request_id = request_id(&headers);
    debug!(
        request_id = %request_id,
        session = ?body.session_id,
        "get_response: start"
    );

    let session = body
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let reply = state.engine.respond(session, &body.input).await;

    debug!(
        request_id = %request_id,
        kind = ?reply.kind,
        "get_response: done"
    );
    Json(reply)
}
