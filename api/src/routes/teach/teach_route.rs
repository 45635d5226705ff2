//! POST /teach_bot: stores a question/answer pair outside the dialogue.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use qa_engine::BotReply;
use tracing::debug;

use crate::{
    core::app_state::AppState,
    routes::{request_id, teach::teach_request::TeachRequest},
};

/// Handler: POST /teach_bot
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/teach_bot \
///   -H 'content-type: application/json' \
///   -d '{"input":"Who made you?","answer":"A small team."}'
/// ```
pub async fn teach_bot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TeachRequest>,
) -> Json<BotReply> {
    let request_id = request_id(&headers);
    debug!(request_id = %request_id, "teach_bot: start");

    let reply = state.engine.teach(&body.input, &body.answer);

    debug!(request_id = %request_id, kind = ?reply.kind, "teach_bot: done");
    Json(reply)
}
