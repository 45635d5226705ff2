pub mod chat;
pub mod health_route;
pub mod knowledge_route;
pub mod teach;

use axum::http::HeaderMap;

use crate::middleware_layer::json_extractor::REQUEST_ID;

/// Request id set by the middleware, `-` when absent.
pub(crate) fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
