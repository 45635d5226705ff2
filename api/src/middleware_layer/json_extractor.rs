//! Request id propagation and JSON envelope for extractor rejections.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiError, ApiErrorDetail, ApiResponse};

pub const REQUEST_ID: &str = "X-Request-Id";

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    for key in ["session_id", "input", "answer"] {
        if msg.contains(key) {
            return Some(key.to_string());
        }
    }
    None
}

/// Reuses the caller's `X-Request-Id` or mints `req-<nanos>`.
fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get(REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let nanos = Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
            format!("req-{nanos}")
        })
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Tags request and response with a request id, and rewrites plain-text
/// 400/422 rejections from the `Json` extractor into the error envelope.
pub async fn json_error_mapper(mut req: Request<Body>, next: Next) -> Response {
    let req_id = request_id(&req);
    let id_header = HeaderValue::from_str(&req_id).ok();
    if let Some(h) = &id_header {
        req.headers_mut().insert(REQUEST_ID, h.clone());
    }

    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        let mut res = res;
        if let Some(h) = id_header {
            res.headers_mut().insert(REQUEST_ID, h);
        }
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    if let Some(h) = id_header {
        parts.headers.insert(REQUEST_ID, h);
    }
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    debug!(request_id = %req_id, %status, body = %original.trim(), "json_error_mapper: rejected");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: if original.contains("missing field") {
            Some("Send a JSON object such as { \"input\": \"your message\" }.".into())
        } else if original.contains("expected a string") || original.contains("invalid type") {
            Some("Field values must be JSON strings.".into())
        } else {
            None
        },
    };

    let code = if status == StatusCode::BAD_REQUEST {
        "BAD_REQUEST"
    } else {
        "UNPROCESSABLE_ENTITY"
    };
    let envelope = ApiResponse::<()>::failure(
        ApiError::new(code, original.trim())
            .with_request_id(req_id)
            .with_detail(detail),
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_prefers_caller_header() {
        let req = Request::builder()
            .header(REQUEST_ID, " abc ")
            .body(())
            .unwrap();
        assert_eq!(request_id(&req), "abc");

        let req = Request::builder().body(()).unwrap();
        assert!(request_id(&req).starts_with("req-"));
    }

    #[test]
    fn guesses_known_fields() {
        assert_eq!(
            guess_path_from_serde_msg("missing field `answer` at line 1"),
            Some("answer".into())
        );
        assert_eq!(guess_path_from_serde_msg("EOF while parsing"), None);
    }
}
