//! JSON envelope for `/health`, `/knowledge` failures and rejected requests.
//!
//! Chat and teach outcomes are [`qa_engine::BotReply`] values and never use it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable code such as `BAD_REQUEST` or `STORE_ERROR`.
    pub code: &'static str,
    /// Human-readable description, usually the underlying error text.
    pub message: String,
    /// Echo of `X-Request-Id`, to correlate a failure with server logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Points the client at the offending request field.
#[derive(Debug, Default, Serialize)]
pub struct ApiErrorDetail {
    /// Request field: `input`, `answer` or `session_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// What to change so the request is accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: None,
            details: Vec::new(),
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Appends `detail` unless it carries neither a path nor a hint.
    pub fn with_detail(mut self, detail: ApiErrorDetail) -> Self {
        if detail.path.is_some() || detail.hint.is_some() {
            self.details.push(detail);
        }
        self
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        ApiResponse::<()>::failure(self).into_response_with_status(status)
    }
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failure_omits_unset_fields() {
        let env = ApiResponse::<()>::failure(ApiError::new("STORE_ERROR", "disk full"));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "success": false, "error": { "code": "STORE_ERROR", "message": "disk full" } })
        );
    }

    #[test]
    fn failure_carries_request_id_and_useful_details() {
        let err = ApiError::new("BAD_REQUEST", "missing field `input`")
            .with_request_id("req-7")
            .with_detail(ApiErrorDetail::default())
            .with_detail(ApiErrorDetail {
                path: Some("input".into()),
                hint: None,
            });
        let v = serde_json::to_value(ApiResponse::<()>::failure(err)).unwrap();
        assert_eq!(v["error"]["request_id"], "req-7");
        assert_eq!(v["error"]["details"], json!([{ "path": "input" }]));
    }
}
