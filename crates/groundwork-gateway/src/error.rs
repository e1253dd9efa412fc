use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Catch-all API error rendered as `{"error": {"message": ...}}`.
///
/// `detail` carries extra diagnostic context and should only be attached in
/// development mode; production responses stay opaque.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("request failed: {} {}", self.status, self.message);
        }

        let mut body = json!({ "error": { "message": self.message } });
        if let Some(detail) = self.detail {
            body["error"]["detail"] = json!(detail);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<groundwork_common::Error> for ApiError {
    fn from(e: groundwork_common::Error) -> Self {
        Self::internal(e.to_string())
    }
}
