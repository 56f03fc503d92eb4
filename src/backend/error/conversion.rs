/**
 * Error Conversion
 *
 * Conversions from `BackendError` into the two reply formats the server
 * produces: HTTP responses and live-channel `DispatchResponse` frames.
 *
 * # Response Format
 *
 * Both formats carry the same JSON body:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 403
 * }
 * ```
 */

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::error::types::BackendError;
use crate::shared::DispatchResponse;

impl BackendError {
    fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message(),
            "status": self.status_code().as_u16(),
        })
    }
}

impl IntoResponse for BackendError {
    /// Convert a backend error into an HTTP response
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Http] {}", self);
        } else {
            tracing::debug!("[Http] {}", self);
        }

        let body = serde_json::to_string(&self.body()).unwrap_or_else(|_| {
            format!(r#"{{"error":"{}","status":{}}}"#, self.message(), status.as_u16())
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Body::from("Internal Server Error"));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl From<&BackendError> for DispatchResponse {
    fn from(err: &BackendError) -> Self {
        DispatchResponse {
            status: err.status_code().as_u16(),
            body: err.body(),
        }
    }
}
