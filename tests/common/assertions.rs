//! Response assertion helpers

use axum::body::{to_bytes, Body};
use axum::http::{Response, StatusCode};

/// Read the whole body as JSON (`Null` when empty)
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    }
}

/// Assert the status and return the JSON body
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let body = json_body(response).await;
    assert_eq!(actual, status, "unexpected status, body: {}", body);
    body
}
