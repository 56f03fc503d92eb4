//! Application fixtures over in-memory stores

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;
use threadwatch::backend::auth::JwtVerifier;
use threadwatch::backend::routes::create_router;
use threadwatch::backend::server::AppState;

use super::auth_helpers::{auth_header, TEST_SECRET};

/// Fresh state with its own stores and dispatchers
pub fn test_state() -> AppState {
    AppState::in_memory(Arc::new(JwtVerifier::from_secret(TEST_SECRET)))
}

/// Router plus a handle on the state behind it
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    (create_router(state.clone()), state)
}

/// Build a request, optionally with a bearer token and a JSON body
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, auth_header(token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}
