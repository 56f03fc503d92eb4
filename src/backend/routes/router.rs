/**
 * Router Configuration
 *
 * Combines the route groups into one Axum router and attaches the HTTP
 * trace layer.
 *
 * # Routes
 *
 * - `GET /health` - liveness check with the open connection count
 * - realtime routes (`/ws`, `/events`)
 * - thread routes (`/threads/...`, `/notifications...`)
 *
 * Unknown paths fall through to a JSON 404.
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::ConnectionHub;
use crate::backend::routes::realtime_routes::configure_realtime_routes;
use crate::backend::routes::thread_routes::configure_thread_routes;
use crate::backend::server::state::AppState;

async fn health(State(hub): State<ConnectionHub>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "connections": hub.len().await }))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));

    let router = configure_realtime_routes(router);
    let router = configure_thread_routes(router);

    let router = router.fallback(|| async {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found", "status": 404 })),
        )
    });

    router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
