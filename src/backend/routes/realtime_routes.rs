//! Live channel and event intake routes.
//!
//! - `GET  /ws`     - WebSocket upgrade
//! - `POST /events` - event-bus delivery

use axum::routing::{get, post};
use axum::Router;

use crate::backend::events::intake::receive_event;
use crate::backend::realtime::handle_socket_upgrade;
use crate::backend::server::state::AppState;

pub fn configure_realtime_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/ws", get(handle_socket_upgrade))
        .route("/events", post(receive_event))
}
