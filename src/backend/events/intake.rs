//! `POST /events`: event-bus delivery endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::backend::error::BackendResult;
use crate::backend::events::dispatcher::{EventDispatcher, FanOutReport};
use crate::shared::EventEnvelope;

/// Accept one envelope and fan it out
///
/// Handler failures are reported in the body, never as an error status. A
/// body that is not an envelope is rejected with 400 before any handler runs.
pub async fn receive_event(
    State(events): State<Arc<EventDispatcher>>,
    body: axum::body::Bytes,
) -> BackendResult<Json<FanOutReport>> {
    let envelope: EventEnvelope = serde_json::from_slice(&body)?;
    tracing::debug!(
        event_type = %envelope.event_type,
        event_id = envelope.metadata.id.as_deref().unwrap_or("-"),
        "[Events] Received event"
    );

    Ok(Json(events.dispatch(envelope).await))
}
