/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket and binds it to the connection
 * dispatcher:
 *
 * 1. A fresh UUID v4 connection id is assigned and an outbound queue is
 *    registered with the hub.
 * 2. The connect handler runs. A rejection is sent as the first frame and the
 *    socket is closed.
 * 3. Every text or binary frame is dispatched; the `DispatchResponse` is
 *    queued back on the same socket.
 * 4. When either direction ends, the disconnect handler runs and the queue is
 *    unregistered.
 *
 * Replies and server pushes share one queue, so a client sees them in the
 * order they were produced.
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::backend::realtime::hub::SendOutcome;
use crate::backend::server::state::AppState;

/// Upgrade handler for `GET /ws`
pub async fn handle_socket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, state))
}

async fn serve_connection(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let mut outbound = state.hub.register(&connection_id).await;

    let connected = state.dispatcher.connect(&connection_id).await;
    if !connected.is_success() {
        tracing::warn!(connection_id = %connection_id, "[Realtime] Connect rejected: {}", connected.body);
        if let Ok(frame) = serde_json::to_string(&connected) {
            sender.send(Message::Text(frame.into())).await.ok();
        }
        sender.send(Message::Close(None)).await.ok();
        state.hub.unregister(&connection_id).await;
        return;
    }
    tracing::info!(connection_id = %connection_id, "[Realtime] Connection opened");

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.into())).await {
                tracing::debug!("[Realtime] Socket write failed: {}", e);
                break;
            }
        }
    });

    let reader_state = state.clone();
    let reader_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => answer_frame(&reader_state, &reader_id, text.as_str().as_bytes()).await,
                Message::Binary(data) => answer_frame(&reader_state, &reader_id, &data).await,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => break,
            };
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        },
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    state.dispatcher.disconnect(&connection_id).await;
    state.hub.unregister(&connection_id).await;
    tracing::info!(connection_id = %connection_id, "[Realtime] Connection closed");
}

/// Dispatch one inbound frame and queue its reply on the same connection
async fn answer_frame(state: &AppState, connection_id: &str, payload: &[u8]) -> SendOutcome {
    let response = state.dispatcher.message(payload, connection_id).await;
    let outcome = state.hub.reply(connection_id, &response).await;
    if !outcome.success {
        tracing::warn!(
            connection_id = %connection_id,
            status = response.status,
            "[Realtime] Reply dropped: {}",
            outcome.error.as_deref().unwrap_or("unknown")
        );
    }
    outcome
}
