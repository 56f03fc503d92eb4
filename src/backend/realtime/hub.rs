/**
 * Connection Hub
 *
 * Server-initiated pushes to live connections. Every open socket registers a
 * bounded outbound queue here; a writer task owned by the socket drains it.
 *
 * # Delivery Outcomes
 *
 * `send` reports one outcome per requested connection. A connection that is
 * not registered, or whose writer has gone away, reports `error = "gone"`.
 * Callers use that as the signal to clean up the connection's subscription.
 * A connection whose queue is full reports `"backlogged"` and is left alone.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

use crate::shared::DispatchResponse;

/// Error string reported for connections that can no longer be reached
pub const GONE: &str = "gone";

/// Error string reported for connections whose queue is full
pub const BACKLOGGED: &str = "backlogged";

/// Frames buffered per connection before pushes start failing
pub const OUTBOUND_CAPACITY: usize = 64;

/// Result of pushing to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub connection_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl SendOutcome {
    fn delivered(connection_id: &str) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            success: true,
            error: None,
        }
    }

    fn failed(connection_id: &str, error: &str) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            success: false,
            error: Some(error.to_string()),
        }
    }

    pub fn is_gone(&self) -> bool {
        self.error.as_deref() == Some(GONE)
    }
}

/// Outbound push seam used by event handlers
#[async_trait]
pub trait LiveChannel: Send + Sync {
    async fn send(&self, connection_ids: &[String], payload: &serde_json::Value) -> Vec<SendOutcome>;
}

/// Registry of outbound queues keyed by connection id
#[derive(Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<RwLock<HashMap<String, mpsc::Sender<String>>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and hand back the receiving end of its queue
    pub async fn register(&self, connection_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let mut connections = self.connections.write().await;
        if connections.insert(connection_id.to_string(), tx).is_some() {
            tracing::warn!("[Realtime] Connection {} re-registered", connection_id);
        }
        rx
    }

    pub async fn unregister(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
    }

    pub async fn is_connected(&self, connection_id: &str) -> bool {
        self.connections.read().await.contains_key(connection_id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Queue a dispatch reply on the connection it belongs to
    pub async fn reply(&self, connection_id: &str, response: &DispatchResponse) -> SendOutcome {
        match serde_json::to_string(response) {
            Ok(frame) => self.push(connection_id, frame).await,
            Err(e) => {
                tracing::error!("[Realtime] Failed to serialize reply: {}", e);
                SendOutcome::failed(connection_id, "unserializable")
            }
        }
    }

    async fn push(&self, connection_id: &str, frame: String) -> SendOutcome {
        let sender = self.connections.read().await.get(connection_id).cloned();
        let Some(sender) = sender else {
            return SendOutcome::failed(connection_id, GONE);
        };

        match sender.try_send(frame) {
            Ok(()) => SendOutcome::delivered(connection_id),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("[Realtime] Outbound queue full for {}", connection_id);
                SendOutcome::failed(connection_id, BACKLOGGED)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.unregister(connection_id).await;
                SendOutcome::failed(connection_id, GONE)
            }
        }
    }
}

#[async_trait]
impl LiveChannel for ConnectionHub {
    async fn send(&self, connection_ids: &[String], payload: &serde_json::Value) -> Vec<SendOutcome> {
        let frame = payload.to_string();
        let mut outcomes = Vec::with_capacity(connection_ids.len());
        for connection_id in connection_ids {
            outcomes.push(self.push(connection_id, frame.clone()).await);
        }

        let delivered = outcomes.iter().filter(|o| o.success).count();
        tracing::debug!(
            "[Realtime] Pushed to {}/{} connections",
            delivered,
            connection_ids.len()
        );
        outcomes
    }
}
