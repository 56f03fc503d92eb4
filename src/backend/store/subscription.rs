/**
 * Subscription Registry
 *
 * Live bindings between connections and threads, plus the connection
 * records that point back at each connection's active subscription.
 *
 * # Connection Back-Reference
 *
 * A connection watches at most one thread at a time. Its connection record
 * stores that thread so disconnect cleanup removes the subscription with a
 * single lookup instead of scanning every thread. Subscribing to a second
 * thread replaces the first subscription.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::error::BackendResult;
use crate::shared::ThreadId;

/// Live subscriber entry returned by `list_subscribers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub connection_id: String,
    pub user_id: String,
}

/// One open connection and its current subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub connection_id: String,
    pub connected_at: DateTime<Utc>,
    pub subscription: Option<ThreadId>,
}

#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Create the connection record for a freshly connected client
    async fn open_connection(&self, connection_id: &str) -> BackendResult<()>;

    /// Bind `connection_id` to `thread` and point its back-reference there
    async fn subscribe(&self, thread: &ThreadId, connection_id: &str, user_id: &str) -> BackendResult<()>;

    /// Remove the binding; a no-op when absent
    async fn unsubscribe(&self, thread: &ThreadId, connection_id: &str) -> BackendResult<()>;

    /// Connections currently subscribed to `thread`
    async fn list_subscribers(&self, thread: &ThreadId) -> BackendResult<Vec<Subscriber>>;

    /// Drop the connection record and its subscription, returning the thread
    /// it was subscribed to
    async fn close_connection(&self, connection_id: &str) -> BackendResult<Option<ThreadId>>;

    async fn connection(&self, connection_id: &str) -> BackendResult<Option<ConnectionRecord>>;
}
