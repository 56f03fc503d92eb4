//! Per-user notification mailbox.
//!
//! Entries expire a fixed window after creation regardless of the thread's
//! status, using the same expiry attribute as follow records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::backend::error::BackendResult;
use crate::shared::Notification;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Append a mailbox entry for `user_id`, expiring after `retention`
    async fn record(
        &self,
        user_id: &str,
        notification_type: &str,
        payload: serde_json::Value,
        retention: Duration,
    ) -> BackendResult<Notification>;

    /// Newest entries first, at most `limit`
    async fn list(&self, user_id: &str, limit: usize) -> BackendResult<Vec<Notification>>;

    /// Set `read_time` on one entry; returns false when it does not exist
    async fn mark_read(&self, user_id: &str, created_at: DateTime<Utc>) -> BackendResult<bool>;

    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize>;
}
