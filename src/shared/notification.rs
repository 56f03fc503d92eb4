//! Per-user notification mailbox entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One durable mailbox entry, ordered per user by `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub read_time: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_time.is_some()
    }
}
