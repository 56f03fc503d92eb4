//! `thread.message_posted` handling.
//!
//! Every follower except the author gets a mailbox entry, and every live
//! subscriber of the thread gets a push. A failure to record one follower's
//! entry does not stop the others; the handler reports failure afterwards so
//! the dispatcher logs it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::events::dispatcher::EventHandler;
use crate::backend::realtime::ThreadDelivery;
use crate::backend::store::{FollowStore, NotificationStore};
use crate::shared::event::MESSAGE_POSTED;
use crate::shared::{EventEnvelope, MessagePosted};

/// Days a mailbox entry is kept
pub const DEFAULT_NOTIFICATION_RETENTION_DAYS: i64 = 30;

pub struct MessagePostedNotifier {
    follows: Arc<dyn FollowStore>,
    notifications: Arc<dyn NotificationStore>,
    delivery: ThreadDelivery,
    retention: Duration,
}

impl MessagePostedNotifier {
    pub fn new(
        follows: Arc<dyn FollowStore>,
        notifications: Arc<dyn NotificationStore>,
        delivery: ThreadDelivery,
        retention: Duration,
    ) -> Self {
        Self {
            follows,
            notifications,
            delivery,
            retention,
        }
    }

    pub async fn notify(&self, posted: &MessagePosted) -> BackendResult<usize> {
        let thread = posted.thread()?;
        let payload = json!({
            "participantId": posted.participant_id,
            "itemId": posted.item_id,
            "authorId": posted.author_id,
            "messageId": posted.message_id,
            "preview": posted.preview,
        });

        let followers = self.follows.list_followers(&thread).await?;
        let mut recorded = 0;
        let mut failed = Vec::new();
        for follower in followers.iter().filter(|f| f.user_id != posted.author_id) {
            match self
                .notifications
                .record(&follower.user_id, MESSAGE_POSTED, payload.clone(), self.retention)
                .await
            {
                Ok(_) => recorded += 1,
                Err(e) => {
                    tracing::error!(user_id = %follower.user_id, "[Events] Failed to record notification: {}", e);
                    failed.push(follower.user_id.clone());
                }
            }
        }

        let push = json!({ "type": MESSAGE_POSTED, "payload": payload });
        let report = self.delivery.push(&thread, &push).await?;
        tracing::debug!(
            thread = %thread,
            recorded,
            pushed = report.delivered,
            "[Events] Message notification fan-out complete"
        );

        if failed.is_empty() {
            Ok(recorded)
        } else {
            Err(BackendError::storage(format!(
                "failed to record notifications for {}",
                failed.join(", ")
            )))
        }
    }
}

#[async_trait]
impl EventHandler for MessagePostedNotifier {
    async fn handle(&self, envelope: Arc<EventEnvelope>) -> BackendResult<()> {
        let posted: MessagePosted = envelope.decode_payload()?;
        self.notify(&posted).await?;
        Ok(())
    }
}
