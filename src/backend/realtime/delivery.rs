//! Thread-scoped pushes.
//!
//! Looks up the live subscribers of a thread, pushes one payload to all of
//! them and removes the subscriptions of connections reported gone.

use std::sync::Arc;

use serde::Serialize;

use crate::backend::error::BackendResult;
use crate::backend::realtime::hub::LiveChannel;
use crate::backend::store::SubscriptionRegistry;
use crate::shared::ThreadId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub delivered: usize,
    pub failed: usize,
    /// Connections found gone and cleaned up
    pub pruned: Vec<String>,
}

#[derive(Clone)]
pub struct ThreadDelivery {
    subscriptions: Arc<dyn SubscriptionRegistry>,
    channel: Arc<dyn LiveChannel>,
}

impl ThreadDelivery {
    pub fn new(subscriptions: Arc<dyn SubscriptionRegistry>, channel: Arc<dyn LiveChannel>) -> Self {
        Self {
            subscriptions,
            channel,
        }
    }

    /// Push `payload` to every connection subscribed to `thread`
    ///
    /// Cleanup failures are logged and do not fail the push.
    pub async fn push(&self, thread: &ThreadId, payload: &serde_json::Value) -> BackendResult<PushReport> {
        let subscribers = self.subscriptions.list_subscribers(thread).await?;
        if subscribers.is_empty() {
            return Ok(PushReport::default());
        }

        let connection_ids: Vec<String> = subscribers.into_iter().map(|s| s.connection_id).collect();
        let outcomes = self.channel.send(&connection_ids, payload).await;

        let mut report = PushReport::default();
        for outcome in outcomes {
            if outcome.success {
                report.delivered += 1;
                continue;
            }

            report.failed += 1;
            if outcome.is_gone() {
                match self.subscriptions.close_connection(&outcome.connection_id).await {
                    Ok(_) => report.pruned.push(outcome.connection_id),
                    Err(e) => tracing::error!(
                        "[Realtime] Failed to clean up gone connection {}: {}",
                        outcome.connection_id,
                        e
                    ),
                }
            }
        }

        tracing::debug!(
            thread = %thread,
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "[Realtime] Thread push complete"
        );
        Ok(report)
    }
}
