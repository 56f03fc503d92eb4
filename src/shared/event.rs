/**
 * Domain Event Envelopes
 *
 * Events arrive from the event bus as `{type, payload, metadata}` envelopes.
 * The dispatcher only looks at `type`; each handler decodes `payload` into
 * its own typed struct with `EventEnvelope::decode_payload`.
 */
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::thread::{ThreadId, ThreadStatus};

/// Event type for thread status transitions
pub const STATUS_CHANGED: &str = "thread.status_changed";

/// Event type for a new message posted in a thread
pub const MESSAGE_POSTED: &str = "thread.message_posted";

/// Delivery metadata attached by the event bus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// A typed domain event as delivered by the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            metadata: EventMetadata {
                id: Some(uuid::Uuid::new_v4().to_string()),
                source: None,
                time: Some(Utc::now()),
            },
        }
    }

    /// Decode the payload into the handler's expected schema
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, SharedError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            SharedError::serialization(format!(
                "invalid payload for event '{}': {}",
                self.event_type, e
            ))
        })
    }
}

/// Payload of `thread.status_changed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub participant_id: String,
    pub item_id: String,
    pub former_status: ThreadStatus,
    pub new_status: ThreadStatus,
    pub updated_by_id: String,
}

impl StatusChanged {
    pub fn thread(&self) -> Result<ThreadId, SharedError> {
        ThreadId::new(self.participant_id.clone(), self.item_id.clone())
    }
}

/// Payload of `thread.message_posted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePosted {
    pub participant_id: String,
    pub item_id: String,
    pub author_id: String,
    pub message_id: String,
    #[serde(default)]
    pub preview: Option<String>,
}

impl MessagePosted {
    pub fn thread(&self) -> Result<ThreadId, SharedError> {
        ThreadId::new(self.participant_id.clone(), self.item_id.clone())
    }
}
