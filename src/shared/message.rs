/**
 * Live Channel Frames
 *
 * Inbound frames on a live connection are JSON objects naming an `action`.
 * `ActionMessage::decode` is the only place raw bytes are interpreted; every
 * handler downstream receives the validated struct.
 *
 * # Frame Format
 *
 * ```json
 * {"action": "forum.subscribe", "token": "eyJ...", "participantId": "p1", "itemId": "i1"}
 * ```
 *
 * Fields other than the ones modelled here are kept in `extra` so handlers
 * can read action-specific data.
 */
use serde::{Deserialize, Serialize};

use crate::shared::capability::RouteParams;
use crate::shared::error::SharedError;

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    pub action: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ActionMessage {
    /// Decode a raw frame, requiring a non-empty `action`
    pub fn decode(raw: &[u8]) -> Result<Self, SharedError> {
        let value: serde_json::Value = serde_json::from_slice(raw)?;

        let has_action = value
            .get("action")
            .and_then(|a| a.as_str())
            .map(|a| !a.is_empty())
            .unwrap_or(false);
        if !has_action {
            return Err(SharedError::validation("action", "frame has no action"));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Thread coordinates the frame claims to target
    pub fn route_params(&self) -> RouteParams {
        RouteParams {
            participant_id: self.participant_id.clone(),
            item_id: self.item_id.clone(),
        }
    }
}

/// Reply written back to the connection for every dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl DispatchResponse {
    /// Successful acknowledgement carrying the handler's result
    pub fn ack(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    /// Non-fatal error reply; the connection stays open
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
