/**
 * Capability Claims
 *
 * The claim set carried by a capability token. A capability grants its
 * holder rights on exactly one thread; the server never mints these, it only
 * verifies tokens issued elsewhere.
 */
use serde::{Deserialize, Serialize};

use crate::shared::thread::ThreadId;

/// Decoded claims of a verified capability token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityClaims {
    pub participant_id: String,
    pub item_id: String,
    pub user_id: String,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default)]
    pub can_watch: bool,
    #[serde(default)]
    pub can_write: bool,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl CapabilityClaims {
    /// The thread this capability is scoped to
    pub fn thread(&self) -> ThreadId {
        ThreadId {
            participant_id: self.participant_id.clone(),
            item_id: self.item_id.clone(),
        }
    }
}

/// Thread coordinates supplied by a route or an inbound frame
///
/// Either side may be absent; only the values that are present are compared
/// against the capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParams {
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

impl RouteParams {
    pub fn new(participant_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            participant_id: Some(participant_id.into()),
            item_id: Some(item_id.into()),
        }
    }
}
