/**
 * Thread Identity and Status
 *
 * A thread is the conversation between one participant and one item. Every
 * thread-scoped record (follows, subscriptions) is partitioned by `ThreadId`.
 *
 * # Status Phases
 *
 * Thread statuses fall into two phases:
 * - **Open** - `waiting_for_participant`, `waiting_for_trainer`
 * - **Closed** - `closed`, `not_started`
 *
 * Follower retention only changes when a thread crosses between phases.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::SharedError;

/// Identifies one thread: a (participant, item) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadId {
    pub participant_id: String,
    pub item_id: String,
}

impl ThreadId {
    /// Create a thread id, rejecting empty components
    pub fn new(
        participant_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let participant_id = participant_id.into();
        let item_id = item_id.into();

        if participant_id.trim().is_empty() {
            return Err(SharedError::validation("participantId", "must not be empty"));
        }
        if item_id.trim().is_empty() {
            return Err(SharedError::validation("itemId", "must not be empty"));
        }

        Ok(Self {
            participant_id,
            item_id,
        })
    }

    /// Storage partition key, `"{participant_id}#{item_id}"`
    ///
    /// `\` and `#` inside either part are backslash-escaped, so distinct
    /// threads never share a key.
    pub fn partition_key(&self) -> String {
        let mut key = String::with_capacity(self.participant_id.len() + self.item_id.len() + 1);
        push_escaped(&mut key, &self.participant_id);
        key.push('#');
        push_escaped(&mut key, &self.item_id);
        key
    }
}

fn push_escaped(key: &mut String, part: &str) {
    for c in part.chars() {
        if c == '#' || c == '\\' {
            key.push('\\');
        }
        key.push(c);
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.participant_id, self.item_id)
    }
}

/// Lifecycle status of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    WaitingForParticipant,
    WaitingForTrainer,
    Closed,
    NotStarted,
}

/// Whether a status keeps followers alive or lets them expire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    Open,
    Closed,
}

impl ThreadStatus {
    pub fn phase(self) -> StatusPhase {
        match self {
            Self::WaitingForParticipant | Self::WaitingForTrainer => StatusPhase::Open,
            Self::Closed | Self::NotStarted => StatusPhase::Closed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForParticipant => "waiting_for_participant",
            Self::WaitingForTrainer => "waiting_for_trainer",
            Self::Closed => "closed",
            Self::NotStarted => "not_started",
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThreadStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_for_participant" => Ok(Self::WaitingForParticipant),
            "waiting_for_trainer" => Ok(Self::WaitingForTrainer),
            "closed" => Ok(Self::Closed),
            "not_started" => Ok(Self::NotStarted),
            other => Err(SharedError::validation(
                "status",
                format!("unknown thread status '{}'", other),
            )),
        }
    }
}
