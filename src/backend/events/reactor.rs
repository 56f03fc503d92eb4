/**
 * Status-Change Reactor
 *
 * Applies thread status transitions to the follow store.
 *
 * # Transition Table
 *
 * Statuses fall into two phases: OPEN (`waiting_for_participant`,
 * `waiting_for_trainer`) and CLOSED (`closed`, `not_started`).
 *
 * | former | new    | effect                                                   |
 * |--------|--------|----------------------------------------------------------|
 * | CLOSED | OPEN   | clear every expiry, then follow participant and updater  |
 * | OPEN   | CLOSED | expire every follower `retention` from now               |
 * | OPEN   | OPEN   | nothing                                                  |
 * | CLOSED | CLOSED | nothing                                                  |
 *
 * `not_started` only ever appears as a former status. A transition *to*
 * `not_started` is logged and ignored.
 *
 * Expiry is cleared before the inserts so a follower added by this reopen
 * never picks up a stale expiry.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::backend::error::BackendResult;
use crate::backend::events::dispatcher::EventHandler;
use crate::backend::store::FollowStore;
use crate::shared::{EventEnvelope, StatusChanged, StatusPhase, ThreadStatus};

/// Days followers of a closed thread are kept before being reaped
pub const DEFAULT_CLOSED_RETENTION_DAYS: i64 = 14;

/// What a transition did to the follower set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// CLOSED to OPEN: `retained` had their expiry cleared, `ensured` were followed
    Reopened {
        retained: Vec<String>,
        ensured: Vec<String>,
    },
    /// OPEN to CLOSED: every follower now expires at `expires_at`
    Closing { expires_at: DateTime<Utc> },
    /// Same phase on both sides
    Unchanged,
    /// A pair outside the transition table
    Unrecognised,
}

#[derive(Clone)]
pub struct StatusChangeReactor {
    follows: Arc<dyn FollowStore>,
    retention: Duration,
}

impl StatusChangeReactor {
    pub fn new(follows: Arc<dyn FollowStore>, retention: Duration) -> Self {
        Self { follows, retention }
    }

    pub fn with_default_retention(follows: Arc<dyn FollowStore>) -> Self {
        Self::new(follows, Duration::days(DEFAULT_CLOSED_RETENTION_DAYS))
    }

    pub async fn apply(&self, change: &StatusChanged) -> BackendResult<Transition> {
        let thread = change.thread()?;

        if change.new_status == ThreadStatus::NotStarted {
            tracing::warn!(
                thread = %thread,
                "[Reactor] Ignoring unexpected transition {} -> {}",
                change.former_status,
                change.new_status
            );
            return Ok(Transition::Unrecognised);
        }

        match (change.former_status.phase(), change.new_status.phase()) {
            (StatusPhase::Closed, StatusPhase::Open) => {
                let retained = self.follows.clear_expiry_for_all(&thread).await?;

                let mut ensured = vec![change.participant_id.clone()];
                if change.updated_by_id != change.participant_id {
                    ensured.push(change.updated_by_id.clone());
                }
                for user_id in &ensured {
                    self.follows.insert(&thread, user_id, None).await?;
                }

                tracing::info!(
                    thread = %thread,
                    retained = retained.len(),
                    "[Reactor] Thread reopened"
                );
                Ok(Transition::Reopened { retained, ensured })
            }
            (StatusPhase::Open, StatusPhase::Closed) => {
                let expires_at = Utc::now() + self.retention;
                self.follows.set_expiry_for_all(&thread, expires_at).await?;

                tracing::info!(thread = %thread, %expires_at, "[Reactor] Thread closed, followers expiring");
                Ok(Transition::Closing { expires_at })
            }
            _ => {
                tracing::debug!(
                    thread = %thread,
                    "[Reactor] No-op transition {} -> {}",
                    change.former_status,
                    change.new_status
                );
                Ok(Transition::Unchanged)
            }
        }
    }
}

#[async_trait]
impl EventHandler for StatusChangeReactor {
    async fn handle(&self, envelope: Arc<EventEnvelope>) -> BackendResult<()> {
        let change: StatusChanged = envelope.decode_payload()?;
        self.apply(&change).await?;
        Ok(())
    }
}
