/**
 * Follow Store
 *
 * Durable per-user follow registrations, one record per (thread, follower).
 *
 * # Invariants
 *
 * - At most one live record per (thread, user): `insert` is idempotent and a
 *   repeated insert leaves the original `inserted_at` and `expires_at` alone.
 * - `expires_at` present means the record is scheduled for removal; once it
 *   passes the record is treated as absent and is reaped in the background.
 * - Nothing fails on "not found". Absence is a normal outcome.
 *
 * # Bulk Expiry
 *
 * `set_expiry_for_all` and `clear_expiry_for_all` read the current follower
 * set and then write each record. A follow racing with them may be missed;
 * the next status transition re-derives membership.
 */

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::backend::error::BackendResult;
use crate::shared::ThreadId;

/// One follow registration as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRecord {
    pub thread: ThreadId,
    pub user_id: String,
    pub inserted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl FollowRecord {
    /// Whether the record's expiry has passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Follower entry returned by `list_followers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Follower {
    pub user_id: String,
    pub inserted_at: DateTime<Utc>,
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Whether `user_id` currently follows `thread`
    async fn exists(&self, thread: &ThreadId, user_id: &str) -> BackendResult<bool>;

    /// Fetch the live record for (thread, user), if any
    async fn get(&self, thread: &ThreadId, user_id: &str) -> BackendResult<Option<FollowRecord>>;

    /// Register a follower; a no-op when the user already follows the thread
    ///
    /// `ttl`, when given, sets `expires_at = now + ttl` on the new record.
    async fn insert(&self, thread: &ThreadId, user_id: &str, ttl: Option<Duration>) -> BackendResult<()>;

    /// Remove every record for (thread, user); a no-op when absent
    async fn remove(&self, thread: &ThreadId, user_id: &str) -> BackendResult<()>;

    /// Current followers in insertion order
    async fn list_followers(&self, thread: &ThreadId) -> BackendResult<Vec<Follower>>;

    /// Schedule every current follower of `thread` for removal at `expires_at`
    async fn set_expiry_for_all(&self, thread: &ThreadId, expires_at: DateTime<Utc>) -> BackendResult<()>;

    /// Clear the expiry of every current follower and return their user ids
    async fn clear_expiry_for_all(&self, thread: &ThreadId) -> BackendResult<Vec<String>>;

    /// Physically delete records whose expiry is at or before `now`
    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize>;
}
