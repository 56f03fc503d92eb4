/**
 * Thread Follow Handlers
 *
 * HTTP surface for durable follows. Every route is scoped to the thread
 * named in its path and only accepts a capability issued for that thread.
 *
 * # Routes
 *
 * - `PUT    /threads/{participant_id}/{item_id}/follow`    - follow (204)
 * - `DELETE /threads/{participant_id}/{item_id}/follow`    - unfollow (204)
 * - `GET    /threads/{participant_id}/{item_id}/followers` - current followers
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::backend::error::BackendResult;
use crate::backend::middleware::ThreadScope;
use crate::backend::server::state::AppState;
use crate::backend::store::Follower;
use crate::shared::ThreadId;

#[derive(Debug, Serialize)]
pub struct FollowersResponse {
    pub thread: ThreadId,
    pub followers: Vec<Follower>,
}

/// Follow the thread as the capability's user
///
/// Idempotent; following twice keeps the original record.
pub async fn follow_thread(State(state): State<AppState>, scope: ThreadScope) -> BackendResult<StatusCode> {
    scope.capability.require_watch()?;
    state
        .follows
        .insert(&scope.thread, scope.capability.user_id(), None)
        .await?;

    tracing::info!(user_id = scope.capability.user_id(), "[Threads] Followed {}", scope.thread);
    Ok(StatusCode::NO_CONTENT)
}

/// Stop following; succeeds whether or not a follow existed
pub async fn unfollow_thread(State(state): State<AppState>, scope: ThreadScope) -> BackendResult<StatusCode> {
    state
        .follows
        .remove(&scope.thread, scope.capability.user_id())
        .await?;

    tracing::info!(user_id = scope.capability.user_id(), "[Threads] Unfollowed {}", scope.thread);
    Ok(StatusCode::NO_CONTENT)
}

/// Followers in insertion order
pub async fn list_followers(
    State(state): State<AppState>,
    scope: ThreadScope,
) -> BackendResult<Json<FollowersResponse>> {
    let followers = state.follows.list_followers(&scope.thread).await?;
    Ok(Json(FollowersResponse {
        thread: scope.thread,
        followers,
    }))
}
