/**
 * Thread Route Configuration
 *
 * - `PUT    /threads/{participant_id}/{item_id}/follow`
 * - `DELETE /threads/{participant_id}/{item_id}/follow`
 * - `GET    /threads/{participant_id}/{item_id}/followers`
 * - `GET    /notifications`
 * - `POST   /notifications/{created_at}/read`
 */

use axum::routing::{get, post, put};
use axum::Router;

use crate::backend::server::state::AppState;
use crate::backend::threads::{
    follow_thread, list_followers, list_notifications, mark_notification_read, unfollow_thread,
};

/// Add follow and mailbox routes to `router`
pub fn configure_thread_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/threads/{participant_id}/{item_id}/follow",
            put(follow_thread).delete(unfollow_thread),
        )
        .route("/threads/{participant_id}/{item_id}/followers", get(list_followers))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{created_at}/read", post(mark_notification_read))
}
