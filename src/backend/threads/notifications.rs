//! Mailbox routes for the capability's user.
//!
//! - `GET  /notifications?limit=N`              - newest first
//! - `POST /notifications/{created_at}/read`    - mark one entry read

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::backend::error::BackendResult;
use crate::backend::middleware::CapabilityAuth;
use crate::backend::server::state::AppState;
use crate::shared::Notification;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<usize>,
}

impl NotificationQuery {
    fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    CapabilityAuth(capability): CapabilityAuth,
    Query(query): Query<NotificationQuery>,
) -> BackendResult<Json<Vec<Notification>>> {
    let notifications = state
        .notifications
        .list(capability.user_id(), query.page_size())
        .await?;
    Ok(Json(notifications))
}

/// 204 when marked, 404 when the entry does not exist or has expired
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CapabilityAuth(capability): CapabilityAuth,
    Path(created_at): Path<DateTime<Utc>>,
) -> BackendResult<StatusCode> {
    let marked = state
        .notifications
        .mark_read(capability.user_id(), created_at)
        .await?;

    Ok(if marked {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}
