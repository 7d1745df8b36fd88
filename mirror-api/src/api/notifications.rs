//! Notification endpoints
//!
//! A notification that does not exist and a notification owned by someone
//! else both answer 404 - ownership is not revealed.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::api::auth_middleware::AuthAccount;
use crate::db::notifications;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub related_id: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationDto>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<NotificationListResponse>> {
    let notifications = notifications::list_for_account(&state.db, &auth.account_guid)
        .await?
        .into_iter()
        .map(|n| NotificationDto {
            id: n.guid,
            title: n.title,
            message: n.message,
            kind: n.kind,
            read: n.read,
            related_id: n.related_guid,
            timestamp: n.created_at,
        })
        .collect();

    Ok(Json(NotificationListResponse { notifications }))
}

/// Fetch a notification, answering 404 unless it exists and belongs to the
/// caller
async fn owned_notification(
    state: &AppState,
    auth: &AuthAccount,
    id: &str,
) -> ApiResult<mirror_common::db::models::Notification> {
    let notification = notifications::find_by_guid(&state.db, id)
        .await?
        .filter(|n| n.account_guid == auth.account_guid)
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(notification)
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let notification = owned_notification(&state, &auth, &id).await?;

    notifications::mark_read(&state.db, &notification.guid).await?;

    Ok(Json(StatusResponse {
        msg: "Marked as read".to_string(),
    }))
}

/// DELETE /api/notifications/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let notification = owned_notification(&state, &auth, &id).await?;

    notifications::delete_notification(&state.db, &notification.guid).await?;

    Ok(Json(StatusResponse {
        msg: "Deleted".to_string(),
    }))
}
