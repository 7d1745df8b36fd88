//! Meeting endpoints: listing, details, reschedule, delete
//!
//! Meetings come into existence through invitation acceptance (see webex.rs);
//! these endpoints manage them afterwards.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mirror_common::db::models::Meeting;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::auth_middleware::AuthAccount;
use crate::api::parse_client_time;
use crate::api::webex::{current_account, ensure_fresh_webex_token, parse_stored_time};
use crate::db::{format_rfc3339, meetings, now_rfc3339, profiles};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MeetingDto {
    pub id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub web_link: Option<String>,
    pub password: Option<String>,
    pub creator_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeetingRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
}

async fn meeting_dto(state: &AppState, meeting: &Meeting) -> ApiResult<MeetingDto> {
    let creator_name = meetings::creator_name(&state.db, &meeting.guid)
        .await?
        .unwrap_or_default();

    Ok(MeetingDto {
        id: meeting.guid.clone(),
        title: meeting.title.clone(),
        start_time: meeting.start_time.clone(),
        end_time: meeting.end_time.clone(),
        web_link: meeting.web_link.clone(),
        password: meeting.password.clone(),
        creator_name,
    })
}

/// Resolve the caller's profile, the meeting, and the caller's role in it.
/// Non-members get 403.
async fn authorized_meeting(
    state: &AppState,
    auth: &AuthAccount,
    meeting_id: &str,
) -> ApiResult<(Meeting, bool)> {
    let profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let meeting = meetings::find_by_guid(&state.db, meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

    let is_creator = meeting.creator_profile_guid == profile.guid;
    let is_participant = meetings::is_participant(&state.db, &meeting.guid, &profile.guid).await?;

    if !(is_creator || is_participant) {
        return Err(ApiError::Forbidden(
            "Not a member of this meeting".to_string(),
        ));
    }

    Ok((meeting, is_creator))
}

/// GET /api/meetings
///
/// Upcoming meetings where the caller's profile is creator or participant.
pub async fn upcoming(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<Value>> {
    let Some(profile) = profiles::first_for_account(&state.db, &auth.account_guid).await? else {
        return Ok(Json(json!({ "meetings": [] })));
    };

    let upcoming =
        meetings::list_upcoming_for_profile(&state.db, &profile.guid, &now_rfc3339()).await?;

    let mut result = Vec::with_capacity(upcoming.len());
    for meeting in &upcoming {
        result.push(meeting_dto(&state, meeting).await?);
    }

    Ok(Json(json!({ "meetings": result })))
}

/// GET /api/webex/meeting/:id
pub async fn get_meeting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (meeting, is_creator) = authorized_meeting(&state, &auth, &id).await?;

    let dto = meeting_dto(&state, &meeting).await?;
    let mut value = serde_json::to_value(dto).unwrap_or_default();
    value["is_creator"] = json!(is_creator);

    Ok(Json(value))
}

/// PUT /api/webex/meeting/:id
///
/// Creator-only reschedule. The change goes to WebEx first (when the meeting
/// is linked there), then to the database.
pub async fn update_meeting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
    Json(body): Json<UpdateMeetingRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let (meeting, is_creator) = authorized_meeting(&state, &auth, &id).await?;

    if !is_creator {
        return Err(ApiError::Forbidden(
            "Only the creator can update meetings".to_string(),
        ));
    }

    let account = current_account(&state, &auth).await?;
    if !account.webex_connected() {
        return Err(ApiError::Forbidden(
            "WebEx not connected. Cannot update meeting".to_string(),
        ));
    }

    let start = match &body.start_time {
        Some(s) => parse_client_time(s)
            .ok_or_else(|| ApiError::BadRequest("Invalid date format".to_string()))?,
        None => parse_stored_time(&meeting.start_time)?,
    };
    let end = match &body.end_time {
        Some(s) => parse_client_time(s)
            .ok_or_else(|| ApiError::BadRequest("Invalid date format".to_string()))?,
        None => parse_stored_time(&meeting.end_time)?,
    };

    if end <= start {
        return Err(ApiError::BadRequest(
            "Meeting end time must be after its start time".to_string(),
        ));
    }

    if let Some(webex_id) = &meeting.webex_id {
        let access_token = ensure_fresh_webex_token(&state, &account).await?;
        state
            .webex
            .update_meeting(&access_token, webex_id, &meeting.title, start, end)
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to update meeting: {}", e)))?;
    }

    meetings::update_times(
        &state.db,
        &meeting.guid,
        &format_rfc3339(start),
        &format_rfc3339(end),
    )
    .await?;

    info!(meeting = %meeting.guid, "Meeting rescheduled");

    Ok(Json(StatusResponse {
        msg: "Meeting updated successfully".to_string(),
    }))
}

/// DELETE /api/webex/meeting/:id
pub async fn delete_meeting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let (meeting, is_creator) = authorized_meeting(&state, &auth, &id).await?;

    if !is_creator {
        return Err(ApiError::Forbidden(
            "Only the creator can delete meetings".to_string(),
        ));
    }

    let account = current_account(&state, &auth).await?;
    if !account.webex_connected() {
        return Err(ApiError::Forbidden(
            "WebEx not connected. Cannot delete meeting".to_string(),
        ));
    }

    if let Some(webex_id) = &meeting.webex_id {
        let access_token = ensure_fresh_webex_token(&state, &account).await?;
        state
            .webex
            .delete_meeting(&access_token, webex_id)
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to delete meeting: {}", e)))?;
    }

    meetings::delete_meeting(&state.db, &meeting.guid).await?;

    info!(meeting = %meeting.guid, "Meeting deleted");

    Ok(Json(StatusResponse {
        msg: "Meeting deleted successfully".to_string(),
    }))
}
