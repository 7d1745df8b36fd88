//! WebEx OAuth connection and meeting invitation endpoints
//!
//! Scheduling is invitation-first: POST /api/webex/meeting records an
//! invitation, and the WebEx meeting itself is only created when the invitee
//! accepts - with the ORGANIZER's stored token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use mirror_common::db::models::{Account, InvitationStatus, Meeting, MeetingInvitation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::auth_middleware::AuthAccount;
use crate::api::parse_client_time;
use crate::db::{accounts, format_rfc3339, invitations, new_guid, notifications, profiles};
use crate::error::{ApiError, ApiResult};
use crate::services::WebexError;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatusResponse {
    pub connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub profile_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationDto {
    pub id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub status: InvitationStatus,
    pub created_at: String,
}

impl From<&MeetingInvitation> for InvitationDto {
    fn from(inv: &MeetingInvitation) -> Self {
        Self {
            id: inv.guid.clone(),
            title: inv.title.clone(),
            start_time: inv.start_time.clone(),
            end_time: inv.end_time.clone(),
            status: inv.status,
            created_at: inv.created_at.clone(),
        }
    }
}

// ============================================================================
// WebEx connection lifecycle
// ============================================================================

/// GET /api/webex/auth-url
pub async fn auth_url(State(state): State<AppState>) -> ApiResult<Json<AuthUrlResponse>> {
    let url = state
        .webex
        .authorization_url()
        .map_err(|_| ApiError::NotConfigured("WebEx integration not configured".to_string()))?;

    Ok(Json(AuthUrlResponse { url }))
}

/// POST /api/webex/connect
///
/// Exchanges the OAuth authorization code and stores the token set on the
/// account.
pub async fn connect(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<ConnectRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let account = current_account(&state, &auth).await?;

    let code = body
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing auth code".to_string()))?;

    let tokens = state.webex.exchange_code(&code).await.map_err(|e| match e {
        WebexError::NotConfigured => {
            ApiError::NotConfigured("WebEx integration not configured".to_string())
        }
        WebexError::TokenRejected => {
            ApiError::BadRequest("WebEx rejected the authorization code".to_string())
        }
        other => ApiError::Upstream(other.to_string()),
    })?;

    let expires_at = tokens
        .expires_in
        .map(|secs| format_rfc3339(Utc::now() + Duration::seconds(secs)));

    accounts::set_webex_tokens(
        &state.db,
        &account.guid,
        &tokens.access_token,
        tokens.refresh_token.as_deref(),
        expires_at.as_deref(),
    )
    .await?;

    info!(account = %account.guid, "WebEx connected");

    Ok(Json(StatusResponse {
        msg: "WebEx connected successfully".to_string(),
    }))
}

/// GET /api/webex/status
pub async fn status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<ConnectionStatusResponse>> {
    let account = current_account(&state, &auth).await?;

    Ok(Json(ConnectionStatusResponse {
        connected: account.webex_connected(),
    }))
}

/// POST /api/webex/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<StatusResponse>> {
    let account = current_account(&state, &auth).await?;

    accounts::clear_webex_tokens(&state.db, &account.guid).await?;

    Ok(Json(StatusResponse {
        msg: "Disconnected from WebEx successfully".to_string(),
    }))
}

// ============================================================================
// Invitations
// ============================================================================

/// POST /api/webex/meeting
///
/// Records a meeting invitation to another profile. Without explicit times
/// this proposes an instant meeting (now to now+1h).
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let creator_profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let target_id = body
        .profile_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("profile_id is required".to_string()))?;

    let receiver_profile = profiles::find_by_guid(&state.db, &target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Receiver profile not found".to_string()))?;

    if creator_profile.guid == receiver_profile.guid {
        return Err(ApiError::BadRequest(
            "You cannot invite your own profile".to_string(),
        ));
    }

    let (start_time, end_time) = resolve_invitation_times(&body)?;

    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "MirrorMirror Meeting".to_string());

    let guid = invitations::insert_invitation(
        &state.db,
        &creator_profile.guid,
        &receiver_profile.guid,
        &title,
        &format_rfc3339(start_time),
        &format_rfc3339(end_time),
    )
    .await?;

    notifications::insert_notification(
        &state.db,
        &receiver_profile.account_guid,
        "New Meeting Invitation",
        &format!("{} invited you to \"{}\"", creator_profile.name, title),
        "meeting_invitation",
        Some(&guid),
    )
    .await?;

    let invitation = invitations::find_by_guid(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Invitation vanished after insert".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "Meeting invitation sent successfully",
            "invitation": InvitationDto::from(&invitation),
        })),
    ))
}

/// Client-supplied times, or an instant meeting when absent. End must come
/// after start.
fn resolve_invitation_times(
    body: &CreateInvitationRequest,
) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = match (&body.start_time, &body.end_time) {
        (Some(start_str), Some(end_str)) => {
            let start = parse_client_time(start_str)
                .ok_or_else(|| ApiError::BadRequest("Invalid date format".to_string()))?;
            let end = parse_client_time(end_str)
                .ok_or_else(|| ApiError::BadRequest("Invalid date format".to_string()))?;
            (start, end)
        }
        _ => {
            let now = Utc::now();
            (now, now + Duration::hours(1))
        }
    };

    if end <= start {
        return Err(ApiError::BadRequest(
            "Meeting end time must be after its start time".to_string(),
        ));
    }

    Ok((start, end))
}

/// GET /api/webex/invitations
pub async fn pending_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<Value>> {
    let profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let entries = invitations::list_pending_received(&state.db, &profile.guid).await?;

    let invitations: Vec<Value> = entries
        .iter()
        .map(|e| {
            json!({
                "id": e.invitation.guid,
                "title": e.invitation.title,
                "start_time": e.invitation.start_time,
                "end_time": e.invitation.end_time,
                "status": e.invitation.status,
                "created_at": e.invitation.created_at,
                "sender_name": e.counterparty_name,
            })
        })
        .collect();

    Ok(Json(json!({ "invitations": invitations })))
}

/// GET /api/webex/invitations/sent
pub async fn sent_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<Value>> {
    let profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let entries = invitations::list_pending_sent(&state.db, &profile.guid).await?;

    let sent: Vec<Value> = entries
        .iter()
        .map(|e| {
            json!({
                "id": e.invitation.guid,
                "title": e.invitation.title,
                "start_time": e.invitation.start_time,
                "end_time": e.invitation.end_time,
                "status": e.invitation.status,
                "created_at": e.invitation.created_at,
                "receiver_name": e.counterparty_name,
            })
        })
        .collect();

    Ok(Json(json!({ "sent_invitations": sent })))
}

/// POST /api/webex/invitations/:id/accept
///
/// Accepting creates the WebEx meeting with the SENDER's token: the sender
/// proposed the meeting, so it lands on the sender's calendar.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let receiver_profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let invitation = invitations::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    if invitation.receiver_profile_guid != receiver_profile.guid {
        return Err(ApiError::Forbidden(
            "This invitation is not for you".to_string(),
        ));
    }

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "Invitation is already {}",
            invitation.status.as_str()
        )));
    }

    let sender_profile = profiles::find_by_guid(&state.db, &invitation.sender_profile_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organizer profile not found".to_string()))?;

    let sender_account = accounts::find_by_guid(&state.db, &sender_profile.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organizer account not found".to_string()))?;

    if !sender_account.webex_connected() {
        return Err(ApiError::Forbidden(
            "The meeting organizer's WebEx account is not connected".to_string(),
        ));
    }

    let access_token = ensure_fresh_webex_token(&state, &sender_account)
        .await
        .map_err(|e| {
            warn!("Failed to refresh organizer's WebEx token: {}", e);
            ApiError::Forbidden(
                "Failed to refresh the organizer's WebEx session. Please try again later"
                    .to_string(),
            )
        })?;

    let start = parse_stored_time(&invitation.start_time)?;
    let end = parse_stored_time(&invitation.end_time)?;

    let webex_meeting = state
        .webex
        .create_meeting(&access_token, &invitation.title, start, end)
        .await
        .map_err(|e| ApiError::Upstream(format!("Failed to create WebEx meeting: {}", e)))?;

    let meeting = Meeting {
        guid: new_guid(),
        webex_id: Some(webex_meeting.id.clone()),
        title: webex_meeting
            .title
            .clone()
            .unwrap_or_else(|| invitation.title.clone()),
        start_time: invitation.start_time.clone(),
        end_time: invitation.end_time.clone(),
        web_link: webex_meeting.web_link.clone(),
        password: webex_meeting.password.clone(),
        creator_profile_guid: invitation.sender_profile_guid.clone(),
        created_at: String::new(),
    };

    invitations::accept_with_meeting(&state.db, &invitation.guid, &meeting, &receiver_profile.guid)
        .await?;

    notifications::insert_notification(
        &state.db,
        &sender_account.guid,
        "Meeting Invitation Accepted",
        &format!("{} accepted \"{}\"", receiver_profile.name, invitation.title),
        "success",
        Some(&meeting.guid),
    )
    .await?;

    info!(invitation = %invitation.guid, meeting = %meeting.guid, "Invitation accepted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "Invitation accepted. Meeting created successfully!",
            "meeting": {
                "id": meeting.guid,
                "title": meeting.title,
                "web_link": meeting.web_link,
                "start_time": meeting.start_time,
                "end_time": meeting.end_time,
                "password": meeting.password,
            }
        })),
    ))
}

/// POST /api/webex/invitations/:id/decline
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let receiver_profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let invitation = invitations::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    if invitation.receiver_profile_guid != receiver_profile.guid {
        return Err(ApiError::Forbidden(
            "This invitation is not for you".to_string(),
        ));
    }

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "Invitation is already {}",
            invitation.status.as_str()
        )));
    }

    invitations::set_status(&state.db, &invitation.guid, InvitationStatus::Declined).await?;

    Ok(Json(StatusResponse {
        msg: "Invitation declined successfully".to_string(),
    }))
}

/// POST /api/webex/invitations/:id/cancel
///
/// Only the sender can cancel a pending invitation.
pub async fn cancel_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let sender_profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile found for account".to_string()))?;

    let invitation = invitations::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    if invitation.sender_profile_guid != sender_profile.guid {
        return Err(ApiError::Forbidden(
            "You can only cancel invitations you sent".to_string(),
        ));
    }

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::BadRequest(format!(
            "Cannot cancel {} invitation",
            invitation.status.as_str()
        )));
    }

    invitations::set_status(&state.db, &invitation.guid, InvitationStatus::Cancelled).await?;

    Ok(Json(StatusResponse {
        msg: "Invitation cancelled successfully".to_string(),
    }))
}

// ============================================================================
// Shared helpers
// ============================================================================

pub(crate) async fn current_account(state: &AppState, auth: &AuthAccount) -> ApiResult<Account> {
    accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
}

pub(crate) fn parse_stored_time(s: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ApiError::Internal(format!("Malformed stored timestamp: {}", s)))
}

/// Return a usable access token for the account, refreshing (and persisting)
/// it first when the stored one has expired.
pub(crate) async fn ensure_fresh_webex_token(
    state: &AppState,
    account: &Account,
) -> ApiResult<String> {
    let access_token = account
        .webex_access_token
        .clone()
        .ok_or_else(|| ApiError::Forbidden("WebEx not connected".to_string()))?;

    let expired = account
        .webex_token_expires_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc) < Utc::now())
        .unwrap_or(false);

    if !expired {
        return Ok(access_token);
    }

    let refresh_token = account
        .webex_refresh_token
        .clone()
        .ok_or_else(|| ApiError::Forbidden("WebEx session expired".to_string()))?;

    let tokens = state
        .webex
        .refresh_access_token(&refresh_token)
        .await
        .map_err(|e| ApiError::Upstream(format!("WebEx token refresh failed: {}", e)))?;

    let expires_at = tokens
        .expires_in
        .map(|secs| format_rfc3339(Utc::now() + Duration::seconds(secs)));

    accounts::set_webex_tokens(
        &state.db,
        &account.guid,
        &tokens.access_token,
        tokens.refresh_token.as_deref(),
        expires_at.as_deref(),
    )
    .await?;

    info!(account = %account.guid, "Refreshed WebEx access token");

    Ok(tokens.access_token)
}
