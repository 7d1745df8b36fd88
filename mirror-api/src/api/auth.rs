//! Authentication endpoints: register, login, current-user aggregate

use axum::{extract::State, http::StatusCode, Extension, Json};
use mirror_common::auth::{hash_password, password_meets_policy, verify_password};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::api::auth_middleware::AuthAccount;
use crate::db::{accounts, friends, notifications, profiles, recent_calls};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub organization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub msg: String,
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDto {
    pub id: String,
    pub profile_id: String,
    pub profile_name: String,
    pub location: Option<String>,
    pub added_date: String,
    pub friendship_status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRequestDto {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub location: Option<String>,
    pub sent_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCallDto {
    pub id: String,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    pub timestamp: String,
    pub duration: i64,
    #[serde(rename = "type")]
    pub call_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeProfileDto {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub class_size: Option<i64>,
    pub interests: Option<Value>,
    pub availability: Option<Value>,
    pub friends: Vec<FriendDto>,
    #[serde(rename = "receivedFriendRequests")]
    pub received_friend_requests: Vec<ReceivedRequestDto>,
    pub recent_calls: Vec<RecentCallDto>,
}

#[derive(Debug, Serialize)]
pub struct MeAccountDto {
    pub id: String,
    pub email: String,
    pub organization: Option<String>,
    pub notifications: Vec<NotificationDto>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account: MeAccountDto,
    pub profiles: Vec<MeProfileDto>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let email = body
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;

    if !password_meets_policy(&password) {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters and include one uppercase, \
             one lowercase, one digit, and one special character"
                .to_string(),
        ));
    }

    if accounts::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Account already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let account_guid =
        accounts::insert_account(&state.db, &email, &password_hash, body.organization.as_deref())
            .await?;

    info!(account = %account_guid, "Registered new account");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            msg: "Account created successfully".to_string(),
            account_id: account_guid,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = body
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing email or password".to_string()))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing email or password".to_string()))?;

    let account = accounts::find_by_email(&state.db, &email).await?;

    let Some(account) = account else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    if !verify_password(&password, &account.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = state.jwt.issue(&account.guid)?;

    Ok(Json(LoginResponse {
        access_token,
        account_id: account.guid,
    }))
}

/// GET /api/auth/me
///
/// Aggregate view of the authenticated account: notifications plus
/// per-profile friends, pending friend requests, and recent calls.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<MeResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let notifications = notifications::list_for_account(&state.db, &account.guid)
        .await?
        .into_iter()
        .map(|n| NotificationDto {
            id: n.guid,
            title: n.title,
            message: n.message,
            kind: n.kind,
            read: n.read,
            timestamp: n.created_at,
        })
        .collect();

    let mut profile_dtos = Vec::new();
    for profile in profiles::list_by_account(&state.db, &account.guid).await? {
        let friends = friends::list_friends(&state.db, &profile.guid)
            .await?
            .into_iter()
            .map(|f| FriendDto {
                id: f.profile_guid.clone(),
                profile_id: f.profile_guid,
                profile_name: f.profile_name,
                location: f.location,
                added_date: f.added_at,
                friendship_status: "accepted".to_string(),
            })
            .collect();

        let received_friend_requests = friends::list_pending_received(&state.db, &profile.guid)
            .await?
            .into_iter()
            .map(|r| ReceivedRequestDto {
                id: r.guid,
                sender_id: r.sender_profile_guid,
                sender_name: r.sender_name,
                location: r.sender_location,
                sent_date: r.created_at,
            })
            .collect();

        let recent_calls = recent_calls::list_for_profile(&state.db, &profile.guid)
            .await?
            .into_iter()
            .map(|c| RecentCallDto {
                id: c.guid,
                profile_id: c.target_profile_guid,
                profile_name: c.target_name,
                timestamp: c.created_at,
                duration: c.duration_seconds,
                call_type: c.call_type,
            })
            .collect();

        profile_dtos.push(MeProfileDto {
            id: profile.guid,
            name: profile.name,
            location: profile.location,
            latitude: profile.latitude,
            longitude: profile.longitude,
            class_size: profile.class_size,
            interests: profile.interests,
            availability: profile.availability,
            friends,
            received_friend_requests,
            recent_calls,
        });
    }

    Ok(Json(MeResponse {
        account: MeAccountDto {
            id: account.guid,
            email: account.email,
            organization: account.organization,
            notifications,
        },
        profiles: profile_dtos,
    }))
}
