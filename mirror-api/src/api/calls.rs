//! Recent call logging endpoint

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth_middleware::AuthAccount;
use crate::db::{profiles, recent_calls};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCallRequest {
    pub profile_id: Option<String>,
    pub target_profile_id: Option<String>,
    pub target_name: Option<String>,
    pub duration_seconds: Option<i64>,
    pub call_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogCallResponse {
    pub msg: String,
    pub id: String,
}

/// POST /api/calls
///
/// Records a call in the caller profile's history. The caller profile must
/// belong to the authenticated account.
pub async fn log_call(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<LogCallRequest>,
) -> ApiResult<(StatusCode, Json<LogCallResponse>)> {
    let profile_id = body
        .profile_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("profileId is required".to_string()))?;

    let profile = profiles::find_by_guid(&state.db, &profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if profile.account_guid != auth.account_guid {
        return Err(ApiError::Forbidden(
            "Cannot log calls for another account's profile".to_string(),
        ));
    }

    let guid = recent_calls::insert_call(
        &state.db,
        &profile.guid,
        body.target_profile_id.as_deref(),
        body.target_name.as_deref(),
        body.duration_seconds.unwrap_or(0),
        body.call_type.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(LogCallResponse {
            msg: "Call logged".to_string(),
            id: guid,
        }),
    ))
}
