//! Profile CRUD endpoints
//!
//! Reads are open to any authenticated account; writes are owner-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use mirror_common::db::models::Profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::auth_middleware::AuthAccount;
use crate::db::profiles::{self, ProfileFields};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub class_size: Option<i64>,
    pub interests: Option<Value>,
    pub availability: Option<Value>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub class_size: Option<i64>,
    pub interests: Option<Value>,
    pub availability: Option<Value>,
    pub metadata: Option<Value>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.guid,
            account_id: p.account_guid,
            name: p.name,
            location: p.location,
            latitude: p.latitude,
            longitude: p.longitude,
            class_size: p.class_size,
            interests: p.interests,
            availability: p.availability,
            metadata: p.metadata,
            created_at: p.created_at,
        }
    }
}

fn validate_guid(id: &str) -> ApiResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("Invalid profile id: {}", id)))
}

/// POST /api/profiles
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Profile name is required".to_string()))?;

    let fields = ProfileFields {
        name,
        location: body.location,
        latitude: body.latitude,
        longitude: body.longitude,
        class_size: body.class_size,
        interests: body.interests,
        availability: body.availability,
        metadata: body.metadata,
    };

    let guid = profiles::insert_profile(&state.db, &auth.account_guid, &fields).await?;
    let profile = profiles::find_by_guid(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Profile vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// GET /api/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let list = profiles::list_by_account(&state.db, &auth.account_guid).await?;
    Ok(Json(list.into_iter().map(Into::into).collect()))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    validate_guid(&id)?;

    let profile = profiles::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile.into()))
}

/// PUT /api/profiles/:id
///
/// Partial update: omitted fields keep their stored values.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
    Json(body): Json<CreateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    validate_guid(&id)?;

    let existing = profiles::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if existing.account_guid != auth.account_guid {
        return Err(ApiError::Forbidden(
            "Cannot modify another account's profile".to_string(),
        ));
    }

    let fields = ProfileFields {
        name: body.name.filter(|n| !n.trim().is_empty()).unwrap_or(existing.name),
        location: body.location.or(existing.location),
        latitude: body.latitude.or(existing.latitude),
        longitude: body.longitude.or(existing.longitude),
        class_size: body.class_size.or(existing.class_size),
        interests: body.interests.or(existing.interests),
        availability: body.availability.or(existing.availability),
        metadata: body.metadata.or(existing.metadata),
    };

    profiles::update_profile(&state.db, &id, &fields).await?;

    let updated = profiles::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(updated.into()))
}

/// DELETE /api/profiles/:id
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    validate_guid(&id)?;

    let existing = profiles::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if existing.account_guid != auth.account_guid {
        return Err(ApiError::Forbidden(
            "Cannot delete another account's profile".to_string(),
        ));
    }

    profiles::delete_profile(&state.db, &id).await?;

    Ok(Json(StatusResponse {
        msg: "Profile deleted".to_string(),
    }))
}
