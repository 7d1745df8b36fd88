//! Friend request endpoint
//!
//! A request from A to B while B's request to A is still pending counts as
//! mutual consent: the pair collapses into an accepted friendship instead of
//! a second pending row.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::auth_middleware::AuthAccount;
use crate::db::{friends, profiles};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub profile_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendRequestResponse {
    pub msg: String,
    pub status: String,
}

/// POST /api/friends/request
pub async fn send_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<FriendRequestBody>,
) -> ApiResult<(StatusCode, Json<FriendRequestResponse>)> {
    let sender_profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let target_id = body
        .profile_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Target profile id is required".to_string()))?;

    let target_profile = profiles::find_by_guid(&state.db, &target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Target profile not found".to_string()))?;

    if sender_profile.guid == target_profile.guid {
        return Err(ApiError::BadRequest(
            "Cannot add yourself as a friend".to_string(),
        ));
    }

    if friends::are_friends(&state.db, &sender_profile.guid, &target_profile.guid).await? {
        return Err(ApiError::BadRequest("Already friends".to_string()));
    }

    if friends::find_pending_request(&state.db, &sender_profile.guid, &target_profile.guid)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Friend request already sent".to_string(),
        ));
    }

    // Mutual consent: the target already asked us - accept instead of queueing
    let reverse =
        friends::find_pending_request(&state.db, &target_profile.guid, &sender_profile.guid)
            .await?;

    if let Some(reverse_request) = reverse {
        friends::accept_mutual_request(
            &state.db,
            &reverse_request.guid,
            &sender_profile.guid,
            &target_profile.guid,
            &target_profile.account_guid,
            "Friend Request Accepted",
            &format!("{} accepted your friend request!", sender_profile.name),
        )
        .await?;

        info!(
            from = %sender_profile.guid,
            to = %target_profile.guid,
            "Mutual friend requests collapsed into friendship"
        );

        return Ok((
            StatusCode::OK,
            Json(FriendRequestResponse {
                msg: "Friend request accepted (mutual)".to_string(),
                status: "accepted".to_string(),
            }),
        ));
    }

    friends::insert_request_with_notification(
        &state.db,
        &sender_profile.guid,
        &target_profile.guid,
        &target_profile.account_guid,
        "New Friend Request",
        "friend_request_received",
    )
    .await?;

    info!(
        from = %sender_profile.guid,
        to = %target_profile.guid,
        "Friend request sent"
    );

    Ok((
        StatusCode::CREATED,
        Json(FriendRequestResponse {
            msg: "Friend request sent".to_string(),
            status: "pending".to_string(),
        }),
    ))
}
