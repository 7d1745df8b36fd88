//! Account endpoints

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::auth_middleware::AuthAccount;
use crate::db::accounts;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub organization: Option<String>,
    pub webex_connected: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub organization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
}

/// GET /api/account
pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<AccountResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(AccountResponse {
        webex_connected: account.webex_connected(),
        id: account.guid,
        email: account.email,
        organization: account.organization,
        created_at: account.created_at,
    }))
}

/// PUT /api/account
///
/// Updates email and/or organization. An omitted field keeps its value; an
/// email change re-checks uniqueness.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let email = match body.email {
        Some(new_email) if new_email != account.email => {
            if new_email.trim().is_empty() {
                return Err(ApiError::BadRequest("Email must not be empty".to_string()));
            }
            if accounts::find_by_email(&state.db, &new_email).await?.is_some() {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
            new_email
        }
        _ => account.email,
    };

    let organization = body.organization.or(account.organization);

    accounts::update_contact(&state.db, &account.guid, &email, organization.as_deref()).await?;

    let updated = accounts::find_by_guid(&state.db, &account.guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(AccountResponse {
        webex_connected: updated.webex_connected(),
        id: updated.guid,
        email: updated.email,
        organization: updated.organization,
        created_at: updated.created_at,
    }))
}

/// DELETE /api/account
///
/// Removes the account; profiles and their dependents go with it.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
) -> ApiResult<Json<StatusResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    accounts::delete_account(&state.db, &account.guid).await?;

    info!(account = %account.guid, "Deleted account");

    Ok(Json(StatusResponse {
        msg: "Account deleted".to_string(),
    }))
}
