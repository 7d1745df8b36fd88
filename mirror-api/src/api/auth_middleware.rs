//! Bearer-token authentication middleware
//!
//! Every protected route runs through `require_auth`, which validates the
//! `Authorization: Bearer <jwt>` header and stores the authenticated account
//! guid as a request extension for handlers to pick up.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated account identity, injected as a request extension
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub account_guid: String,
}

/// Authentication middleware
///
/// Returns 401 for a missing, malformed, or invalid/expired token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.jwt.verify(&token).map_err(|e| {
        debug!("Token rejected: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request
        .extensions_mut()
        .insert(AuthAccount {
            account_guid: claims.sub,
        });

    Ok(next.run(request).await)
}

/// Extract the bearer token from a request's Authorization header
pub fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
