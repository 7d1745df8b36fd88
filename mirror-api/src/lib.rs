//! mirror-api library - MirrorMirror HTTP API server
//!
//! Account/profile management, friendships, posts, meeting scheduling with
//! WebEx, and semantic document search backed by ChromaDB.

use axum::Router;
use mirror_common::auth::JwtKeys;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

use services::{ChromaClient, WebexClient};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// JWT signing/verification keys
    pub jwt: JwtKeys,
    /// WebEx integration client
    pub webex: Arc<WebexClient>,
    /// ChromaDB integration client
    pub chroma: Arc<ChromaClient>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        jwt: JwtKeys,
        webex: Arc<WebexClient>,
        chroma: Arc<ChromaClient>,
    ) -> Self {
        Self {
            db,
            jwt,
            webex,
            chroma,
        }
    }
}

/// Build application router
///
/// Protected routes sit behind the bearer-token middleware; register, login,
/// the public feed read, and the health endpoint do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post, put};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    let protected = Router::new()
        .route("/api/auth/me", get(api::auth::me))
        .route(
            "/api/account",
            get(api::account::get_account)
                .put(api::account::update_account)
                .delete(api::account::delete_account),
        )
        .route(
            "/api/profiles",
            post(api::profiles::create_profile).get(api::profiles::list_profiles),
        )
        .route(
            "/api/profiles/:id",
            get(api::profiles::get_profile)
                .put(api::profiles::update_profile)
                .delete(api::profiles::delete_profile),
        )
        .route("/api/friends/request", post(api::friends::send_request))
        .route("/api/notifications", get(api::notifications::list))
        .route("/api/notifications/:id/read", post(api::notifications::mark_read))
        .route("/api/notifications/:id", delete(api::notifications::delete))
        .route("/api/posts", post(api::posts::create_post))
        .route("/api/posts/:id/like", post(api::posts::like))
        .route("/api/posts/:id/unlike", post(api::posts::unlike))
        .route("/api/meetings", get(api::meetings::upcoming))
        .route("/api/webex/auth-url", get(api::webex::auth_url))
        .route("/api/webex/connect", post(api::webex::connect))
        .route("/api/webex/status", get(api::webex::status))
        .route("/api/webex/disconnect", post(api::webex::disconnect))
        .route("/api/webex/meeting", post(api::webex::create_invitation))
        .route(
            "/api/webex/meeting/:id",
            get(api::meetings::get_meeting)
                .put(api::meetings::update_meeting)
                .delete(api::meetings::delete_meeting),
        )
        .route("/api/webex/invitations", get(api::webex::pending_invitations))
        .route("/api/webex/invitations/sent", get(api::webex::sent_invitations))
        .route("/api/webex/invitations/:id/accept", post(api::webex::accept_invitation))
        .route("/api/webex/invitations/:id/decline", post(api::webex::decline_invitation))
        .route("/api/webex/invitations/:id/cancel", post(api::webex::cancel_invitation))
        .route("/api/documents/upload", post(api::documents::upload))
        .route("/api/documents/query", post(api::documents::query))
        .route("/api/documents/delete", delete(api::documents::delete))
        .route("/api/documents/update", put(api::documents::update))
        .route("/api/documents/info", get(api::documents::info))
        .route("/api/calls", post(api::calls::log_call))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware::require_auth,
        ));

    // Public routes (no authentication); the feed read resolves an optional
    // bearer token itself to mark the caller's likes
    let public = Router::new()
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/posts", get(api::posts::feed))
        .merge(api::health::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
