//! Shared helpers for mirror-api integration tests
#![allow(dead_code)] // each test binary uses a different subset

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use mirror_common::auth::JwtKeys;
use mirror_common::db::init::init_database;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use mirror_api::config::WebexConfig;
use mirror_api::services::{ChromaClient, WebexClient};
use mirror_api::{build_router, AppState};

pub const TEST_JWT_SECRET: &[u8] = b"integration-test-secret";

/// Chroma endpoint nothing listens on; integration calls fail fast with a
/// connection error
pub const DEAD_CHROMA_URL: &str = "http://127.0.0.1:1";

/// Build an app against a fresh temp-file database.
///
/// WebEx is configured with dummy credentials so auth-url works, but token
/// and meeting calls would hit the real vendor - tests only exercise paths
/// that fail before any outbound call.
pub async fn setup_app() -> (Router, TempDir) {
    let dir = TempDir::new().expect("Should create temp dir");
    let db_path = dir.path().join("mirror-test.db");

    let pool = init_database(&db_path)
        .await
        .expect("Should initialize test database");

    let jwt = JwtKeys::new(TEST_JWT_SECRET);

    let webex = Arc::new(
        WebexClient::new(Some(WebexConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost/callback".to_string(),
        }))
        .expect("Should build WebEx client"),
    );

    let chroma =
        Arc::new(ChromaClient::new(DEAD_CHROMA_URL, "test_documents").expect("Should build Chroma client"));

    let state = AppState::new(pool, jwt, webex, chroma);
    (build_router(state), dir)
}

/// Test keys matching the app's signing secret (for minting expired tokens)
pub fn test_keys() -> JwtKeys {
    JwtKeys::new(TEST_JWT_SECRET)
}

/// Send a JSON request; returns status and parsed body (Null when empty)
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register an account and log in; returns (token, account_id)
pub async fn register_and_login(app: &Router, email: &str) -> (String, String) {
    let (status, _) = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "Password123!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register should succeed");

    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "Password123!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login should succeed");

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["account_id"].as_str().unwrap().to_string(),
    )
}

/// Create a profile for the authenticated account; returns its id
pub async fn create_profile(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/profiles",
        Some(token),
        Some(serde_json::json!({
            "name": name,
            "location": "London",
            "latitude": 51.5074,
            "longitude": -0.1278,
            "class_size": 30,
            "interests": ["coding", "math"],
            "availability": {"monday": "9-5"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "profile creation should succeed");

    body["id"].as_str().unwrap().to_string()
}
