//! Integration tests for mirror-api core endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Registration with password policy and duplicate-email conflict
//! - Login and JWT validation (valid, expired, malformed, missing)
//! - Account aggregate view and cascade delete
//! - Profile CRUD with cross-account access control

use axum::http::StatusCode;
use serde_json::json;

mod helpers;
use helpers::{create_profile, register_and_login, send_json, setup_app, test_keys};

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send_json(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mirror-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Registration Tests
// =============================================================================

#[tokio::test]
async fn test_register_creates_account() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "new@example.com", "password": "Password123!", "organization": "Acme"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["account_id"].is_string());
}

#[tokio::test]
async fn test_register_rejects_weak_passwords() {
    let (app, _dir) = setup_app().await;

    for password in ["short1!", "alllowercase1!", "ALLUPPERCASE1!", "NoDigits!!", "NoSpecial123"] {
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "weak@example.com", "password": password})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "password {:?} should be rejected", password);
    }
}

#[tokio::test]
async fn test_register_missing_fields() {
    let (app, _dir) = setup_app().await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "only@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let (app, _dir) = setup_app().await;

    register_and_login(&app, "dup@example.com").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "dup@example.com", "password": "Password123!"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Login / JWT Tests
// =============================================================================

#[tokio::test]
async fn test_login_wrong_password_rejected() {
    let (app, _dir) = setup_app().await;

    register_and_login(&app, "login@example.com").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "login@example.com", "password": "WrongPassword1!"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_email_rejected() {
    let (app, _dir) = setup_app().await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ghost@example.com", "password": "Password123!"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _dir) = setup_app().await;

    let (status, _) = send_json(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "GET", "/api/auth/me", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (app, _dir) = setup_app().await;

    let (_, account_id) = register_and_login(&app, "expired@example.com").await;

    let expired = test_keys().issue_with_ttl(&account_id, -3600).unwrap();

    let (status, _) = send_json(&app, "GET", "/api/auth/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_authorizes() {
    let (app, _dir) = setup_app().await;

    let (token, account_id) = register_and_login(&app, "valid@example.com").await;

    let (status, body) = send_json(&app, "GET", "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["id"], account_id.as_str());
    assert_eq!(body["account"]["email"], "valid@example.com");
    assert!(body["profiles"].is_array());
}

// =============================================================================
// Profile CRUD Tests
// =============================================================================

#[tokio::test]
async fn test_profile_create_and_fetch() {
    let (app, _dir) = setup_app().await;

    let (token, account_id) = register_and_login(&app, "prof@example.com").await;
    let profile_id = create_profile(&app, &token, "Class 5B").await;

    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/profiles/{}", profile_id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Class 5B");
    assert_eq!(body["account_id"], account_id.as_str());
    assert_eq!(body["interests"], json!(["coding", "math"]));
    assert_eq!(body["class_size"], 30);
}

#[tokio::test]
async fn test_profile_update_partial() {
    let (app, _dir) = setup_app().await;

    let (token, _) = register_and_login(&app, "patch@example.com").await;
    let profile_id = create_profile(&app, &token, "Original Name").await;

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/profiles/{}", profile_id),
        Some(&token),
        Some(json!({"name": "New Name"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "New Name");
    // Untouched fields survive a partial update
    assert_eq!(body["location"], "London");
}

#[tokio::test]
async fn test_cross_account_profile_modification_forbidden() {
    let (app, _dir) = setup_app().await;

    let (owner_token, _) = register_and_login(&app, "owner@example.com").await;
    let profile_id = create_profile(&app, &owner_token, "Owner Class").await;

    let (intruder_token, _) = register_and_login(&app, "intruder@example.com").await;

    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/profiles/{}", profile_id),
        Some(&intruder_token),
        Some(json!({"name": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/profiles/{}", profile_id),
        Some(&intruder_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reads stay open to any authenticated account
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/profiles/{}", profile_id),
        Some(&intruder_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_profile_404() {
    let (app, _dir) = setup_app().await;

    let (token, _) = register_and_login(&app, "lost@example.com").await;

    let (status, _) = send_json(
        &app,
        "GET",
        "/api/profiles/00000000-0000-0000-0000-000000000099",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Account Tests
// =============================================================================

#[tokio::test]
async fn test_account_update_email_conflict() {
    let (app, _dir) = setup_app().await;

    register_and_login(&app, "taken@example.com").await;
    let (token, _) = register_and_login(&app, "mover@example.com").await;

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/account",
        Some(&token),
        Some(json!({"email": "taken@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_account_delete_cascades_to_profiles() {
    let (app, _dir) = setup_app().await;

    let (token, _) = register_and_login(&app, "cascade@example.com").await;
    let profile_id = create_profile(&app, &token, "Doomed Class").await;

    let (status, _) = send_json(&app, "DELETE", "/api/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Login no longer possible
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "cascade@example.com", "password": "Password123!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Profile is gone with the account
    let (viewer_token, _) = register_and_login(&app, "viewer@example.com").await;
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/profiles/{}", profile_id),
        Some(&viewer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
