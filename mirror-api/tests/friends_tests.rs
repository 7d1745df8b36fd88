//! Integration tests for the social graph
//!
//! Tests cover:
//! - Friend request creation and duplicate suppression
//! - Mutual requests collapsing into a single accepted friendship
//! - Self-friending rejection
//! - Notifications generated as a side effect

use axum::http::StatusCode;
use serde_json::json;

mod helpers;
use helpers::{create_profile, register_and_login, send_json, setup_app};

/// Two accounts, one profile each; returns (token_a, profile_a, token_b, profile_b)
async fn two_profiles(app: &axum::Router) -> (String, String, String, String) {
    let (token_a, _) = register_and_login(app, "alice@example.com").await;
    let profile_a = create_profile(app, &token_a, "Alice Class").await;

    let (token_b, _) = register_and_login(app, "bob@example.com").await;
    let profile_b = create_profile(app, &token_b, "Bob Class").await;

    (token_a, profile_a, token_b, profile_b)
}

#[tokio::test]
async fn test_friend_request_pending() {
    let (app, _dir) = setup_app().await;
    let (token_a, _profile_a, _token_b, profile_b) = two_profiles(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_duplicate_friend_request_rejected() {
    let (app, _dir) = setup_app().await;
    let (token_a, _profile_a, _token_b, profile_b) = two_profiles(&app).await;

    send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_self_friend_request_rejected() {
    let (app, _dir) = setup_app().await;

    let (token, _) = register_and_login(&app, "solo@example.com").await;
    let profile = create_profile(&app, &token, "Solo Class").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token),
        Some(json!({"profileId": profile})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_to_unknown_profile_404() {
    let (app, _dir) = setup_app().await;

    let (token, _) = register_and_login(&app, "asker@example.com").await;
    create_profile(&app, &token, "Asker Class").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token),
        Some(json!({"profileId": "00000000-0000-0000-0000-000000000042"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutual_requests_collapse_into_friendship() {
    let (app, _dir) = setup_app().await;
    let (token_a, profile_a, token_b, profile_b) = two_profiles(&app).await;

    // A asks B: pending
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // B asks A: mutual consent, auto-accepted
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_b),
        Some(json!({"profileId": profile_a})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    // Both sides see exactly one friend
    for (token, friend_id, friend_name) in [
        (&token_a, &profile_b, "Bob Class"),
        (&token_b, &profile_a, "Alice Class"),
    ] {
        let (status, body) = send_json(&app, "GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);

        let friends = body["profiles"][0]["friends"].as_array().unwrap();
        assert_eq!(friends.len(), 1, "exactly one friend entry expected");
        assert_eq!(friends[0]["profileId"], friend_id.as_str());
        assert_eq!(friends[0]["profileName"], friend_name);
        assert_eq!(friends[0]["friendshipStatus"], "accepted");
    }

    // No pending request remains on either side
    let (_, body) = send_json(&app, "GET", "/api/auth/me", Some(&token_a), None).await;
    assert_eq!(
        body["profiles"][0]["receivedFriendRequests"].as_array().unwrap().len(),
        0
    );

    // A third request in either direction bounces off "already friends"
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_friend_request_generates_notification() {
    let (app, _dir) = setup_app().await;
    let (token_a, _profile_a, token_b, profile_b) = two_profiles(&app).await;

    send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;

    let (status, body) = send_json(&app, "GET", "/api/notifications", Some(&token_b), None).await;

    assert_eq!(status, StatusCode::OK);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "New Friend Request");
    assert_eq!(notifications[0]["read"], false);
}

#[tokio::test]
async fn test_notification_read_and_delete_ownership() {
    let (app, _dir) = setup_app().await;
    let (token_a, _profile_a, token_b, profile_b) = two_profiles(&app).await;

    send_json(
        &app,
        "POST",
        "/api/friends/request",
        Some(&token_a),
        Some(json!({"profileId": profile_b})),
    )
    .await;

    let (_, body) = send_json(&app, "GET", "/api/notifications", Some(&token_b), None).await;
    let notif_id = body["notifications"][0]["id"].as_str().unwrap().to_string();

    // The sender cannot touch the receiver's notification (404, not 403)
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/notifications/{}/read", notif_id),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner can mark it read...
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/notifications/{}/read", notif_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/api/notifications", Some(&token_b), None).await;
    assert_eq!(body["notifications"][0]["read"], true);

    // ...and delete it
    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/notifications/{}", notif_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/api/notifications", Some(&token_b), None).await;
    assert_eq!(body["notifications"].as_array().unwrap().len(), 0);
}
