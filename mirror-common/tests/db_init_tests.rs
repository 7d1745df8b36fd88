//! Unit tests for database initialization and schema invariants
//!
//! Tests cover:
//! - Automatic database creation with default schema
//! - Idempotent re-initialization
//! - Foreign-key cascade from accounts to profiles
//! - Uniqueness constraints (account email, relation edges)
//! - CHECK constraints on meeting times

use mirror_common::db::init::{init_database, init_memory_database};
use std::path::PathBuf;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let test_db = format!("/tmp/mirror-test-db-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    // Ensure database doesn't exist
    let _ = std::fs::remove_file(&db_path);

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");

    // Cleanup
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let test_db = format!("/tmp/mirror-test-db-existing-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Open database second time (should succeed - schema creation is idempotent)
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    drop(pool1);
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_email_uniqueness_enforced() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO accounts (guid, email, password_hash) VALUES ('a1', 'dup@example.com', 'h')")
        .execute(&pool)
        .await
        .unwrap();

    let dup = sqlx::query("INSERT INTO accounts (guid, email, password_hash) VALUES ('a2', 'dup@example.com', 'h')")
        .execute(&pool)
        .await;

    assert!(dup.is_err(), "Duplicate email should violate UNIQUE constraint");
}

#[tokio::test]
async fn test_account_delete_cascades_to_profiles() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO accounts (guid, email, password_hash) VALUES ('a1', 'c@example.com', 'h')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO profiles (guid, account_guid, name) VALUES ('p1', 'a1', 'Class 1')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM accounts WHERE guid = 'a1'")
        .execute(&pool)
        .await
        .unwrap();

    let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE guid = 'p1'")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(remaining.0, 0, "Profile should be deleted with its account");
}

#[tokio::test]
async fn test_relation_edge_uniqueness() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO accounts (guid, email, password_hash) VALUES ('a1', 'r@example.com', 'h')")
        .execute(&pool)
        .await
        .unwrap();
    for p in ["p1", "p2"] {
        sqlx::query("INSERT INTO profiles (guid, account_guid, name) VALUES (?, 'a1', 'Class')")
            .bind(p)
            .execute(&pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO relations (guid, from_profile_guid, to_profile_guid) VALUES ('r1', 'p1', 'p2')")
        .execute(&pool)
        .await
        .unwrap();

    // Same direction again must fail
    let dup = sqlx::query("INSERT INTO relations (guid, from_profile_guid, to_profile_guid) VALUES ('r2', 'p1', 'p2')")
        .execute(&pool)
        .await;
    assert!(dup.is_err(), "Duplicate directed edge should violate UNIQUE constraint");

    // Reverse direction is a distinct row and must succeed
    sqlx::query("INSERT INTO relations (guid, from_profile_guid, to_profile_guid) VALUES ('r3', 'p2', 'p1')")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_jwt_secret_generated_and_persisted() {
    use mirror_common::auth::load_jwt_secret;

    let pool = init_memory_database().await.unwrap();

    let first = load_jwt_secret(&pool).await.unwrap();
    assert!(!first.is_empty());

    // Second load returns the persisted secret, not a fresh one
    let second = load_jwt_secret(&pool).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_meeting_end_after_start_check() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO accounts (guid, email, password_hash) VALUES ('a1', 'm@example.com', 'h')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO profiles (guid, account_guid, name) VALUES ('p1', 'a1', 'Class')")
        .execute(&pool)
        .await
        .unwrap();

    let bad = sqlx::query(
        "INSERT INTO meetings (guid, title, start_time, end_time, creator_profile_guid)
         VALUES ('m1', 'Backwards', '2026-01-02T10:00:00+00:00', '2026-01-02T09:00:00+00:00', 'p1')",
    )
    .execute(&pool)
    .await;

    assert!(bad.is_err(), "end_time <= start_time should violate CHECK constraint");

    let good = sqlx::query(
        "INSERT INTO meetings (guid, title, start_time, end_time, creator_profile_guid)
         VALUES ('m2', 'Forwards', '2026-01-02T09:00:00+00:00', '2026-01-02T10:00:00+00:00', 'p1')",
    )
    .execute(&pool)
    .await;

    assert!(good.is_ok());
}
