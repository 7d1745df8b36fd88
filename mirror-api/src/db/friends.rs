//! Social graph database operations: friend requests and accepted relations

use anyhow::Result;
use mirror_common::db::models::{FriendRequest, RequestStatus};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

fn row_to_request(row: &SqliteRow) -> FriendRequest {
    let status: String = row.get("status");
    FriendRequest {
        guid: row.get("guid"),
        sender_profile_guid: row.get("sender_profile_guid"),
        receiver_profile_guid: row.get("receiver_profile_guid"),
        status: RequestStatus::parse(&status).unwrap_or(RequestStatus::Pending),
        created_at: row.get("created_at"),
    }
}

/// Friend entry for aggregate DTOs: the other profile plus edge metadata
#[derive(Debug, Clone)]
pub struct FriendEdge {
    pub profile_guid: String,
    pub profile_name: String,
    pub location: Option<String>,
    pub added_at: String,
}

/// Pending request entry with sender details
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub guid: String,
    pub sender_profile_guid: String,
    pub sender_name: String,
    pub sender_location: Option<String>,
    pub created_at: String,
}

/// True when an accepted edge exists between the two profiles in either
/// direction
pub async fn are_friends(pool: &SqlitePool, a: &str, b: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM relations
        WHERE (from_profile_guid = ? AND to_profile_guid = ?)
           OR (from_profile_guid = ? AND to_profile_guid = ?)
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_one(pool)
    .await?;

    Ok(row.0 > 0)
}

pub async fn find_pending_request(
    pool: &SqlitePool,
    sender: &str,
    receiver: &str,
) -> Result<Option<FriendRequest>> {
    let row = sqlx::query(
        r#"
        SELECT guid, sender_profile_guid, receiver_profile_guid, status, created_at
        FROM friend_requests
        WHERE sender_profile_guid = ? AND receiver_profile_guid = ? AND status = 'pending'
        "#,
    )
    .bind(sender)
    .bind(receiver)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_request))
}

/// Insert a pending request together with the receiver's notification
pub async fn insert_request_with_notification(
    pool: &SqlitePool,
    sender_profile_guid: &str,
    receiver_profile_guid: &str,
    receiver_account_guid: &str,
    notification_title: &str,
    notification_kind: &str,
) -> Result<String> {
    let mut tx = pool.begin().await?;
    let request_guid = new_guid();
    let now = now_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO friend_requests (guid, sender_profile_guid, receiver_profile_guid, status, created_at)
        VALUES (?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&request_guid)
    .bind(sender_profile_guid)
    .bind(receiver_profile_guid)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO notifications (guid, account_guid, title, message, kind, read, related_guid, created_at)
        VALUES (?, ?, ?, '', ?, 0, ?, ?)
        "#,
    )
    .bind(new_guid())
    .bind(receiver_account_guid)
    .bind(notification_title)
    .bind(notification_kind)
    .bind(sender_profile_guid)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(request_guid)
}

/// Auto-accept a mutual pair of requests
///
/// Flips the reverse request to accepted, inserts both directed relation
/// rows, and notifies the original requester - atomically. The unique index
/// on relations makes a double-accept fail the transaction rather than
/// duplicate the edge.
pub async fn accept_mutual_request(
    pool: &SqlitePool,
    reverse_request_guid: &str,
    sender_profile_guid: &str,
    target_profile_guid: &str,
    target_account_guid: &str,
    notification_title: &str,
    notification_message: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let now = now_rfc3339();

    sqlx::query("UPDATE friend_requests SET status = 'accepted' WHERE guid = ?")
        .bind(reverse_request_guid)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO relations (guid, from_profile_guid, to_profile_guid, status, created_at)
         VALUES (?, ?, ?, 'accepted', ?)",
    )
    .bind(new_guid())
    .bind(target_profile_guid)
    .bind(sender_profile_guid)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO relations (guid, from_profile_guid, to_profile_guid, status, created_at)
         VALUES (?, ?, ?, 'accepted', ?)",
    )
    .bind(new_guid())
    .bind(sender_profile_guid)
    .bind(target_profile_guid)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO notifications (guid, account_guid, title, message, kind, read, related_guid, created_at)
        VALUES (?, ?, ?, ?, 'success', 0, ?, ?)
        "#,
    )
    .bind(new_guid())
    .bind(target_account_guid)
    .bind(notification_title)
    .bind(notification_message)
    .bind(sender_profile_guid)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Accepted friends of a profile, looking at edges in both directions
///
/// Mutual acceptance writes a row per direction; the GROUP BY collapses the
/// pair (and any legacy single-direction row) into one friend entry.
pub async fn list_friends(pool: &SqlitePool, profile_guid: &str) -> Result<Vec<FriendEdge>> {
    let rows = sqlx::query(
        r#"
        SELECT p.guid AS friend_guid, p.name AS friend_name, p.location AS friend_location,
               MIN(r.created_at) AS added_at
        FROM (
            SELECT to_profile_guid AS other, created_at FROM relations
            WHERE from_profile_guid = ? AND status = 'accepted'
            UNION
            SELECT from_profile_guid AS other, created_at FROM relations
            WHERE to_profile_guid = ? AND status = 'accepted'
        ) r
        JOIN profiles p ON p.guid = r.other
        GROUP BY p.guid, p.name, p.location
        ORDER BY added_at
        "#,
    )
    .bind(profile_guid)
    .bind(profile_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| FriendEdge {
            profile_guid: row.get("friend_guid"),
            profile_name: row.get("friend_name"),
            location: row.get("friend_location"),
            added_at: row.get("added_at"),
        })
        .collect())
}

/// Pending requests received by a profile, with sender details
pub async fn list_pending_received(
    pool: &SqlitePool,
    profile_guid: &str,
) -> Result<Vec<PendingRequest>> {
    let rows = sqlx::query(
        r#"
        SELECT fr.guid, fr.sender_profile_guid, fr.created_at,
               p.name AS sender_name, p.location AS sender_location
        FROM friend_requests fr
        JOIN profiles p ON p.guid = fr.sender_profile_guid
        WHERE fr.receiver_profile_guid = ? AND fr.status = 'pending'
        ORDER BY fr.created_at DESC
        "#,
    )
    .bind(profile_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PendingRequest {
            guid: row.get("guid"),
            sender_profile_guid: row.get("sender_profile_guid"),
            sender_name: row.get("sender_name"),
            sender_location: row.get("sender_location"),
            created_at: row.get("created_at"),
        })
        .collect())
}
