//! Notification database operations

use anyhow::Result;
use mirror_common::db::models::Notification;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

fn row_to_notification(row: &SqliteRow) -> Notification {
    Notification {
        guid: row.get("guid"),
        account_guid: row.get("account_guid"),
        title: row.get("title"),
        message: row.get("message"),
        kind: row.get("kind"),
        read: row.get::<i64, _>("read") != 0,
        related_guid: row.get("related_guid"),
        created_at: row.get("created_at"),
    }
}

const NOTIFICATION_COLUMNS: &str =
    "guid, account_guid, title, message, kind, read, related_guid, created_at";

pub async fn insert_notification(
    pool: &SqlitePool,
    account_guid: &str,
    title: &str,
    message: &str,
    kind: &str,
    related_guid: Option<&str>,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO notifications (guid, account_guid, title, message, kind, read, related_guid, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(account_guid)
    .bind(title)
    .bind(message)
    .bind(kind)
    .bind(related_guid)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// All notifications for an account, newest first
pub async fn list_for_account(pool: &SqlitePool, account_guid: &str) -> Result<Vec<Notification>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM notifications WHERE account_guid = ? ORDER BY created_at DESC",
        NOTIFICATION_COLUMNS
    ))
    .bind(account_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_notification).collect())
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<Notification>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM notifications WHERE guid = ?",
        NOTIFICATION_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_notification))
}

pub async fn mark_read(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query("UPDATE notifications SET read = 1 WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_notification(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query("DELETE FROM notifications WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}
