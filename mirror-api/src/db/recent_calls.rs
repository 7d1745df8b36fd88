//! Recent call log database operations

use anyhow::Result;
use mirror_common::db::models::RecentCall;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

fn row_to_call(row: &SqliteRow) -> RecentCall {
    RecentCall {
        guid: row.get("guid"),
        caller_profile_guid: row.get("caller_profile_guid"),
        target_profile_guid: row.get("target_profile_guid"),
        target_name: row.get("target_name"),
        duration_seconds: row.get("duration_seconds"),
        call_type: row.get("call_type"),
        created_at: row.get("created_at"),
    }
}

pub async fn insert_call(
    pool: &SqlitePool,
    caller_profile_guid: &str,
    target_profile_guid: Option<&str>,
    target_name: Option<&str>,
    duration_seconds: i64,
    call_type: Option<&str>,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO recent_calls
            (guid, caller_profile_guid, target_profile_guid, target_name, duration_seconds, call_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(caller_profile_guid)
    .bind(target_profile_guid)
    .bind(target_name)
    .bind(duration_seconds)
    .bind(call_type)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Calls placed by a profile, newest first
pub async fn list_for_profile(pool: &SqlitePool, profile_guid: &str) -> Result<Vec<RecentCall>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, caller_profile_guid, target_profile_guid, target_name,
               duration_seconds, call_type, created_at
        FROM recent_calls
        WHERE caller_profile_guid = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(profile_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_call).collect())
}
