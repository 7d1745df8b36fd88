//! Meeting database operations

use anyhow::Result;
use mirror_common::db::models::Meeting;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::now_rfc3339;

fn row_to_meeting(row: &SqliteRow) -> Meeting {
    Meeting {
        guid: row.get("guid"),
        webex_id: row.get("webex_id"),
        title: row.get("title"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        web_link: row.get("web_link"),
        password: row.get("password"),
        creator_profile_guid: row.get("creator_profile_guid"),
        created_at: row.get("created_at"),
    }
}

const MEETING_COLUMNS: &str = "guid, webex_id, title, start_time, end_time, web_link, \
     password, creator_profile_guid, created_at";

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<Meeting>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM meetings WHERE guid = ?",
        MEETING_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_meeting))
}

pub async fn is_participant(pool: &SqlitePool, meeting_guid: &str, profile_guid: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM meeting_participants WHERE meeting_guid = ? AND profile_guid = ?",
    )
    .bind(meeting_guid)
    .bind(profile_guid)
    .fetch_one(pool)
    .await?;

    Ok(row.0 > 0)
}

/// Upcoming meetings where the profile is creator or participant, ascending
/// by start time
pub async fn list_upcoming_for_profile(
    pool: &SqlitePool,
    profile_guid: &str,
    now: &str,
) -> Result<Vec<Meeting>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT DISTINCT {} FROM (
            SELECT m.* FROM meetings m WHERE m.creator_profile_guid = ?
            UNION
            SELECT m.* FROM meetings m
            JOIN meeting_participants mp ON mp.meeting_guid = m.guid
            WHERE mp.profile_guid = ?
        )
        WHERE start_time >= ?
        ORDER BY start_time
        "#,
        MEETING_COLUMNS
    ))
    .bind(profile_guid)
    .bind(profile_guid)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_meeting).collect())
}

/// Display name of a meeting's creator profile
pub async fn creator_name(pool: &SqlitePool, meeting_guid: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT p.name FROM meetings m
        JOIN profiles p ON p.guid = m.creator_profile_guid
        WHERE m.guid = ?
        "#,
    )
    .bind(meeting_guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

pub async fn update_times(
    pool: &SqlitePool,
    guid: &str,
    start_time: &str,
    end_time: &str,
) -> Result<()> {
    sqlx::query("UPDATE meetings SET start_time = ?, end_time = ? WHERE guid = ?")
        .bind(start_time)
        .bind(end_time)
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_meeting(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query("DELETE FROM meetings WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert a meeting row directly (used by tests and the invitation-accept
/// flow through invitations::accept_with_meeting)
pub async fn insert_meeting(pool: &SqlitePool, meeting: &Meeting) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meetings (guid, webex_id, title, start_time, end_time, web_link,
                              password, creator_profile_guid, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&meeting.guid)
    .bind(&meeting.webex_id)
    .bind(&meeting.title)
    .bind(&meeting.start_time)
    .bind(&meeting.end_time)
    .bind(&meeting.web_link)
    .bind(&meeting.password)
    .bind(&meeting.creator_profile_guid)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn add_participant(pool: &SqlitePool, meeting_guid: &str, profile_guid: &str) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO meeting_participants (meeting_guid, profile_guid) VALUES (?, ?)",
    )
    .bind(meeting_guid)
    .bind(profile_guid)
    .execute(pool)
    .await?;

    Ok(())
}
