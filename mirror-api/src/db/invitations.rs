//! Meeting invitation database operations

use anyhow::Result;
use mirror_common::db::models::{InvitationStatus, Meeting, MeetingInvitation};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

fn row_to_invitation(row: &SqliteRow) -> MeetingInvitation {
    let status: String = row.get("status");
    MeetingInvitation {
        guid: row.get("guid"),
        sender_profile_guid: row.get("sender_profile_guid"),
        receiver_profile_guid: row.get("receiver_profile_guid"),
        title: row.get("title"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        status: InvitationStatus::parse(&status).unwrap_or(InvitationStatus::Pending),
        meeting_guid: row.get("meeting_guid"),
        created_at: row.get("created_at"),
    }
}

const INVITATION_COLUMNS: &str = "guid, sender_profile_guid, receiver_profile_guid, title, \
     start_time, end_time, status, meeting_guid, created_at";

/// Invitation listing entry with the counterparty's display name
#[derive(Debug, Clone)]
pub struct InvitationEntry {
    pub invitation: MeetingInvitation,
    pub counterparty_name: String,
}

pub async fn insert_invitation(
    pool: &SqlitePool,
    sender_profile_guid: &str,
    receiver_profile_guid: &str,
    title: &str,
    start_time: &str,
    end_time: &str,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO meeting_invitations
            (guid, sender_profile_guid, receiver_profile_guid, title, start_time, end_time, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&guid)
    .bind(sender_profile_guid)
    .bind(receiver_profile_guid)
    .bind(title)
    .bind(start_time)
    .bind(end_time)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<MeetingInvitation>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM meeting_invitations WHERE guid = ?",
        INVITATION_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_invitation))
}

/// Pending invitations received by a profile, newest first, with sender name
pub async fn list_pending_received(
    pool: &SqlitePool,
    profile_guid: &str,
) -> Result<Vec<InvitationEntry>> {
    list_pending(pool, profile_guid, "receiver_profile_guid", "sender_profile_guid").await
}

/// Pending invitations sent by a profile, newest first, with receiver name
pub async fn list_pending_sent(
    pool: &SqlitePool,
    profile_guid: &str,
) -> Result<Vec<InvitationEntry>> {
    list_pending(pool, profile_guid, "sender_profile_guid", "receiver_profile_guid").await
}

async fn list_pending(
    pool: &SqlitePool,
    profile_guid: &str,
    filter_column: &str,
    counterparty_column: &str,
) -> Result<Vec<InvitationEntry>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT i.guid, i.sender_profile_guid, i.receiver_profile_guid, i.title,
               i.start_time, i.end_time, i.status, i.meeting_guid, i.created_at,
               p.name AS counterparty_name
        FROM meeting_invitations i
        JOIN profiles p ON p.guid = i.{counterparty}
        WHERE i.{filter} = ? AND i.status = 'pending'
        ORDER BY i.created_at DESC
        "#,
        counterparty = counterparty_column,
        filter = filter_column,
    ))
    .bind(profile_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| InvitationEntry {
            invitation: row_to_invitation(row),
            counterparty_name: row.get("counterparty_name"),
        })
        .collect())
}

pub async fn set_status(pool: &SqlitePool, guid: &str, status: InvitationStatus) -> Result<()> {
    sqlx::query("UPDATE meeting_invitations SET status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Accept an invitation: insert the meeting and participant rows, flip the
/// invitation to accepted, and link the meeting - atomically
pub async fn accept_with_meeting(
    pool: &SqlitePool,
    invitation_guid: &str,
    meeting: &Meeting,
    participant_profile_guid: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;

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
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO meeting_participants (meeting_guid, profile_guid) VALUES (?, ?)")
        .bind(&meeting.guid)
        .bind(participant_profile_guid)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE meeting_invitations SET status = 'accepted', meeting_guid = ? WHERE guid = ?",
    )
    .bind(&meeting.guid)
    .bind(invitation_guid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
