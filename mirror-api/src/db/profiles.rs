//! Profile database operations

use anyhow::Result;
use mirror_common::db::models::Profile;
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

const PROFILE_COLUMNS: &str = "guid, account_guid, name, location, latitude, longitude, \
     class_size, interests, availability, metadata, created_at";

fn parse_json_column(row: &SqliteRow, column: &str) -> Option<Value> {
    row.get::<Option<String>, _>(column)
        .and_then(|s| serde_json::from_str(&s).ok())
}

pub(crate) fn row_to_profile(row: &SqliteRow) -> Profile {
    Profile {
        guid: row.get("guid"),
        account_guid: row.get("account_guid"),
        name: row.get("name"),
        location: row.get("location"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        class_size: row.get("class_size"),
        interests: parse_json_column(row, "interests"),
        availability: parse_json_column(row, "availability"),
        metadata: parse_json_column(row, "metadata"),
        created_at: row.get("created_at"),
    }
}

/// Field set for insert/update; Nones stay NULL
#[derive(Debug, Default, Clone)]
pub struct ProfileFields {
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub class_size: Option<i64>,
    pub interests: Option<Value>,
    pub availability: Option<Value>,
    pub metadata: Option<Value>,
}

pub async fn insert_profile(
    pool: &SqlitePool,
    account_guid: &str,
    fields: &ProfileFields,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO profiles (guid, account_guid, name, location, latitude, longitude,
                              class_size, interests, availability, metadata,
                              created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(account_guid)
    .bind(&fields.name)
    .bind(&fields.location)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(fields.class_size)
    .bind(fields.interests.as_ref().map(|v| v.to_string()))
    .bind(fields.availability.as_ref().map(|v| v.to_string()))
    .bind(fields.metadata.as_ref().map(|v| v.to_string()))
    .bind(now_rfc3339())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<Profile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM profiles WHERE guid = ?",
        PROFILE_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_profile))
}

pub async fn list_by_account(pool: &SqlitePool, account_guid: &str) -> Result<Vec<Profile>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM profiles WHERE account_guid = ? ORDER BY created_at",
        PROFILE_COLUMNS
    ))
    .bind(account_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_profile).collect())
}

/// Oldest profile of the account
///
/// Friend requests, posts, and meeting invitations act on behalf of the
/// account's first profile.
pub async fn first_for_account(pool: &SqlitePool, account_guid: &str) -> Result<Option<Profile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM profiles WHERE account_guid = ? ORDER BY created_at LIMIT 1",
        PROFILE_COLUMNS
    ))
    .bind(account_guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_profile))
}

pub async fn update_profile(pool: &SqlitePool, guid: &str, fields: &ProfileFields) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE profiles
        SET name = ?, location = ?, latitude = ?, longitude = ?, class_size = ?,
            interests = ?, availability = ?, metadata = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.location)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(fields.class_size)
    .bind(fields.interests.as_ref().map(|v| v.to_string()))
    .bind(fields.availability.as_ref().map(|v| v.to_string()))
    .bind(fields.metadata.as_ref().map(|v| v.to_string()))
    .bind(now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_profile(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query("DELETE FROM profiles WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}
