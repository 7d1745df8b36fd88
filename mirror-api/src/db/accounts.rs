//! Account database operations

use anyhow::Result;
use mirror_common::db::models::Account;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_guid, now_rfc3339};

fn row_to_account(row: &SqliteRow) -> Account {
    Account {
        guid: row.get("guid"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        organization: row.get("organization"),
        webex_access_token: row.get("webex_access_token"),
        webex_refresh_token: row.get("webex_refresh_token"),
        webex_token_expires_at: row.get("webex_token_expires_at"),
        created_at: row.get("created_at"),
    }
}

const ACCOUNT_COLUMNS: &str = "guid, email, password_hash, organization, \
     webex_access_token, webex_refresh_token, webex_token_expires_at, created_at";

/// Insert a new account and return its guid
pub async fn insert_account(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    organization: Option<&str>,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO accounts (guid, email, password_hash, organization, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(email)
    .bind(password_hash)
    .bind(organization)
    .bind(now_rfc3339())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM accounts WHERE email = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_account))
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM accounts WHERE guid = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_account))
}

/// Update email/organization; caller has already checked email uniqueness
pub async fn update_contact(
    pool: &SqlitePool,
    guid: &str,
    email: &str,
    organization: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE accounts SET email = ?, organization = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(email)
    .bind(organization)
    .bind(now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete an account; profiles and dependents go with it via FK cascade
pub async fn delete_account(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query("DELETE FROM accounts WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Store WebEx OAuth tokens on the account
pub async fn set_webex_tokens(
    pool: &SqlitePool,
    guid: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET webex_access_token = ?,
            webex_refresh_token = COALESCE(?, webex_refresh_token),
            webex_token_expires_at = ?,
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_webex_tokens(pool: &SqlitePool, guid: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET webex_access_token = NULL,
            webex_refresh_token = NULL,
            webex_token_expires_at = NULL,
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}
