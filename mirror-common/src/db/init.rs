//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. Every table uses `CREATE TABLE IF NOT EXISTS`, so calling
//! `init_database` repeatedly is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
///
/// Connection options apply per-connection: cascade deletes depend on
/// foreign_keys being ON for every pooled connection, not just the first.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL allows concurrent readers with one writer
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Connect to an in-memory database with the full schema (test support)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    // A single connection: in-memory databases are per-connection
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create the full schema (idempotent)
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_accounts_table(pool).await?;
    create_profiles_table(pool).await?;
    create_friend_requests_table(pool).await?;
    create_relations_table(pool).await?;
    create_notifications_table(pool).await?;
    create_posts_table(pool).await?;
    create_post_likes_table(pool).await?;
    create_meetings_table(pool).await?;
    create_meeting_participants_table(pool).await?;
    create_meeting_invitations_table(pool).await?;
    create_recent_calls_table(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores service configuration key-value pairs (JWT secret among them).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_accounts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            guid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            organization TEXT,
            webex_access_token TEXT,
            webex_refresh_token TEXT,
            webex_token_expires_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            guid TEXT PRIMARY KEY,
            account_guid TEXT NOT NULL REFERENCES accounts(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            location TEXT,
            latitude REAL,
            longitude REAL,
            class_size INTEGER,
            interests TEXT,
            availability TEXT,
            metadata TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_account ON profiles(account_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_friend_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS friend_requests (
            guid TEXT PRIMARY KEY,
            sender_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            receiver_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (status IN ('pending', 'accepted', 'rejected'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_friend_requests_receiver
         ON friend_requests(receiver_profile_guid, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the relations table
///
/// An accepted friendship is stored as two directed rows, one per direction.
/// The unique index keeps a pair from accumulating duplicate edges.
async fn create_relations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relations (
            guid TEXT PRIMARY KEY,
            from_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            to_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'accepted',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (from_profile_guid, to_profile_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            guid TEXT PRIMARY KEY,
            account_guid TEXT NOT NULL REFERENCES accounts(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            message TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT 'info',
            read INTEGER NOT NULL DEFAULT 0,
            related_guid TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notifications_account
         ON notifications(account_guid, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            guid TEXT PRIMARY KEY,
            profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            content TEXT NOT NULL,
            image_url TEXT,
            quoted_post_guid TEXT REFERENCES posts(guid),
            likes INTEGER NOT NULL DEFAULT 0,
            comments_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (likes >= 0),
            CHECK (comments_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_post_likes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_likes (
            post_guid TEXT NOT NULL REFERENCES posts(guid) ON DELETE CASCADE,
            account_guid TEXT NOT NULL REFERENCES accounts(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (post_guid, account_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_meetings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meetings (
            guid TEXT PRIMARY KEY,
            webex_id TEXT,
            title TEXT NOT NULL,
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NOT NULL,
            web_link TEXT,
            password TEXT,
            creator_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (end_time > start_time)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_meetings_start ON meetings(start_time)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_meeting_participants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meeting_participants (
            meeting_guid TEXT NOT NULL REFERENCES meetings(guid) ON DELETE CASCADE,
            profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            PRIMARY KEY (meeting_guid, profile_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_meeting_invitations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meeting_invitations (
            guid TEXT PRIMARY KEY,
            sender_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            receiver_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            meeting_guid TEXT REFERENCES meetings(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (status IN ('pending', 'accepted', 'declined', 'cancelled')),
            CHECK (end_time > start_time)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_invitations_receiver
         ON meeting_invitations(receiver_profile_guid, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_recent_calls_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recent_calls (
            guid TEXT PRIMARY KEY,
            caller_profile_guid TEXT NOT NULL REFERENCES profiles(guid) ON DELETE CASCADE,
            target_profile_guid TEXT,
            target_name TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            call_type TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recent_calls_caller
         ON recent_calls(caller_profile_guid, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
