//! Posts feed database operations

use anyhow::Result;
use mirror_common::db::models::Post;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashSet;

use super::{new_guid, now_rfc3339};

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        guid: row.get("guid"),
        profile_guid: row.get("profile_guid"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        quoted_post_guid: row.get("quoted_post_guid"),
        likes: row.get("likes"),
        comments_count: row.get("comments_count"),
        created_at: row.get("created_at"),
    }
}

const POST_COLUMNS: &str =
    "guid, profile_guid, content, image_url, quoted_post_guid, likes, comments_count, created_at";

/// Feed row: post plus author name plus resolved quoted post (if any)
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: Post,
    pub author_name: String,
    pub quoted: Option<QuotedPost>,
}

#[derive(Debug, Clone)]
pub struct QuotedPost {
    pub guid: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
}

pub async fn insert_post(
    pool: &SqlitePool,
    profile_guid: &str,
    content: &str,
    image_url: Option<&str>,
    quoted_post_guid: Option<&str>,
) -> Result<String> {
    let guid = new_guid();

    sqlx::query(
        r#"
        INSERT INTO posts (guid, profile_guid, content, image_url, quoted_post_guid,
                           likes, comments_count, created_at)
        VALUES (?, ?, ?, ?, ?, 0, 0, ?)
        "#,
    )
    .bind(&guid)
    .bind(profile_guid)
    .bind(content)
    .bind(image_url)
    .bind(quoted_post_guid)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(guid)
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE guid = ?", POST_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(row_to_post))
}

/// Full feed, newest first, with author names and quoted posts resolved in
/// one pass
pub async fn list_feed(pool: &SqlitePool) -> Result<Vec<FeedEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT p.guid, p.profile_guid, p.content, p.image_url, p.quoted_post_guid,
               p.likes, p.comments_count, p.created_at,
               author.name AS author_name,
               q.guid AS q_guid, q.content AS q_content, q.image_url AS q_image_url,
               q_author.name AS q_author_name
        FROM posts p
        JOIN profiles author ON author.guid = p.profile_guid
        LEFT JOIN posts q ON q.guid = p.quoted_post_guid
        LEFT JOIN profiles q_author ON q_author.guid = q.profile_guid
        ORDER BY p.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let quoted = row
                .get::<Option<String>, _>("q_guid")
                .map(|q_guid| QuotedPost {
                    guid: q_guid,
                    author_name: row
                        .get::<Option<String>, _>("q_author_name")
                        .unwrap_or_default(),
                    content: row.get::<Option<String>, _>("q_content").unwrap_or_default(),
                    image_url: row.get("q_image_url"),
                });

            FeedEntry {
                post: row_to_post(row),
                author_name: row.get("author_name"),
                quoted,
            }
        })
        .collect())
}

/// Single feed entry for the create-post response
pub async fn feed_entry(pool: &SqlitePool, post_guid: &str) -> Result<Option<FeedEntry>> {
    let entries = list_feed(pool).await?;
    Ok(entries.into_iter().find(|e| e.post.guid == post_guid))
}

/// Post guids the account has liked
pub async fn liked_post_guids(pool: &SqlitePool, account_guid: &str) -> Result<HashSet<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT post_guid FROM post_likes WHERE account_guid = ?")
            .bind(account_guid)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn has_liked(pool: &SqlitePool, post_guid: &str, account_guid: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM post_likes WHERE post_guid = ? AND account_guid = ?",
    )
    .bind(post_guid)
    .bind(account_guid)
    .fetch_one(pool)
    .await?;

    Ok(row.0 > 0)
}

/// Record a like; returns the new like count
pub async fn like_post(pool: &SqlitePool, post_guid: &str, account_guid: &str) -> Result<i64> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO post_likes (post_guid, account_guid, created_at) VALUES (?, ?, ?)",
    )
    .bind(post_guid)
    .bind(account_guid)
    .bind(now_rfc3339())
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE posts SET likes = likes + 1 WHERE guid = ?")
        .bind(post_guid)
        .execute(&mut *tx)
        .await?;

    let (likes,): (i64,) = sqlx::query_as("SELECT likes FROM posts WHERE guid = ?")
        .bind(post_guid)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes)
}

/// Remove a like; the counter never drops below zero
pub async fn unlike_post(pool: &SqlitePool, post_guid: &str, account_guid: &str) -> Result<i64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM post_likes WHERE post_guid = ? AND account_guid = ?")
        .bind(post_guid)
        .bind(account_guid)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE posts SET likes = MAX(likes - 1, 0) WHERE guid = ?")
        .bind(post_guid)
        .execute(&mut *tx)
        .await?;

    let (likes,): (i64,) = sqlx::query_as("SELECT likes FROM posts WHERE guid = ?")
        .bind(post_guid)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes)
}
