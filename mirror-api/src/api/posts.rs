//! Posts feed endpoints

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::auth_middleware::{bearer_token, AuthAccount};
use crate::db::{accounts, posts, profiles};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub quoted_post_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedPostDto {
    pub id: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub timestamp: String,
    pub likes: i64,
    pub comments: i64,
    pub is_liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_post: Option<QuotedPostDto>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostDto>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub msg: String,
    pub post: PostDto,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub msg: String,
    pub likes: i64,
}

fn to_dto(entry: posts::FeedEntry, liked: &HashSet<String>) -> PostDto {
    let is_liked = liked.contains(&entry.post.guid);
    PostDto {
        id: entry.post.guid,
        author_id: entry.post.profile_guid,
        author_name: entry.author_name,
        content: entry.post.content,
        image_url: entry.post.image_url,
        timestamp: entry.post.created_at,
        likes: entry.post.likes,
        comments: entry.post.comments_count,
        is_liked,
        quoted_post: entry.quoted.map(|q| QuotedPostDto {
            id: q.guid,
            author_name: q.author_name,
            content: q.content,
            image_url: q.image_url,
        }),
    }
}

/// GET /api/posts
///
/// Public read. A bearer token is optional; when present and valid, each
/// post's `isLiked` reflects the caller.
pub async fn feed(State(state): State<AppState>, request: Request) -> ApiResult<Json<FeedResponse>> {
    let liked = match bearer_token(&request)
        .and_then(|token| state.jwt.verify(&token).ok())
    {
        Some(claims) => posts::liked_post_guids(&state.db, &claims.sub).await?,
        None => HashSet::new(),
    };

    let entries = posts::list_feed(&state.db).await?;

    Ok(Json(FeedResponse {
        posts: entries.into_iter().map(|e| to_dto(e, &liked)).collect(),
    }))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Json(body): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CreatePostResponse>)> {
    let profile = profiles::first_for_account(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest("Profile not found. Create a profile first".to_string())
        })?;

    let content = body
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Content is required".to_string()))?;

    if let Some(quoted_id) = &body.quoted_post_id {
        if posts::find_by_guid(&state.db, quoted_id).await?.is_none() {
            return Err(ApiError::BadRequest("Quoted post not found".to_string()));
        }
    }

    let guid = posts::insert_post(
        &state.db,
        &profile.guid,
        &content,
        body.image_url.as_deref(),
        body.quoted_post_id.as_deref(),
    )
    .await?;

    let entry = posts::feed_entry(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Post vanished after insert".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            msg: "Post created successfully".to_string(),
            post: to_dto(entry, &HashSet::new()),
        }),
    ))
}

/// POST /api/posts/:id/like
///
/// Idempotent: liking a post twice answers with the current count.
pub async fn like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let post = posts::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if posts::has_liked(&state.db, &post.guid, &account.guid).await? {
        return Ok(Json(LikeResponse {
            msg: "Already liked".to_string(),
            likes: post.likes,
        }));
    }

    let likes = posts::like_post(&state.db, &post.guid, &account.guid).await?;

    Ok(Json(LikeResponse {
        msg: "Post liked".to_string(),
        likes,
    }))
}

/// POST /api/posts/:id/unlike
pub async fn unlike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAccount>,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeResponse>> {
    let account = accounts::find_by_guid(&state.db, &auth.account_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let post = posts::find_by_guid(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if !posts::has_liked(&state.db, &post.guid, &account.guid).await? {
        return Ok(Json(LikeResponse {
            msg: "Not liked yet".to_string(),
            likes: post.likes,
        }));
    }

    let likes = posts::unlike_post(&state.db, &post.guid, &account.guid).await?;

    Ok(Json(LikeResponse {
        msg: "Post unliked".to_string(),
        likes,
    }))
}
