//! Semantic document search endpoints (ChromaDB bridge)
//!
//! Documents are embedded and queried by the external ChromaDB server; these
//! handlers validate the request shapes and forward.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::ChromaError;
use crate::AppState;

const DEFAULT_QUERY_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub documents: Option<Vec<String>>,
    pub metadatas: Option<Vec<Value>>,
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub ids: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: Option<String>,
    pub n_results: Option<usize>,
    #[serde(rename = "where")]
    pub where_filter: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub status: String,
    pub ids: Vec<String>,
    pub documents: Vec<Option<String>>,
    pub metadatas: Vec<Option<Value>>,
    pub distances: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: Option<String>,
    pub document: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub status: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

fn map_chroma_error(e: ChromaError) -> ApiError {
    ApiError::Upstream(format!("ChromaDB error: {}", e))
}

/// POST /api/documents/upload
pub async fn upload(
    State(state): State<AppState>,
    Json(body): Json<UploadRequest>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let documents = body
        .documents
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("'documents' must be a non-empty list".to_string()))?;

    if let Some(metadatas) = &body.metadatas {
        if metadatas.len() != documents.len() {
            return Err(ApiError::BadRequest(
                "'metadatas' length must match 'documents'".to_string(),
            ));
        }
    }

    let ids = match body.ids {
        Some(ids) => {
            if ids.len() != documents.len() {
                return Err(ApiError::BadRequest(
                    "'ids' length must match 'documents'".to_string(),
                ));
            }
            ids
        }
        None => documents
            .iter()
            .map(|_| Uuid::new_v4().to_string())
            .collect(),
    };

    state
        .chroma
        .add_documents(&ids, &documents, body.metadatas.as_deref())
        .await
        .map_err(map_chroma_error)?;

    let count = ids.len();

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            status: "success".to_string(),
            ids,
            count,
        }),
    ))
}

/// POST /api/documents/query
pub async fn query(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let query_text = body
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("'query' must be a non-empty string".to_string()))?;

    let n_results = body.n_results.unwrap_or(DEFAULT_QUERY_RESULTS).max(1);

    let matches = state
        .chroma
        .query(&query_text, n_results, body.where_filter.as_ref())
        .await
        .map_err(map_chroma_error)?;

    let mut response = QueryResponse {
        status: "success".to_string(),
        ids: Vec::with_capacity(matches.len()),
        documents: Vec::with_capacity(matches.len()),
        metadatas: Vec::with_capacity(matches.len()),
        distances: Vec::with_capacity(matches.len()),
    };

    for m in matches {
        response.ids.push(m.id);
        response.documents.push(m.document);
        response.metadatas.push(m.metadata);
        response.distances.push(m.distance);
    }

    Ok(Json(response))
}

/// DELETE /api/documents/delete
pub async fn delete(
    State(state): State<AppState>,
    Json(body): Json<DeleteRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let ids = body
        .ids
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| ApiError::BadRequest("'ids' must be a non-empty list".to_string()))?;

    state
        .chroma
        .delete_documents(&ids)
        .await
        .map_err(map_chroma_error)?;

    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: format!("Deleted {} document(s)", ids.len()),
    }))
}

/// PUT /api/documents/update
pub async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let id = body
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("'id' must be a non-empty string".to_string()))?;

    let document = body
        .document
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("'document' must be a non-empty string".to_string()))?;

    state
        .chroma
        .update_document(&id, &document, body.metadata.as_ref())
        .await
        .map_err(map_chroma_error)?;

    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: format!("Updated document {}", id),
    }))
}

/// GET /api/documents/info
pub async fn info(State(state): State<AppState>) -> ApiResult<Json<InfoResponse>> {
    let count = state.chroma.count().await.map_err(map_chroma_error)?;

    Ok(Json(InfoResponse {
        status: "success".to_string(),
        name: state.chroma.collection_name().to_string(),
        count,
    }))
}
