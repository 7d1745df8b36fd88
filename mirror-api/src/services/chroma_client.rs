//! ChromaDB API client
//!
//! Thin wrapper over the ChromaDB v1 REST surface: get-or-create a named
//! collection, then add/query/update/delete documents in it. The collection
//! id is resolved lazily on first use and cached for the life of the client.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Chroma client errors
#[derive(Debug, Error)]
pub enum ChromaError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Nearest-neighbour query results, one entry per match
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Value>,
    pub distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

/// ChromaDB API client
pub struct ChromaClient {
    http_client: reqwest::Client,
    base_url: String,
    collection_name: String,
    collection_id: OnceCell<String>,
}

impl ChromaClient {
    pub fn new(base_url: &str, collection_name: &str) -> Result<Self, ChromaError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChromaError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection_name: collection_name.to_string(),
            collection_id: OnceCell::new(),
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Resolve (and cache) the collection id, creating the collection on
    /// first contact
    async fn collection_id(&self) -> Result<&str, ChromaError> {
        self.collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections", self.base_url);
                let body = json!({
                    "name": self.collection_name,
                    "get_or_create": true,
                });

                let response = self
                    .http_client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| ChromaError::NetworkError(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ChromaError::ApiError(status.as_u16(), error_text));
                }

                let collection: CollectionResponse = response
                    .json()
                    .await
                    .map_err(|e| ChromaError::ParseError(e.to_string()))?;

                tracing::info!(
                    collection = %self.collection_name,
                    id = %collection.id,
                    "Resolved Chroma collection"
                );

                Ok(collection.id)
            })
            .await
            .map(|s| s.as_str())
    }

    async fn collection_post(&self, action: &str, body: &Value) -> Result<Value, ChromaError> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/{}", self.base_url, id, action);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChromaError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChromaError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .or_else(|_| Ok(Value::Null)) // add/delete/update answer with bare true/null bodies
    }

    /// Embed and store documents; returns the ids used
    pub async fn add_documents(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: Option<&[Value]>,
    ) -> Result<(), ChromaError> {
        let mut body = json!({
            "ids": ids,
            "documents": documents,
        });
        if let Some(metadatas) = metadatas {
            body["metadatas"] = json!(metadatas);
        }

        self.collection_post("add", &body).await?;

        tracing::info!(count = ids.len(), "Added documents to Chroma");
        Ok(())
    }

    /// Nearest-neighbour query for a single query text
    pub async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        where_filter: Option<&Value>,
    ) -> Result<Vec<QueryMatch>, ChromaError> {
        let mut body = json!({
            "query_texts": [query_text],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(filter) = where_filter {
            body["where"] = filter.clone();
        }

        let result = self.collection_post("query", &body).await?;
        parse_query_response(&result)
    }

    /// Replace a stored document (and optionally its metadata)
    pub async fn update_document(
        &self,
        id: &str,
        document: &str,
        metadata: Option<&Value>,
    ) -> Result<(), ChromaError> {
        let mut body = json!({
            "ids": [id],
            "documents": [document],
        });
        if let Some(metadata) = metadata {
            body["metadatas"] = json!([metadata]);
        }

        self.collection_post("update", &body).await?;
        Ok(())
    }

    /// Delete documents by id
    pub async fn delete_documents(&self, ids: &[String]) -> Result<(), ChromaError> {
        let body = json!({ "ids": ids });
        self.collection_post("delete", &body).await?;

        tracing::info!(count = ids.len(), "Deleted documents from Chroma");
        Ok(())
    }

    /// Number of documents in the collection
    pub async fn count(&self) -> Result<u64, ChromaError> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/count", self.base_url, id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChromaError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChromaError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ChromaError::ParseError(e.to_string()))
    }
}

/// Chroma answers queries column-wise, one outer array per query text.
/// Flatten the first (only) query's columns into row-wise matches.
fn parse_query_response(json: &Value) -> Result<Vec<QueryMatch>, ChromaError> {
    let ids = json
        .get("ids")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .and_then(|v| v.as_array())
        .ok_or_else(|| ChromaError::ParseError("missing ids array".to_string()))?;

    let first_column = |key: &str| -> Option<&Vec<Value>> {
        json.get(key)
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_array())
    };

    let documents = first_column("documents");
    let metadatas = first_column("metadatas");
    let distances = first_column("distances");

    let mut matches = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let id = id
            .as_str()
            .ok_or_else(|| ChromaError::ParseError("non-string id".to_string()))?
            .to_string();

        matches.push(QueryMatch {
            id,
            document: documents
                .and_then(|d| d.get(i))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            metadata: metadatas
                .and_then(|m| m.get(i))
                .filter(|v| !v.is_null())
                .cloned(),
            distance: distances.and_then(|d| d.get(i)).and_then(|v| v.as_f64()),
        });
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_columnar_query_response() {
        let raw = json!({
            "ids": [["doc1", "doc2"]],
            "documents": [["first text", "second text"]],
            "metadatas": [[{"source": "a"}, null]],
            "distances": [[0.12, 0.48]],
        });

        let matches = parse_query_response(&raw).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "doc1");
        assert_eq!(matches[0].document.as_deref(), Some("first text"));
        assert_eq!(matches[0].metadata, Some(json!({"source": "a"})));
        assert_eq!(matches[0].distance, Some(0.12));
        assert_eq!(matches[1].metadata, None);
    }

    #[test]
    fn rejects_response_without_ids() {
        let raw = json!({"documents": [[]]});
        assert!(parse_query_response(&raw).is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ChromaClient::new("http://localhost:8000/", "docs").unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.collection_name(), "docs");
    }
}
