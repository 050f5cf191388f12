use crate::error::StoreError;
use crate::models::{EmbeddingRecord, Metadata, RetrievedChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use url::Url;

/// REST client for one Chroma collection configured with cosine distance.
/// The collection is resolved lazily via get-or-create on first use, so
/// construction needs no network access.
pub struct ChromaStore {
    endpoint: Url,
    collection: String,
    collection_id: OnceCell<String>,
    client: Client,
    vector_size: usize,
}

impl ChromaStore {
    pub fn new(
        endpoint: &str,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            collection: collection.into(),
            collection_id: OnceCell::new(),
            client: Client::new(),
            vector_size,
        })
    }

    /// Get-or-create the collection and cache its server-side id.
    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        self.resolve_collection_id().await.map(|_| ())
    }

    async fn resolve_collection_id(&self) -> Result<&str, StoreError> {
        self.collection_id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(self.endpoint.join("api/v1/collections")?)
                    .json(&json!({
                        "name": self.collection,
                        "metadata": { "hnsw:space": "cosine" },
                        "get_or_create": true,
                    }))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(StoreError::BackendResponse {
                        backend: "chroma".to_string(),
                        details: response.status().to_string(),
                    });
                }

                let parsed: Value = response.json().await?;
                parsed
                    .pointer("/id")
                    .and_then(Value::as_str)
                    .map(|id| id.to_string())
                    .ok_or_else(|| StoreError::BackendResponse {
                        backend: "chroma".to_string(),
                        details: "collection response has no id".to_string(),
                    })
            })
            .await
            .map(String::as_str)
    }

    async fn collection_url(&self, operation: &str) -> Result<Url, StoreError> {
        let collection_id = self.resolve_collection_id().await?;
        Ok(self
            .endpoint
            .join(&format!("api/v1/collections/{collection_id}/{operation}"))?)
    }
}

fn similarity_from_distance(distance: f64) -> f64 {
    let similarity = (1.0 - distance).clamp(0.0, 1.0);
    (similarity * 10_000.0).round() / 10_000.0
}

#[async_trait]
impl VectorIndex for ChromaStore {
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        for record in records {
            if record.vector.len() != self.vector_size {
                return Err(StoreError::Request(format!(
                    "record {} has dimension {}, collection expects {}",
                    record.id,
                    record.vector.len(),
                    self.vector_size
                )));
            }
        }

        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        let embeddings: Vec<&[f32]> = records
            .iter()
            .map(|record| record.vector.as_slice())
            .collect();
        let documents: Vec<&str> = records.iter().map(|record| record.text.as_str()).collect();
        let metadatas: Vec<&Metadata> = records.iter().map(|record| &record.metadata).collect();

        let response = self
            .client
            .post(self.collection_url("upsert").await?)
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, StoreError> {
        if vector.len() != self.vector_size {
            return Err(StoreError::Request(format!(
                "query vector dimension {} is not {}",
                vector.len(),
                self.vector_size
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.collection_url("query").await?)
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": k,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let documents = column(&parsed, "/documents/0");
        let metadatas = column(&parsed, "/metadatas/0");
        let distances = column(&parsed, "/distances/0");

        let mut hits = Vec::new();
        for ((document, metadata), distance) in documents
            .iter()
            .zip(metadatas.iter())
            .zip(distances.iter())
        {
            let text = document.as_str().unwrap_or_default().to_string();
            let metadata = metadata
                .as_object()
                .cloned()
                .unwrap_or_default();
            let distance = distance.as_f64().unwrap_or(1.0);

            hits.push(RetrievedChunk {
                text,
                metadata,
                score: similarity_from_distance(distance),
            });
        }

        Ok(hits)
    }
}

fn column(parsed: &Value, pointer: &str) -> Vec<Value> {
    parsed
        .pointer(pointer)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn endpoint_must_be_a_valid_url() {
        assert!(ChromaStore::new("not a url", "kb", 128).is_err());
        assert!(ChromaStore::new("http://localhost:8000", "kb", 128).is_ok());
    }

    #[tokio::test]
    async fn upsert_rejects_mismatched_dimensions_before_any_request() {
        let store =
            ChromaStore::new("http://localhost:8000", "kb", 128).expect("valid endpoint");
        let record = EmbeddingRecord {
            id: "doc_chunk_0_deadbeef".to_string(),
            vector: vec![0.0; 64],
            text: "text".to_string(),
            metadata: Map::new(),
        };

        let error = store.upsert(&[record]).await.expect_err("dimension check");
        assert!(matches!(error, StoreError::Request(_)));
    }

    #[tokio::test]
    async fn query_rejects_mismatched_dimensions_before_any_request() {
        let store =
            ChromaStore::new("http://localhost:8000", "kb", 128).expect("valid endpoint");
        let error = store
            .query(&vec![0.0; 32], 5)
            .await
            .expect_err("dimension check");
        assert!(matches!(error, StoreError::Request(_)));
    }

    #[test]
    fn similarity_is_one_minus_distance_clamped_and_rounded() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
        assert_eq!(similarity_from_distance(0.25), 0.75);
        assert_eq!(similarity_from_distance(1.0 / 3.0), 0.6667);
        assert_eq!(similarity_from_distance(1.0), 0.0);
        assert_eq!(similarity_from_distance(1.7), 0.0);
        assert_eq!(similarity_from_distance(-0.2), 1.0);
    }
}
