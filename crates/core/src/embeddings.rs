use crate::error::EmbedError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Why a text is being embedded. Some backends produce asymmetric vectors
/// for indexed content versus search queries, so ingestion must pass
/// `Document` and retrieval must pass `Query`. Mixing them up degrades
/// ranking silently rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

impl EmbeddingPurpose {
    /// Task type string understood by the hosted embedding endpoint.
    pub fn task_type(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Maps text to a fixed-length vector. May fail transiently; no retries
/// happen at this layer.
#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str, purpose: EmbeddingPurpose)
        -> Result<Vec<f32>, EmbedError>;
}

#[async_trait]
impl Embedder for Box<dyn Embedder + Send + Sync> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    async fn embed(
        &self,
        text: &str,
        purpose: EmbeddingPurpose,
    ) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text, purpose).await
    }
}

#[derive(Debug, Clone)]
pub struct RestEmbedderConfig {
    /// Full embedContent-style endpoint URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
}

/// Client for a hosted embedding endpoint that accepts a text payload plus
/// a task type and returns one vector per call.
pub struct RestEmbedder {
    endpoint: Url,
    api_key: Option<String>,
    dimensions: usize,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl RestEmbedder {
    pub fn new(config: RestEmbedderConfig) -> Result<Self, EmbedError> {
        Ok(Self {
            endpoint: Url::parse(&config.endpoint)?,
            api_key: config.api_key,
            dimensions: config.dimensions,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl Embedder for RestEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(
        &self,
        text: &str,
        purpose: EmbeddingPurpose,
    ) -> Result<Vec<f32>, EmbedError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&json!({
            "content": { "parts": [{ "text": text }] },
            "taskType": purpose.task_type(),
        }));

        if let Some(api_key) = &self.api_key {
            request = request.header("x-goog-api-key", api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(EmbedError::BackendResponse {
                backend: "embedding-endpoint".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: EmbedContentResponse = response.json().await?;
        let values = parsed.embedding.values;
        if values.len() != self.dimensions {
            return Err(EmbedError::BackendResponse {
                backend: "embedding-endpoint".to_string(),
                details: format!(
                    "expected {} dimensions, got {}",
                    self.dimensions,
                    values.len()
                ),
            });
        }

        Ok(values)
    }
}

/// Deterministic character-trigram hashing embedder. Purpose has no effect
/// because the representation is symmetric. Useful offline and for testing
/// ranking behavior without a hosted backend.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    pub dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashEmbedder {
    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(
        &self,
        text: &str,
        _purpose: EmbeddingPurpose,
    ) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, EmbeddingPurpose, HashEmbedder};

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let first = embedder
            .embed("leave handover checklist", EmbeddingPurpose::Document)
            .await
            .expect("hash embedding is infallible");
        let second = embedder
            .embed("leave handover checklist", EmbeddingPurpose::Query)
            .await
            .expect("hash embedding is infallible");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hash_embedder_outputs_expected_length() {
        let embedder = HashEmbedder { dimensions: 32 };
        let vector = embedder
            .embed("abc", EmbeddingPurpose::Document)
            .await
            .expect("hash embedding is infallible");
        assert_eq!(vector.len(), 32);
    }

    #[test]
    fn task_types_are_distinct_per_purpose() {
        assert_eq!(EmbeddingPurpose::Document.task_type(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbeddingPurpose::Query.task_type(), "RETRIEVAL_QUERY");
    }
}
