use crate::error::StoreError;
use crate::models::{EmbeddingRecord, RetrievedChunk};
use async_trait::async_trait;

/// Persistent mapping of record id to (vector, text, metadata) answering
/// k-nearest-neighbor queries by cosine similarity.
#[async_trait]
pub trait VectorIndex {
    /// Idempotent per id: a second call with the same id replaces the
    /// prior record.
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), StoreError>;

    /// Up to `k` hits, descending by similarity. An empty index is an
    /// empty result, not an error.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, StoreError>;
}
