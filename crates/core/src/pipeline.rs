use crate::chunking::{chunk_document, ChunkingConfig};
use crate::embeddings::{Embedder, EmbeddingPurpose};
use crate::error::{IngestError, QueryError};
use crate::extractor::extract_text;
use crate::ingest::{discover_documents, make_record_id, source_basename};
use crate::models::{
    EmbeddingRecord, IngestionOptions, IngestionReport, Metadata, RetrievedChunk,
    SkippedDocument,
};
use crate::traits::VectorIndex;
use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_TOP_K: usize = 5;

/// Ingestion and retrieval over one embedder and one vector index, both
/// injected by the caller. Chunking parameters are validated once at
/// construction.
pub struct RetrievalPipeline<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    embedder: E,
    index: V,
    config: ChunkingConfig,
}

impl<E, V> RetrievalPipeline<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, index: V, options: IngestionOptions) -> Result<Self, IngestError> {
        Ok(Self {
            embedder,
            index,
            config: ChunkingConfig::try_from(options)?,
        })
    }

    /// Chunk, embed, and upsert one document's text. Returns the number of
    /// chunks written. Empty text is a zero-chunk success with no embedder
    /// or index calls. The first embedding failure aborts the document
    /// before anything reaches the index.
    pub async fn ingest_text(
        &self,
        source_id: &str,
        text: &str,
        metadata: &Metadata,
    ) -> Result<usize, IngestError> {
        if text.trim().is_empty() {
            warn!(source = source_id, "document is empty, nothing to ingest");
            return Ok(0);
        }

        let chunks = chunk_document(source_id, text, &self.config);
        info!(
            source = source_id,
            chunk_count = chunks.len(),
            "chunked document"
        );

        let ingested_at = Utc::now().to_rfc3339();
        let mut records = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let vector = self
                .embedder
                .embed(&chunk.text, EmbeddingPurpose::Document)
                .await
                .map_err(|cause| IngestError::Embedding {
                    source_id: source_id.to_string(),
                    chunk_index: chunk.index,
                    cause,
                })?;

            let mut merged = metadata.clone();
            merged.insert("source".to_string(), Value::from(source_id));
            merged.insert("chunk_index".to_string(), Value::from(chunk.index as u64));
            merged.insert("ingested_at".to_string(), Value::from(ingested_at.clone()));

            records.push(EmbeddingRecord {
                id: make_record_id(source_id, chunk.index),
                vector,
                text: chunk.text.clone(),
                metadata: merged,
            });
        }

        self.index
            .upsert(&records)
            .await
            .map_err(|cause| IngestError::Storage {
                source_id: source_id.to_string(),
                cause,
            })?;

        info!(
            source = source_id,
            count = records.len(),
            "upserted chunks"
        );
        Ok(records.len())
    }

    /// Extract a file's text and ingest it under its basename.
    pub async fn ingest_file(
        &self,
        path: &Path,
        metadata: &Metadata,
    ) -> Result<usize, IngestError> {
        let text = extract_text(path)?;
        let source_id = source_basename(path)?;
        self.ingest_text(&source_id, &text, metadata).await
    }

    /// Best-effort ingestion of every supported document under `folder`.
    /// Files that fail are recorded with a reason instead of aborting the
    /// run.
    pub async fn ingest_folder(
        &self,
        folder: &Path,
        metadata: &Metadata,
    ) -> Result<IngestionReport, IngestError> {
        let files = discover_documents(folder);
        let mut ingested = 0;
        let mut skipped = Vec::new();

        for path in files {
            match self.ingest_file(&path, metadata).await {
                Ok(count) => ingested += count,
                Err(error) => {
                    warn!(path = %path.display(), reason = %error, "skipped document");
                    skipped.push(SkippedDocument {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(IngestionReport { ingested, skipped })
    }

    /// Embed a question and return up to `k` nearest chunks, descending by
    /// similarity. An empty index yields an empty list.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let vector = self
            .embedder
            .embed(question, EmbeddingPurpose::Query)
            .await?;
        Ok(self.index.query(&vector, k).await?)
    }
}

/// Render ranked chunks as numbered, source-labeled context blocks for the
/// caller's answer-assembly step.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return "No relevant context found in the knowledge base.".to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(position, chunk)| {
            let source = chunk
                .metadata
                .get("source")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            format!("[Source {}: {}]\n{}", position + 1, source, chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
