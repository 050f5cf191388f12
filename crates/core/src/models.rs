use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Arbitrary key/value payload stored alongside each embedded chunk.
/// Ingestion always adds `source`, `chunk_index`, and `ingested_at`.
pub type Metadata = Map<String, Value>;

/// A bounded, whitespace-stripped substring of one source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub source_id: String,
    /// Zero-based position within the source's chunk sequence. Contiguous
    /// for a single ingestion run; not globally unique.
    pub index: usize,
    pub text: String,
}

/// One chunk prepared for the vector store: unique id, embedding vector,
/// original text, and merged metadata. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Metadata,
}

/// One ranked hit from a nearest-neighbor query. `score` is cosine
/// similarity mapped to [0, 1] as `1 - distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: Metadata,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestionOptions {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

#[derive(Debug)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a best-effort folder ingestion: total chunks written plus
/// the files that could not be processed, with reasons.
#[derive(Debug)]
pub struct IngestionReport {
    pub ingested: usize,
    pub skipped: Vec<SkippedDocument>,
}
