pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_document, chunk_spans, chunk_text, ChunkingConfig};
pub use embeddings::{
    Embedder, EmbeddingPurpose, HashEmbedder, RestEmbedder, RestEmbedderConfig,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{EmbedError, IngestError, QueryError, StoreError};
pub use extractor::{extract_text, extract_text_or_plain, SUPPORTED_EXTENSIONS};
pub use ingest::{discover_documents, make_record_id, source_basename};
pub use models::{
    Chunk, EmbeddingRecord, IngestionOptions, IngestionReport, Metadata, RetrievedChunk,
    SkippedDocument,
};
pub use pipeline::{format_context, RetrievalPipeline, DEFAULT_TOP_K};
pub use stores::ChromaStore;
pub use traits::VectorIndex;
