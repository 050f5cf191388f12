use thiserror::Error;

/// Failure of the embedding collaborator. Never retried here; the caller
/// owns retry policy.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure of the vector store collaborator. Distinct from an empty index,
/// which is an ordinary empty result.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("store request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("unsupported format '{extension}': {path}")]
    UnsupportedFormat { extension: String, path: String },

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("embedding failed for {source_id} chunk {chunk_index}")]
    Embedding {
        source_id: String,
        chunk_index: usize,
        #[source]
        cause: EmbedError,
    },

    #[error("storage failed for {source_id}")]
    Storage {
        source_id: String,
        #[source]
        cause: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuestion,

    #[error("query embedding failed")]
    Embedding(#[from] EmbedError),

    #[error("index query failed")]
    Storage(#[from] StoreError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
