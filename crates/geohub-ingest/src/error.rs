//! Error types for the ingestion crate.

use geohub_store::StoreError;

/// Errors that abort an upload.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The upload contained no files.
    #[error("no files to ingest")]
    NoFiles,

    /// An upload kind string was not recognized.
    #[error("unknown asset kind: {0}")]
    UnknownKind(String),

    /// Reading a local file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The store rejected the write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = Result<T, IngestError>;
