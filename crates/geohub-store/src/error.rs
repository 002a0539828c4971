use std::fmt;

use geohub_types::{BlobId, WorkspaceId};

/// Which table a missing record was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Workspace,
    Layer,
    Blob,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace => write!(f, "workspace"),
            Self::Layer => write!(f, "layer"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// Errors from asset store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// A blob write was rejected because it would exceed the store capacity.
    #[error("storage quota exceeded: {requested} bytes requested, {available} bytes available")]
    StorageQuotaExceeded { requested: u64, available: u64 },

    /// A layer referenced a workspace that does not exist.
    #[error("layer references unknown workspace {0}")]
    UnknownWorkspace(WorkspaceId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another open store already holds the directory.
    #[error("store directory {} is in use by another process", .0.display())]
    Locked(std::path::PathBuf),

    /// Stored bytes no longer match their recorded checksum.
    #[error("corrupt blob {id}: {reason}")]
    Corrupt { id: BlobId, reason: String },
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::StorageQuotaExceeded { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
