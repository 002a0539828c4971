use geohub_types::WorkspaceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("workspace {0} cannot be deleted")]
    ProtectedWorkspace(WorkspaceId),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid update: {0}")]
    InvalidUpdate(#[from] geohub_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] geohub_store::StoreError),

    #[error("ingest error: {0}")]
    Ingest(#[from] geohub_ingest::IngestError),

    #[error("demo error: {0}")]
    Demo(#[from] geohub_demo::DemoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// True when the underlying cause is a missing record.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::Ingest(geohub_ingest::IngestError::Store(e)) => e.is_not_found(),
            Self::Demo(geohub_demo::DemoError::Store(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
