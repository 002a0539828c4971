use geohub_store::StoreError;
use geohub_types::WorkspaceId;
use thiserror::Error;

/// Why a single source failed to produce a usable payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request was rejected, could not be made, or returned non-2xx.
    #[error("network failure at {location}: {reason}")]
    NetworkFailure { location: String, reason: String },

    /// A payload arrived but is implausible (HTML error page, too small).
    #[error("validation failure at {location}: {reason}")]
    ValidationFailure { location: String, reason: String },
}

impl FetchError {
    pub fn network(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::NetworkFailure {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::ValidationFailure {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("demo bootstrap only runs for the demo workspace, not {0}")]
    NotDemoWorkspace(WorkspaceId),

    #[error("demo bootstrap is already running")]
    AlreadyRunning,

    #[error("http client error: {0}")]
    Client(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type DemoResult<T> = Result<T, DemoError>;
