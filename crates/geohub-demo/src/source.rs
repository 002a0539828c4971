use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use geohub_ingest::sniff_mime_type;

use crate::error::{FetchError, FetchResult};
use crate::fetch::{FetchedPayload, Fetcher};

/// Which fallback tier a source belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Remote,
    Local,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// One content-acquisition strategy.
#[async_trait]
pub trait AssetSource: Send + Sync {
    fn tier(&self) -> Tier;

    /// Human-readable location, used in logs and errors.
    fn location(&self) -> &str;

    async fn fetch(&self) -> FetchResult<FetchedPayload>;
}

/// A remote/CDN URL fetched over HTTP.
pub struct RemoteSource {
    fetcher: Arc<dyn Fetcher>,
    url: String,
}

impl RemoteSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AssetSource for RemoteSource {
    fn tier(&self) -> Tier {
        Tier::Remote
    }

    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> FetchResult<FetchedPayload> {
        let payload = self.fetcher.get(&self.url).await?;
        if !payload.is_success() {
            return Err(FetchError::network(
                &self.url,
                format!("status {}", payload.status),
            ));
        }
        Ok(payload)
    }
}

/// A file under the static root, the counterpart of a same-origin static path.
pub struct LocalSource {
    path: PathBuf,
    location: String,
}

impl LocalSource {
    /// `relative` may start with `/`; it is always resolved under `root`.
    pub fn new(root: impl Into<PathBuf>, relative: &str) -> Self {
        let path = root.into().join(relative.trim_start_matches('/'));
        let location = path.display().to_string();
        Self { path, location }
    }
}

#[async_trait]
impl AssetSource for LocalSource {
    fn tier(&self) -> Tier {
        Tier::Local
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch(&self) -> FetchResult<FetchedPayload> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FetchError::network(&self.location, e))?;
        let content_type = sniff_mime_type(&data).map(str::to_string);
        Ok(FetchedPayload::new(200, content_type, data))
    }
}
