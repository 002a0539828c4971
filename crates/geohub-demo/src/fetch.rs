use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{DemoError, DemoResult, FetchError, FetchResult};

/// Response of a plain GET: only status, content type, and body are consulted.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedPayload {
    pub status: u16,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FetchedPayload {
    pub fn new(status: u16, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            data: data.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type without parameters (`text/html; charset=utf-8` -> `text/html`).
    pub fn media_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
    }
}

/// HTTP GET seam.
///
/// Implementations return `Err` only when no response was obtained; non-2xx
/// statuses are reported in the payload.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> FetchResult<FetchedPayload>;
}

/// `reqwest`-backed fetcher. No retries, no backoff.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> DemoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DemoError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> FetchResult<FetchedPayload> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        debug!(url, status, size = data.len(), "fetched");
        Ok(FetchedPayload::new(status, content_type, data))
    }
}

/// Fetcher for offline runs: every request fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn get(&self, url: &str) -> FetchResult<FetchedPayload> {
        Err(FetchError::network(url, "offline"))
    }
}
