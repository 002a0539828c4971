use crate::error::{FetchError, FetchResult};
use crate::fetch::FetchedPayload;

/// Size floor below which a fetched payload is assumed to be an error page.
pub const DEFAULT_MIN_PAYLOAD_BYTES: u64 = 1000;

/// Rejects payloads that are plausibly not the requested binary: a served
/// HTML page, or anything under the size floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadValidator {
    pub min_bytes: u64,
}

impl PayloadValidator {
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }

    pub fn validate(&self, location: &str, payload: &FetchedPayload) -> FetchResult<()> {
        if let Some(content_type) = &payload.content_type {
            if content_type.to_ascii_lowercase().contains("text/html") {
                return Err(FetchError::validation(
                    location,
                    format!("content type {content_type} looks like an error page"),
                ));
            }
        }
        let size = payload.data.len() as u64;
        if size < self.min_bytes {
            return Err(FetchError::validation(
                location,
                format!("{size} bytes is below the {} byte floor", self.min_bytes),
            ));
        }
        Ok(())
    }
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PAYLOAD_BYTES)
    }
}
