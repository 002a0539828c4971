use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::id::{ImageId, LayerId};

/// MIME type used when a payload's type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Key of a stored blob: the id of the layer or image that owns it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&LayerId> for BlobId {
    fn from(id: &LayerId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl From<&ImageId> for BlobId {
    fn from(id: &ImageId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary payload stored against a layer or a photo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRecord {
    pub id: BlobId,
    pub data: Bytes,
    pub mime_type: String,
}

impl BlobRecord {
    pub fn new(id: BlobId, data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
