use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheme prefix of session-scoped handles minted for stored blobs.
pub const EPHEMERAL_SCHEME: &str = "blob:";

/// How an [`AssetUrl`] can be used across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlClass {
    /// Stable absolute `http(s)` URL; survives reloads unchanged.
    Remote,
    /// Session-local handle (`blob:`); meaningless after the minting session ends.
    Ephemeral,
    /// Anything else (relative static paths, unknown schemes).
    Relative,
}

/// Address of a layer or image payload.
///
/// A persisted ephemeral URL is never trusted on reload; it must be
/// re-derived from the stored blob.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetUrl(String);

impl AssetUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn class(&self) -> UrlClass {
        let lower = self.0.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            UrlClass::Remote
        } else if lower.starts_with(EPHEMERAL_SCHEME) {
            UrlClass::Ephemeral
        } else {
            UrlClass::Relative
        }
    }

    /// Stable absolute URL that may be passed through rehydration unchanged.
    pub fn is_remote(&self) -> bool {
        self.class() == UrlClass::Remote
    }

    pub fn is_ephemeral(&self) -> bool {
        self.class() == UrlClass::Ephemeral
    }
}

impl fmt::Debug for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetUrl({})", self.0)
    }
}

impl fmt::Display for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetUrl {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_remote_urls() {
        assert_eq!(AssetUrl::from("https://cdn.example/a.splat").class(), UrlClass::Remote);
        assert_eq!(AssetUrl::from("HTTP://cdn.example/a.ply").class(), UrlClass::Remote);
    }

    #[test]
    fn classifies_ephemeral_urls() {
        let url = AssetUrl::from("blob:geohub/abc/def");
        assert!(url.is_ephemeral());
        assert!(!url.is_remote());
    }

    #[test]
    fn classifies_relative_paths() {
        assert_eq!(AssetUrl::from("/Demo/x.splat").class(), UrlClass::Relative);
        assert_eq!(AssetUrl::from("").class(), UrlClass::Relative);
    }
}
