use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ImageId;
use crate::url::AssetUrl;

/// A WGS84 position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `(0, 0)`: the value corrupt or missing GPS blocks tend to decode to.
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// Inspection severity attached to an analyzed photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// A geo-tagged photo inside a photo-set layer.
///
/// Images are not store rows of their own: they live in the owning layer's
/// `images` array, while their bytes are stored as a blob keyed by the image id.
/// `lat`/`lng` are `None` when the photo carries no usable GPS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoImage {
    pub id: ImageId,
    pub filename: String,
    pub url: Option<AssetUrl>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GeoImage {
    pub fn new(id: ImageId, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            url: None,
            lat: None,
            lng: None,
            heading: None,
            timestamp: Utc::now(),
            analysis: None,
            severity: None,
            notes: None,
        }
    }

    pub fn with_position(mut self, position: Option<GeoPoint>) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_url(mut self, url: AssetUrl) -> Self {
        self.url = Some(url);
        self
    }

    pub fn position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    pub fn set_position(&mut self, position: Option<GeoPoint>) {
        self.lat = position.map(|p| p.lat);
        self.lng = position.map(|p| p.lng);
    }
}
