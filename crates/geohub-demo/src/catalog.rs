//! Where demo content comes from.

use std::path::PathBuf;

use geohub_types::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::validate::DEFAULT_MIN_PAYLOAD_BYTES;

const DRIVE_DEMO_PHOTO: &str =
    "https://docs.google.com/uc?export=download&id=1Yqk_Hz-pxk5WGxB_mnHT4CrTeQgV09ab";

/// A single-payload demo asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemoAsset {
    /// Display name of the resulting layer.
    pub name: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Path relative to [`DemoCatalog::static_root`].
    #[serde(default)]
    pub local_path: Option<String>,
}

/// One demo photo and the position to use when it carries no GPS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemoPhoto {
    pub filename: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl DemoPhoto {
    fn new(filename: &str, lat: f64, lng: f64) -> Self {
        Self {
            filename: filename.to_string(),
            remote_url: Some(DRIVE_DEMO_PHOTO.to_string()),
            local_path: Some(format!("Demo/{filename}")),
            lat,
            lng,
        }
    }

    pub fn fallback_position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Sources and names for the demo workspace content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoCatalog {
    /// Directory that local fallback paths are resolved against.
    pub static_root: PathBuf,
    /// Payloads smaller than this are rejected as implausible.
    pub min_payload_bytes: u64,
    pub splat: DemoAsset,
    pub point_cloud: DemoAsset,
    pub photo_set_name: String,
    pub photos: Vec<DemoPhoto>,
}

impl Default for DemoCatalog {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from("public"),
            min_payload_bytes: DEFAULT_MIN_PAYLOAD_BYTES,
            splat: DemoAsset {
                name: "Subestação Goiabeiras".to_string(),
                remote_url: Some("https://antimatter15.com/splat/nike.splat".to_string()),
                local_path: Some("Demo/SUBESTACAO_RGB_2_splat.splat".to_string()),
            },
            point_cloud: DemoAsset {
                name: "Nuvem de Pontos (Sub_Fx)".to_string(),
                remote_url: None,
                local_path: Some("Demo/Sub_Fx_1passada_Ground+Linha_1_ply.ply".to_string()),
            },
            photo_set_name: "Fotos Inspeção DJI".to_string(),
            photos: vec![
                DemoPhoto::new("DJI_V_0013.JPG", -22.8958, -43.1822),
                DemoPhoto::new("DJI_V_0160.JPG", -22.8962, -43.1815),
                DemoPhoto::new("DJI_V_0405.JPG", -22.8965, -43.1828),
            ],
        }
    }
}
