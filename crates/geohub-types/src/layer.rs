use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blob::BlobId;
use crate::id::{LayerId, WorkspaceId};
use crate::image::GeoImage;
use crate::url::AssetUrl;

/// Fixed per-record byte stride of the binary `.splat` format.
pub const SPLAT_RECORD_STRIDE: u64 = 32;

/// The kind of a layer, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerKind {
    PointCloud,
    GaussianSplat,
    PhotoSet,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointCloud => write!(f, "POINT_CLOUD"),
            Self::GaussianSplat => write!(f, "GAUSSIAN_SPLAT"),
            Self::PhotoSet => write!(f, "PHOTO_SET"),
        }
    }
}

/// On-disk format of a point cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointCloudFormat {
    Las,
    Laz,
    Ply,
    Xyz,
    Txt,
}

impl PointCloudFormat {
    /// Detect from a file extension; unknown extensions are treated as PLY.
    pub fn from_file_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("las") => Self::Las,
            Some("laz") => Self::Laz,
            Some("xyz") => Self::Xyz,
            Some("txt") => Self::Txt,
            _ => Self::Ply,
        }
    }
}

/// On-disk format of a Gaussian splat capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplatFormat {
    Splat,
    Ply,
}

impl SplatFormat {
    pub fn from_file_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("ply") => Self::Ply,
            _ => Self::Splat,
        }
    }
}

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// LiDAR / point-cloud scan. The point count is filled in by the renderer at
/// load time, so freshly ingested clouds carry `0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointCloud {
    pub point_count: u64,
    pub format: PointCloudFormat,
    #[serde(default)]
    pub url: Option<AssetUrl>,
}

/// Gaussian-splat 3D capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaussianSplat {
    #[serde(default)]
    pub url: Option<AssetUrl>,
    pub splat_count: u64,
    pub format: SplatFormat,
    pub file_size: u64,
}

impl GaussianSplat {
    /// Describe a splat payload of `file_size` bytes named `file_name`.
    pub fn from_payload(file_name: &str, file_size: u64) -> Self {
        Self {
            url: None,
            splat_count: file_size / SPLAT_RECORD_STRIDE,
            format: SplatFormat::from_file_name(file_name),
            file_size,
        }
    }
}

/// A set of geo-tagged photos.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoSet {
    pub images: Vec<GeoImage>,
}

/// Variant data of a layer, tagged by `type` when persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerContent {
    PointCloud(PointCloud),
    GaussianSplat(GaussianSplat),
    PhotoSet(PhotoSet),
}

/// A user-visible geospatial dataset owned by one workspace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub content: LayerContent,
}

impl Layer {
    /// A visible, fully opaque layer dated now.
    pub fn new(
        id: LayerId,
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        content: LayerContent,
    ) -> Self {
        Self {
            id,
            workspace_id,
            name: name.into(),
            visible: true,
            opacity: 1.0,
            date: Utc::now(),
            content,
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self.content {
            LayerContent::PointCloud(_) => LayerKind::PointCloud,
            LayerContent::GaussianSplat(_) => LayerKind::GaussianSplat,
            LayerContent::PhotoSet(_) => LayerKind::PhotoSet,
        }
    }

    /// Ids of every blob this layer may own: the layer itself for single
    /// payload layers, each image for a photo set.
    pub fn blob_owners(&self) -> Vec<BlobId> {
        match &self.content {
            LayerContent::PhotoSet(set) => set.images.iter().map(|img| BlobId::from(&img.id)).collect(),
            _ => vec![BlobId::from(&self.id)],
        }
    }

    /// Payload URL of a single-payload layer. `None` for photo sets.
    pub fn url(&self) -> Option<&AssetUrl> {
        match &self.content {
            LayerContent::PointCloud(pc) => pc.url.as_ref(),
            LayerContent::GaussianSplat(splat) => splat.url.as_ref(),
            LayerContent::PhotoSet(_) => None,
        }
    }

    /// Replace the payload URL of a single-payload layer. No-op for photo sets.
    pub fn set_url(&mut self, url: Option<AssetUrl>) {
        match &mut self.content {
            LayerContent::PointCloud(pc) => pc.url = url,
            LayerContent::GaussianSplat(splat) => splat.url = url,
            LayerContent::PhotoSet(_) => {}
        }
    }

    pub fn images(&self) -> Option<&[GeoImage]> {
        match &self.content {
            LayerContent::PhotoSet(set) => Some(&set.images),
            _ => None,
        }
    }

    pub fn images_mut(&mut self) -> Option<&mut Vec<GeoImage>> {
        match &mut self.content {
            LayerContent::PhotoSet(set) => Some(&mut set.images),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ImageId;

    fn splat_layer() -> Layer {
        Layer::new(
            LayerId::new("layer-splat-1"),
            WorkspaceId::demo(),
            "shoe",
            LayerContent::GaussianSplat(GaussianSplat::from_payload("shoe.splat", 3200)),
        )
    }

    #[test]
    fn splat_count_uses_record_stride() {
        let splat = GaussianSplat::from_payload("x.splat", 3200);
        assert_eq!(splat.splat_count, 100);
        assert_eq!(splat.format, SplatFormat::Splat);
        assert_eq!(GaussianSplat::from_payload("x.splat", 31).splat_count, 0);
    }

    #[test]
    fn splat_format_from_extension() {
        assert_eq!(SplatFormat::from_file_name("scene.PLY"), SplatFormat::Ply);
        assert_eq!(SplatFormat::from_file_name("scene"), SplatFormat::Splat);
    }

    #[test]
    fn point_cloud_format_from_extension() {
        assert_eq!(PointCloudFormat::from_file_name("a.las"), PointCloudFormat::Las);
        assert_eq!(PointCloudFormat::from_file_name("a.LAZ"), PointCloudFormat::Laz);
        assert_eq!(PointCloudFormat::from_file_name("a.xyz"), PointCloudFormat::Xyz);
        assert_eq!(PointCloudFormat::from_file_name("a.bin"), PointCloudFormat::Ply);
    }

    #[test]
    fn persisted_shape_is_tagged() {
        let layer = splat_layer();
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "GAUSSIAN_SPLAT");
        assert_eq!(json["workspaceId"], "demo-session");
        assert_eq!(json["splatCount"], 100);
        let back: Layer = serde_json::from_value(json).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn blob_owners_per_kind() {
        let layer = splat_layer();
        assert_eq!(layer.blob_owners(), vec![BlobId::new("layer-splat-1")]);

        let photos = Layer::new(
            LayerId::new("layer-photos-1"),
            WorkspaceId::demo(),
            "photos",
            LayerContent::PhotoSet(PhotoSet {
                images: vec![
                    GeoImage::new(ImageId::new("img-a"), "a.jpg"),
                    GeoImage::new(ImageId::new("img-b"), "b.jpg"),
                ],
            }),
        );
        assert_eq!(
            photos.blob_owners(),
            vec![BlobId::new("img-a"), BlobId::new("img-b")]
        );
        assert_eq!(photos.kind(), LayerKind::PhotoSet);
    }

    #[test]
    fn set_url_ignores_photo_sets() {
        let mut layer = splat_layer();
        layer.set_url(Some(AssetUrl::from("blob:x")));
        assert_eq!(layer.url(), Some(&AssetUrl::from("blob:x")));

        let mut photos = Layer::new(
            LayerId::new("p"),
            WorkspaceId::demo(),
            "p",
            LayerContent::PhotoSet(PhotoSet::default()),
        );
        photos.set_url(Some(AssetUrl::from("blob:y")));
        assert!(photos.url().is_none());
    }
}
