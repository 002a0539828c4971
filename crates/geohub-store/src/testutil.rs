//! Record builders shared by the backend tests.

use geohub_types::{
    BlobId, BlobRecord, GaussianSplat, GeoImage, ImageId, Layer, LayerContent, LayerId, PhotoSet,
    Workspace, WorkspaceId,
};

pub fn workspace(id: &str) -> Workspace {
    Workspace::new(WorkspaceId::new(id), id)
}

pub fn splat(id: &str, workspace: &str) -> Layer {
    Layer::new(
        LayerId::new(id),
        WorkspaceId::new(workspace),
        id,
        LayerContent::GaussianSplat(GaussianSplat::from_payload("scene.splat", 3200)),
    )
}

pub fn photo_set(id: &str, workspace: &str, images: &[&str]) -> Layer {
    Layer::new(
        LayerId::new(id),
        WorkspaceId::new(workspace),
        id,
        LayerContent::PhotoSet(PhotoSet {
            images: images
                .iter()
                .map(|img| GeoImage::new(ImageId::new(*img), format!("{img}.jpg")))
                .collect(),
        }),
    )
}

pub fn blob_for(layer: &LayerId, size: usize) -> BlobRecord {
    BlobRecord::new(BlobId::from(layer), vec![7u8; size], "application/octet-stream")
}
