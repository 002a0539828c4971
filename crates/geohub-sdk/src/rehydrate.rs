use std::sync::Arc;

use geohub_store::{AssetStore, HandleRegistry, StoreError};
use geohub_types::{AssetUrl, BlobId, Layer, WorkspaceId};
use tracing::{debug, warn};

use crate::error::SdkResult;

/// Rebuilds a session's live layer list from the store.
///
/// Stable remote URLs pass through untouched. Anything else is re-derived from
/// the stored blob with a freshly minted handle, replacing whatever handle the
/// registry held for that blob. A layer with neither a usable URL nor a blob
/// comes back as a placeholder with no URL; it never fails the load.
pub struct Rehydrator {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
}

impl Rehydrator {
    pub fn new(store: Arc<dyn AssetStore>, handles: Arc<HandleRegistry>) -> Self {
        Self { store, handles }
    }

    pub async fn load_workspace_layers(&self, workspace: &WorkspaceId) -> SdkResult<Vec<Layer>> {
        let stored = self.store.list_layers(workspace).await?;
        let mut layers = Vec::with_capacity(stored.len());
        for mut layer in stored {
            if let Some(images) = layer.images_mut() {
                for image in images.iter_mut() {
                    let owner = BlobId::from(&image.id);
                    image.url = self.rehydrate_url(&owner, image.url.take()).await;
                }
            } else {
                let owner = BlobId::from(&layer.id);
                let url = self.rehydrate_url(&owner, layer.url().cloned()).await;
                layer.set_url(url);
            }
            layers.push(layer);
        }
        debug!(workspace = %workspace, layers = layers.len(), "workspace rehydrated");
        Ok(layers)
    }

    async fn rehydrate_url(&self, owner: &BlobId, stored: Option<AssetUrl>) -> Option<AssetUrl> {
        if let Some(url) = stored.as_ref().filter(|u| u.is_remote()) {
            return Some(url.clone());
        }

        match self.store.get_blob(owner).await {
            Ok(blob) => {
                self.handles.release_owner(owner);
                return Some(self.handles.mint_record(&blob));
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(err) => warn!(owner = %owner, error = %err, "stored blob unreadable"),
        }

        // No blob. A handle still live in this session (memory-only layers)
        // stays usable; a handle from an earlier session does not.
        match stored {
            Some(url) if url.is_ephemeral() => self.handles.resolve(&url).map(|_| url),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geohub_store::InMemoryAssetStore;
    use geohub_types::{
        BlobRecord, GaussianSplat, GeoImage, ImageId, LayerContent, LayerId, PhotoSet, PointCloud,
        PointCloudFormat, Workspace,
    };

    struct Fixture {
        store: Arc<InMemoryAssetStore>,
        handles: Arc<HandleRegistry>,
        rehydrator: Rehydrator,
        ws: WorkspaceId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryAssetStore::new());
        let ws = WorkspaceId::new("ws-1");
        store.put_workspace(&Workspace::new(ws.clone(), "ws")).await.unwrap();
        let handles = Arc::new(HandleRegistry::new());
        let rehydrator = Rehydrator::new(store.clone(), Arc::clone(&handles));
        Fixture {
            store,
            handles,
            rehydrator,
            ws,
        }
    }

    fn splat(id: &str, ws: &WorkspaceId, url: Option<&str>) -> Layer {
        let mut layer = Layer::new(
            LayerId::new(id),
            ws.clone(),
            id,
            LayerContent::GaussianSplat(GaussianSplat::from_payload("a.splat", 3200)),
        );
        layer.set_url(url.map(AssetUrl::from));
        layer
    }

    fn blob(id: &str, size: usize) -> BlobRecord {
        BlobRecord::new(BlobId::new(id), vec![4u8; size], "application/octet-stream")
    }

    // -----------------------------------------------------------------------
    // Single-payload layers
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stored_blob_yields_handle_of_same_size() {
        let f = fixture().await;
        let layer = splat("layer-1", &f.ws, None);
        f.store.put_layer(&layer, &[blob("layer-1", 3200)]).await.unwrap();

        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        let url = layers[0].url().unwrap();
        assert!(url.is_ephemeral());
        assert_eq!(f.handles.resolve(url).unwrap().len(), 3200);
    }

    #[tokio::test]
    async fn each_load_mints_a_new_handle() {
        let f = fixture().await;
        let layer = splat("layer-1", &f.ws, None);
        f.store.put_layer(&layer, &[blob("layer-1", 64)]).await.unwrap();

        let first = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        let second = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        assert_ne!(first[0].url(), second[0].url());
        assert_eq!(f.handles.live_count(), 1);
    }

    #[tokio::test]
    async fn remote_url_passes_through() {
        let f = fixture().await;
        let layer = splat("layer-1", &f.ws, Some("https://cdn.example/a.splat"));
        f.store.put_layer_metadata(&layer).await.unwrap();

        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        assert_eq!(layers[0].url().unwrap().as_str(), "https://cdn.example/a.splat");
        assert_eq!(f.handles.live_count(), 0);
    }

    #[tokio::test]
    async fn stale_handle_without_blob_becomes_placeholder() {
        let f = fixture().await;
        let layer = splat("layer-1", &f.ws, Some("blob:geohub/old-session/x"));
        f.store.put_layer_metadata(&layer).await.unwrap();

        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].url().is_none());
    }

    #[tokio::test]
    async fn live_session_handle_without_blob_is_kept() {
        let f = fixture().await;
        let url = f.handles.mint_record(&blob("layer-1", 32));
        let layer = splat("layer-1", &f.ws, Some(url.as_str()));
        f.store.put_layer_metadata(&layer).await.unwrap();

        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        assert_eq!(layers[0].url(), Some(&url));
    }

    #[tokio::test]
    async fn cloud_without_anything_is_placeholder() {
        let f = fixture().await;
        let layer = Layer::new(
            LayerId::new("pc-1"),
            f.ws.clone(),
            "cloud",
            LayerContent::PointCloud(PointCloud {
                point_count: 0,
                format: PointCloudFormat::Las,
                url: None,
            }),
        );
        f.store.put_layer_metadata(&layer).await.unwrap();
        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        assert_eq!(layers[0].id, layer.id);
        assert!(layers[0].url().is_none());
    }

    // -----------------------------------------------------------------------
    // Photo sets
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn photo_images_rehydrate_independently() {
        let f = fixture().await;
        let layer = Layer::new(
            LayerId::new("photos"),
            f.ws.clone(),
            "photos",
            LayerContent::PhotoSet(PhotoSet {
                images: vec![
                    GeoImage::new(ImageId::new("img-a"), "a.jpg"),
                    GeoImage::new(ImageId::new("img-b"), "b.jpg")
                        .with_url(AssetUrl::from("blob:geohub/old/b")),
                    GeoImage::new(ImageId::new("img-c"), "c.jpg")
                        .with_url(AssetUrl::from("https://cdn.example/c.jpg")),
                ],
            }),
        );
        f.store.put_layer(&layer, &[blob("img-a", 10)]).await.unwrap();

        let layers = f.rehydrator.load_workspace_layers(&f.ws).await.unwrap();
        let images = layers[0].images().unwrap();
        let a = images[0].url.as_ref().unwrap();
        assert_eq!(f.handles.resolve(a).unwrap().len(), 10);
        assert!(images[1].url.is_none());
        assert_eq!(images[2].url.as_ref().unwrap().as_str(), "https://cdn.example/c.jpg");
    }
}
