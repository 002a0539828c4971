use std::sync::Arc;

use geohub_store::{AssetStore, HandleRegistry};
use geohub_types::{Layer, LayerId, LayerPatch};
use tracing::{debug, info};

use crate::error::SdkResult;

/// Visibility and metadata updates plus cascading deletes.
///
/// Updates read the stored row, merge, and write the whole row back; images
/// of a photo set are not rows of their own, so an image edit rewrites the
/// owning layer.
pub struct LifecycleManager {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn AssetStore>, handles: Arc<HandleRegistry>) -> Self {
        Self { store, handles }
    }

    pub async fn toggle_visibility(&self, id: &LayerId) -> SdkResult<Layer> {
        let mut layer = self.store.get_layer(id).await?;
        layer.visible = !layer.visible;
        self.store.put_layer_metadata(&layer).await?;
        debug!(layer = %id, visible = layer.visible, "visibility toggled");
        Ok(layer)
    }

    /// Merge `patch` into the stored layer. An invalid patch leaves the
    /// stored row untouched.
    pub async fn update_layer(&self, id: &LayerId, patch: &LayerPatch) -> SdkResult<Layer> {
        let mut layer = self.store.get_layer(id).await?;
        if patch.is_empty() {
            return Ok(layer);
        }
        patch.apply_to(&mut layer)?;
        self.store.put_layer_metadata(&layer).await?;
        debug!(layer = %id, "layer updated");
        Ok(layer)
    }

    /// Delete a layer with its blob(s) and release every handle minted for it.
    pub async fn delete_layer(&self, id: &LayerId) -> SdkResult<Layer> {
        let layer = self.store.delete_layer_cascade(id).await?;
        let released = self.handles.release_layer(&layer);
        info!(layer = %id, released, "layer deleted");
        Ok(layer)
    }
}
