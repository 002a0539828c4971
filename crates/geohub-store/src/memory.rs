use std::sync::RwLock;

use async_trait::async_trait;
use geohub_types::{BlobId, BlobRecord, Layer, LayerId, Workspace, WorkspaceId};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{RecordKind, StoreError, StoreResult};
use crate::traits::AssetStore;

/// In-memory asset store.
///
/// Intended for tests and embedding. All tables sit behind one `RwLock`, so
/// each transaction is applied under a single write guard. An optional
/// capacity bounds the total blob bytes, mimicking a browser storage quota.
pub struct InMemoryAssetStore {
    catalog: RwLock<Catalog<BlobRecord>>,
    capacity: Option<u64>,
}

impl InMemoryAssetStore {
    /// Create a new empty store without a blob quota.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            capacity: None,
        }
    }

    /// Create a store whose blobs may occupy at most `bytes`.
    pub fn with_capacity(bytes: u64) -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            capacity: Some(bytes),
        }
    }

    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    pub fn layer_count(&self) -> usize {
        self.catalog.read().expect("lock poisoned").layers.len()
    }

    pub fn blob_count(&self) -> usize {
        self.catalog.read().expect("lock poisoned").blobs.len()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.catalog.read().expect("lock poisoned").blob_bytes()
    }

    pub fn contains_blob(&self, id: &BlobId) -> bool {
        self.catalog
            .read()
            .expect("lock poisoned")
            .blobs
            .contains_key(id)
    }
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn put_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        let mut catalog = self.catalog.write().expect("lock poisoned");
        catalog.put_workspace(workspace.clone());
        Ok(())
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> StoreResult<Workspace> {
        self.catalog.read().expect("lock poisoned").workspace(id)
    }

    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let catalog = self.catalog.read().expect("lock poisoned");
        Ok(catalog.workspaces.values().cloned().collect())
    }

    async fn delete_workspace_cascade(&self, id: &WorkspaceId) -> StoreResult<Vec<Layer>> {
        let mut catalog = self.catalog.write().expect("lock poisoned");
        let (layers, blobs) = catalog.remove_workspace(id)?;
        debug!(workspace = %id, layers = layers.len(), blobs = blobs.len(), "workspace deleted");
        Ok(layers)
    }

    async fn list_layers(&self, workspace: &WorkspaceId) -> StoreResult<Vec<Layer>> {
        Ok(self.catalog.read().expect("lock poisoned").layers_in(workspace))
    }

    async fn get_layer(&self, id: &LayerId) -> StoreResult<Layer> {
        self.catalog.read().expect("lock poisoned").layer(id)
    }

    async fn put_layer(&self, layer: &Layer, blobs: &[BlobRecord]) -> StoreResult<()> {
        let mut catalog = self.catalog.write().expect("lock poisoned");
        catalog.require_workspace(&layer.workspace_id)?;
        catalog.check_quota(self.capacity, blobs)?;

        catalog.put_layer(layer.clone());
        for blob in blobs {
            catalog.blobs.insert(blob.id.clone(), blob.clone());
        }
        debug!(layer = %layer.id, blobs = blobs.len(), "layer written");
        Ok(())
    }

    async fn get_blob(&self, id: &BlobId) -> StoreResult<BlobRecord> {
        let catalog = self.catalog.read().expect("lock poisoned");
        catalog
            .blobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(RecordKind::Blob, id))
    }

    async fn delete_layer_cascade(&self, id: &LayerId) -> StoreResult<Layer> {
        let mut catalog = self.catalog.write().expect("lock poisoned");
        let (layer, blobs) = catalog.remove_layer(id)?;
        debug!(layer = %id, blobs = blobs.len(), "layer deleted");
        Ok(layer)
    }

    async fn count_layers(&self, workspace: &WorkspaceId) -> StoreResult<u64> {
        Ok(self.catalog.read().expect("lock poisoned").count_in(workspace))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.catalog.write().expect("lock poisoned").clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAssetStore")
            .field("layer_count", &self.layer_count())
            .field("blob_count", &self.blob_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    async fn seeded() -> InMemoryAssetStore {
        let store = InMemoryAssetStore::new();
        store.put_workspace(&workspace("ws-1")).await.unwrap();
        store
    }

    // -----------------------------------------------------------------------
    // Workspaces
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get_workspace() {
        let store = seeded().await;
        let ws = store.get_workspace(&WorkspaceId::new("ws-1")).await.unwrap();
        assert_eq!(ws.name, "ws-1");
        assert_eq!(ws.item_count, 0);
    }

    #[tokio::test]
    async fn missing_workspace_is_not_found() {
        let store = InMemoryAssetStore::new();
        let err = store.get_workspace(&WorkspaceId::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn put_workspace_ignores_caller_item_count() {
        let store = seeded().await;
        let mut ws = workspace("ws-1");
        ws.item_count = 99;
        store.put_workspace(&ws).await.unwrap();
        let stored = store.get_workspace(&ws.id).await.unwrap();
        assert_eq!(stored.item_count, 0);
    }

    // -----------------------------------------------------------------------
    // Layer writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_layer_with_blob_updates_count() {
        let store = seeded().await;
        let layer = splat("layer-1", "ws-1");
        store
            .put_layer(&layer, &[blob_for(&layer.id, 3200)])
            .await
            .unwrap();

        assert_eq!(store.get_layer(&layer.id).await.unwrap(), layer);
        assert_eq!(store.get_blob(&BlobId::from(&layer.id)).await.unwrap().size(), 3200);
        let ws = store.get_workspace(&WorkspaceId::new("ws-1")).await.unwrap();
        assert_eq!(ws.item_count, 1);
    }

    #[tokio::test]
    async fn put_layer_into_unknown_workspace_fails() {
        let store = seeded().await;
        let layer = splat("layer-1", "ghost");
        let err = store
            .put_layer(&layer, &[blob_for(&layer.id, 10)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownWorkspace(_)));
        assert_eq!(store.layer_count(), 0);
        assert_eq!(store.blob_count(), 0);
    }

    #[tokio::test]
    async fn quota_rejection_writes_nothing() {
        let store = InMemoryAssetStore::with_capacity(1000);
        store.put_workspace(&workspace("ws-1")).await.unwrap();
        let layer = splat("layer-1", "ws-1");
        let err = store
            .put_layer(&layer, &[blob_for(&layer.id, 1001)])
            .await
            .unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.get_layer(&layer.id).await.unwrap_err().is_not_found());
        assert_eq!(store.count_layers(&WorkspaceId::new("ws-1")).await.unwrap(), 0);
        let ws = store.get_workspace(&WorkspaceId::new("ws-1")).await.unwrap();
        assert_eq!(ws.item_count, 0);
    }

    #[tokio::test]
    async fn metadata_only_path_skips_blob() {
        let store = InMemoryAssetStore::with_capacity(10);
        store.put_workspace(&workspace("ws-1")).await.unwrap();
        let layer = splat("layer-1", "ws-1");
        store.put_layer_metadata(&layer).await.unwrap();
        assert_eq!(store.count_layers(&WorkspaceId::new("ws-1")).await.unwrap(), 1);
        assert!(store
            .get_blob(&BlobId::from(&layer.id))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn replacing_a_blob_counts_only_the_difference() {
        let store = InMemoryAssetStore::with_capacity(1000);
        store.put_workspace(&workspace("ws-1")).await.unwrap();
        let layer = splat("layer-1", "ws-1");
        store.put_layer(&layer, &[blob_for(&layer.id, 800)]).await.unwrap();
        store.put_layer(&layer, &[blob_for(&layer.id, 900)]).await.unwrap();
        assert_eq!(store.total_bytes(), 900);
        assert_eq!(store.count_layers(&layer.workspace_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_layers_filters_by_workspace() {
        let store = seeded().await;
        store.put_workspace(&workspace("ws-2")).await.unwrap();
        store.put_layer_metadata(&splat("a", "ws-1")).await.unwrap();
        store.put_layer_metadata(&splat("b", "ws-2")).await.unwrap();
        store.put_layer_metadata(&splat("c", "ws-1")).await.unwrap();

        let layers = store.list_layers(&WorkspaceId::new("ws-1")).await.unwrap();
        let ids: Vec<&str> = layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a") && ids.contains(&"c"));
    }

    // -----------------------------------------------------------------------
    // Deletes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_photo_set_removes_every_image_blob() {
        let store = seeded().await;
        let layer = photo_set("photos", "ws-1", &["img-a", "img-b", "img-c"]);
        let blobs: Vec<BlobRecord> = ["img-a", "img-b", "img-c"]
            .iter()
            .map(|id| BlobRecord::new(BlobId::new(*id), vec![1u8; 16], "image/jpeg"))
            .collect();
        store.put_layer(&layer, &blobs).await.unwrap();
        assert_eq!(store.blob_count(), 3);

        let deleted = store.delete_layer_cascade(&layer.id).await.unwrap();
        assert_eq!(deleted.id, layer.id);
        assert_eq!(store.blob_count(), 0);
        assert_eq!(store.count_layers(&layer.workspace_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_decrements_item_count_by_one() {
        let store = seeded().await;
        for id in ["a", "b", "c"] {
            let layer = splat(id, "ws-1");
            store.put_layer(&layer, &[blob_for(&layer.id, 64)]).await.unwrap();
        }
        let before = store.get_workspace(&WorkspaceId::new("ws-1")).await.unwrap().item_count;
        store.delete_layer_cascade(&LayerId::new("b")).await.unwrap();
        let after = store.get_workspace(&WorkspaceId::new("ws-1")).await.unwrap().item_count;
        assert_eq!(before - after, 1);
        assert!(!store.contains_blob(&BlobId::new("b")));
    }

    #[tokio::test]
    async fn delete_missing_layer_is_not_found() {
        let store = seeded().await;
        let err = store.delete_layer_cascade(&LayerId::new("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn workspace_cascade_removes_layers_and_blobs() {
        let store = seeded().await;
        store.put_workspace(&workspace("ws-2")).await.unwrap();
        let keep = splat("keep", "ws-2");
        store.put_layer(&keep, &[blob_for(&keep.id, 8)]).await.unwrap();
        for id in ["x", "y"] {
            let layer = splat(id, "ws-1");
            store.put_layer(&layer, &[blob_for(&layer.id, 8)]).await.unwrap();
        }

        let removed = store
            .delete_workspace_cascade(&WorkspaceId::new("ws-1"))
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.layer_count(), 1);
        assert_eq!(store.blob_count(), 1);
        assert!(store.get_workspace(&WorkspaceId::new("ws-1")).await.is_err());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = seeded().await;
        let layer = splat("a", "ws-1");
        store.put_layer(&layer, &[blob_for(&layer.id, 8)]).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list_workspaces().await.unwrap().is_empty());
        assert_eq!(store.layer_count(), 0);
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryAssetStore::with_capacity(5);
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryAssetStore"));
        assert!(debug.contains("capacity"));
    }
}
