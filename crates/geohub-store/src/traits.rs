use async_trait::async_trait;
use geohub_types::{BlobId, BlobRecord, Layer, LayerId, Workspace, WorkspaceId};

use crate::error::StoreResult;

/// Transactional store for workspaces, layers, and blobs.
///
/// All implementations must satisfy these invariants:
/// - After every successful write or delete, each touched workspace's
///   `item_count` equals the number of layers that reference it.
/// - A layer's `workspace_id` references an existing workspace.
/// - Multi-row writes are atomic: either every row lands or none does.
/// - Reads of a missing id fail with `StoreError::NotFound`.
///
/// There is no cross-operation locking: two concurrent transactions are each
/// consistent, but their interleaving is not serialized.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Insert or replace a workspace. The stored item count is recomputed
    /// from the layer table, whatever value the caller passed.
    async fn put_workspace(&self, workspace: &Workspace) -> StoreResult<()>;

    async fn get_workspace(&self, id: &WorkspaceId) -> StoreResult<Workspace>;

    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>>;

    /// Delete a workspace, its layers, and all of their blobs.
    /// Returns the deleted layers.
    async fn delete_workspace_cascade(&self, id: &WorkspaceId) -> StoreResult<Vec<Layer>>;

    /// Layers owned by `workspace`, oldest first.
    async fn list_layers(&self, workspace: &WorkspaceId) -> StoreResult<Vec<Layer>>;

    async fn get_layer(&self, id: &LayerId) -> StoreResult<Layer>;

    /// Write a layer row, its blob rows, and the owning workspace's item
    /// count as one atomic unit.
    ///
    /// Fails with `StorageQuotaExceeded` (and writes nothing) when the blobs
    /// do not fit.
    async fn put_layer(&self, layer: &Layer, blobs: &[BlobRecord]) -> StoreResult<()>;

    /// Write only the layer row and item count, leaving blob rows untouched.
    ///
    /// Used for metadata updates and for the degraded metadata-only path
    /// after a blob write was rejected.
    async fn put_layer_metadata(&self, layer: &Layer) -> StoreResult<()> {
        self.put_layer(layer, &[]).await
    }

    async fn get_blob(&self, id: &BlobId) -> StoreResult<BlobRecord>;

    /// Delete a layer row and every blob it owns (each image's blob for a
    /// photo set), recomputing the item count. Returns the deleted layer.
    async fn delete_layer_cascade(&self, id: &LayerId) -> StoreResult<Layer>;

    async fn count_layers(&self, workspace: &WorkspaceId) -> StoreResult<u64>;

    /// Remove every workspace, layer, and blob.
    async fn clear(&self) -> StoreResult<()>;
}
