//! Table state shared by the store backends.
//!
//! Every method either validates (and may fail) or mutates (and cannot fail),
//! so a backend that validates first and mutates second never leaves a
//! transaction half-applied.

use std::collections::BTreeMap;

use geohub_types::{BlobId, BlobRecord, Layer, LayerId, Workspace, WorkspaceId};
use serde::{Deserialize, Serialize};

use crate::error::{RecordKind, StoreError, StoreResult};

/// A blob row as a backend holds it.
pub(crate) trait BlobEntry {
    fn size(&self) -> u64;
}

impl BlobEntry for BlobRecord {
    fn size(&self) -> u64 {
        BlobRecord::size(self)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Catalog<B> {
    pub workspaces: BTreeMap<WorkspaceId, Workspace>,
    pub layers: BTreeMap<LayerId, Layer>,
    pub blobs: BTreeMap<BlobId, B>,
}

impl<B> Default for Catalog<B> {
    fn default() -> Self {
        Self {
            workspaces: BTreeMap::new(),
            layers: BTreeMap::new(),
            blobs: BTreeMap::new(),
        }
    }
}

impl<B: BlobEntry> Catalog<B> {
    pub fn workspace(&self, id: &WorkspaceId) -> StoreResult<Workspace> {
        self.workspaces
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(RecordKind::Workspace, id))
    }

    pub fn layer(&self, id: &LayerId) -> StoreResult<Layer> {
        self.layers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(RecordKind::Layer, id))
    }

    pub fn require_workspace(&self, id: &WorkspaceId) -> StoreResult<()> {
        if self.workspaces.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::UnknownWorkspace(id.clone()))
        }
    }

    /// Layers owned by `workspace`, oldest first.
    pub fn layers_in(&self, workspace: &WorkspaceId) -> Vec<Layer> {
        let mut layers: Vec<Layer> = self
            .layers
            .values()
            .filter(|l| &l.workspace_id == workspace)
            .cloned()
            .collect();
        layers.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        layers
    }

    pub fn count_in(&self, workspace: &WorkspaceId) -> u64 {
        self.layers
            .values()
            .filter(|l| &l.workspace_id == workspace)
            .count() as u64
    }

    pub fn blob_bytes(&self) -> u64 {
        self.blobs.values().map(BlobEntry::size).sum()
    }

    /// Reject `incoming` if writing it would push total blob bytes past `capacity`.
    ///
    /// Blobs that replace an existing row only count the difference.
    pub fn check_quota(&self, capacity: Option<u64>, incoming: &[BlobRecord]) -> StoreResult<()> {
        let Some(capacity) = capacity else {
            return Ok(());
        };
        let requested: u64 = incoming.iter().map(BlobRecord::size).sum();
        let replaced: u64 = incoming
            .iter()
            .filter_map(|b| self.blobs.get(&b.id))
            .map(BlobEntry::size)
            .sum();
        let retained = self.blob_bytes().saturating_sub(replaced);
        if retained + requested > capacity {
            return Err(StoreError::StorageQuotaExceeded {
                requested,
                available: capacity.saturating_sub(retained),
            });
        }
        Ok(())
    }

    pub fn recount(&mut self, workspace: &WorkspaceId) {
        let count = self.count_in(workspace);
        if let Some(ws) = self.workspaces.get_mut(workspace) {
            ws.item_count = count;
        }
    }

    /// Upsert a workspace row; its item count is derived, not trusted.
    pub fn put_workspace(&mut self, workspace: Workspace) {
        let id = workspace.id.clone();
        self.workspaces.insert(id.clone(), workspace);
        self.recount(&id);
    }

    /// Upsert a layer row and recount every workspace it touched.
    pub fn put_layer(&mut self, layer: Layer) {
        let workspace = layer.workspace_id.clone();
        let previous = self.layers.insert(layer.id.clone(), layer);
        if let Some(prev) = previous {
            if prev.workspace_id != workspace {
                self.recount(&prev.workspace_id);
            }
        }
        self.recount(&workspace);
    }

    /// Remove a layer, every blob it owns, and recount its workspace.
    pub fn remove_layer(&mut self, id: &LayerId) -> StoreResult<(Layer, Vec<B>)> {
        let layer = self
            .layers
            .remove(id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Layer, id))?;
        let blobs = self.remove_blobs_of(&layer);
        self.recount(&layer.workspace_id);
        Ok((layer, blobs))
    }

    /// Remove a workspace together with all of its layers and their blobs.
    pub fn remove_workspace(&mut self, id: &WorkspaceId) -> StoreResult<(Vec<Layer>, Vec<B>)> {
        if self.workspaces.remove(id).is_none() {
            return Err(StoreError::not_found(RecordKind::Workspace, id));
        }
        let owned: Vec<LayerId> = self
            .layers
            .values()
            .filter(|l| &l.workspace_id == id)
            .map(|l| l.id.clone())
            .collect();
        let mut layers = Vec::with_capacity(owned.len());
        let mut blobs = Vec::new();
        for layer_id in owned {
            if let Some(layer) = self.layers.remove(&layer_id) {
                blobs.extend(self.remove_blobs_of(&layer));
                layers.push(layer);
            }
        }
        Ok((layers, blobs))
    }

    pub fn clear(&mut self) {
        self.workspaces.clear();
        self.layers.clear();
        self.blobs.clear();
    }

    fn remove_blobs_of(&mut self, layer: &Layer) -> Vec<B> {
        let mut owners = layer.blob_owners();
        // A photo set never has a blob of its own, but a stray row keyed by
        // the layer id must not outlive it either.
        let layer_key = BlobId::from(&layer.id);
        if !owners.contains(&layer_key) {
            owners.push(layer_key);
        }
        owners
            .iter()
            .filter_map(|owner| self.blobs.remove(owner))
            .collect()
    }
}
