use std::sync::Arc;

use chrono::Utc;
use geohub_store::{AssetStore, HandleRegistry};
use geohub_types::{Workspace, WorkspaceId};
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

const DEMO_NAME: &str = "DEMO";
const DEMO_DESCRIPTION: &str = "Demonstration environment (local data)";

/// Owns workspace rows: the default demo workspace, the active workspace,
/// and explicit create/delete.
pub struct WorkspaceRegistrar {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
}

impl WorkspaceRegistrar {
    pub fn new(store: Arc<dyn AssetStore>, handles: Arc<HandleRegistry>) -> Self {
        Self { store, handles }
    }

    /// Return the demo workspace, creating it empty if missing. Idempotent.
    pub async fn ensure_default_workspace(&self) -> SdkResult<Workspace> {
        let id = WorkspaceId::demo();
        match self.store.get_workspace(&id).await {
            Ok(ws) => Ok(ws),
            Err(e) if e.is_not_found() => {
                let ws = Workspace::new(id, DEMO_NAME).with_description(DEMO_DESCRIPTION);
                self.store.put_workspace(&ws).await?;
                info!(workspace = %ws.id, "default workspace created");
                Ok(ws)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The remembered workspace if it still exists, else the default one.
    /// The chosen workspace is stamped as last active unless it already is
    /// the most recently active one, so repeated resolves write nothing.
    pub async fn resolve_active_workspace(
        &self,
        last_used: Option<&WorkspaceId>,
    ) -> SdkResult<Workspace> {
        let default = self.ensure_default_workspace().await?;
        let chosen = match last_used {
            Some(id) if id != &default.id => match self.store.get_workspace(id).await {
                Ok(ws) => ws,
                Err(e) if e.is_not_found() => {
                    debug!(workspace = %id, "remembered workspace is gone, using default");
                    default
                }
                Err(e) => return Err(e.into()),
            },
            _ => default,
        };
        if self.is_latest_active(&chosen).await? {
            return Ok(chosen);
        }
        self.touch(chosen).await
    }

    pub async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> SdkResult<Workspace> {
        let mut ws = Workspace::new(WorkspaceId::generate(), name.trim());
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            ws = ws.with_description(description);
        }
        self.store.put_workspace(&ws).await?;
        info!(workspace = %ws.id, name = %ws.name, "workspace created");
        Ok(ws)
    }

    pub async fn list_workspaces(&self) -> SdkResult<Vec<Workspace>> {
        let mut all = self.store.list_workspaces().await?;
        all.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    /// Delete a workspace with all of its layers and blobs, releasing their
    /// handles. The demo workspace is protected. Returns the layer count removed.
    pub async fn delete_workspace(&self, id: &WorkspaceId) -> SdkResult<usize> {
        if id.is_demo() {
            return Err(SdkError::ProtectedWorkspace(id.clone()));
        }
        let layers = self.store.delete_workspace_cascade(id).await?;
        for layer in &layers {
            self.handles.release_layer(layer);
        }
        info!(workspace = %id, layers = layers.len(), "workspace deleted");
        Ok(layers.len())
    }

    async fn is_latest_active(&self, ws: &Workspace) -> SdkResult<bool> {
        let Some(stamp) = ws.last_active else {
            return Ok(false);
        };
        let all = self.store.list_workspaces().await?;
        Ok(all
            .iter()
            .filter(|other| other.id != ws.id)
            .all(|other| other.last_active.map_or(true, |t| t <= stamp)))
    }

    async fn touch(&self, mut ws: Workspace) -> SdkResult<Workspace> {
        ws.last_active = Some(Utc::now());
        self.store.put_workspace(&ws).await?;
        Ok(ws)
    }
}
