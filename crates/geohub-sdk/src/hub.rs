use std::sync::Arc;

use geohub_demo::{BootstrapReport, DemoBootstrap, DemoCatalog, Fetcher, HttpFetcher, OfflineFetcher};
use geohub_ingest::{
    AssetKind, ExifToolExtractor, GpsExtractor, IngestFile, IngestPipeline, NoGpsExtractor,
};
use geohub_store::{AssetStore, DiskAssetStore, HandleRegistry, InMemoryAssetStore};
use geohub_types::{BlobId, BlobRecord, Layer, LayerId, LayerPatch, Workspace, WorkspaceId};
use tracing::info;

use crate::config::HubConfig;
use crate::error::SdkResult;
use crate::lifecycle::LifecycleManager;
use crate::registrar::WorkspaceRegistrar;
use crate::rehydrate::Rehydrator;

/// Application facade over one store and one session's handle registry.
///
/// ```no_run
/// # async fn demo() -> geohub_sdk::SdkResult<()> {
/// use geohub_sdk::{GeoHub, HubConfig};
///
/// let hub = GeoHub::open(&HubConfig::default())?;
/// let ws = hub.resolve_active_workspace(None).await?;
/// let layers = hub.load_workspace_layers(&ws.id).await?;
/// # Ok(()) }
/// ```
pub struct GeoHub {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
    registrar: WorkspaceRegistrar,
    rehydrator: Rehydrator,
    lifecycle: LifecycleManager,
    ingest: IngestPipeline,
    demo: DemoBootstrap,
}

impl GeoHub {
    pub fn new(
        store: Arc<dyn AssetStore>,
        fetcher: Arc<dyn Fetcher>,
        gps: Arc<dyn GpsExtractor>,
        catalog: DemoCatalog,
    ) -> Self {
        let handles = Arc::new(HandleRegistry::new());
        Self {
            registrar: WorkspaceRegistrar::new(Arc::clone(&store), Arc::clone(&handles)),
            rehydrator: Rehydrator::new(Arc::clone(&store), Arc::clone(&handles)),
            lifecycle: LifecycleManager::new(Arc::clone(&store), Arc::clone(&handles)),
            ingest: IngestPipeline::new(Arc::clone(&store), Arc::clone(&handles), Arc::clone(&gps)),
            demo: DemoBootstrap::new(
                Arc::clone(&store),
                Arc::clone(&handles),
                fetcher,
                gps,
                catalog,
            ),
            store,
            handles,
        }
    }

    /// Open a disk-backed hub as described by `config`.
    pub fn open(config: &HubConfig) -> SdkResult<Self> {
        let store = DiskAssetStore::open(&config.data_dir, config.storage_quota_bytes)?;
        let fetcher = HttpFetcher::new(config.http_timeout())?;
        let gps: Arc<dyn GpsExtractor> = match &config.exiftool {
            Some(exe) => Arc::new(ExifToolExtractor::new(exe.clone())),
            None => Arc::new(NoGpsExtractor),
        };
        info!(data_dir = %config.data_dir.display(), "hub opened");
        Ok(Self::new(
            Arc::new(store),
            Arc::new(fetcher),
            gps,
            config.demo.clone(),
        ))
    }

    /// A throwaway hub: memory store, no network, no GPS extraction.
    pub fn in_memory(catalog: DemoCatalog) -> Self {
        Self::new(
            Arc::new(InMemoryAssetStore::new()),
            Arc::new(OfflineFetcher),
            Arc::new(NoGpsExtractor),
            catalog,
        )
    }

    pub fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }

    // ---- Workspaces ----

    pub async fn ensure_default_workspace(&self) -> SdkResult<Workspace> {
        self.registrar.ensure_default_workspace().await
    }

    pub async fn resolve_active_workspace(
        &self,
        last_used: Option<&WorkspaceId>,
    ) -> SdkResult<Workspace> {
        self.registrar.resolve_active_workspace(last_used).await
    }

    pub async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> SdkResult<Workspace> {
        self.registrar.create_workspace(name, description).await
    }

    pub async fn list_workspaces(&self) -> SdkResult<Vec<Workspace>> {
        self.registrar.list_workspaces().await
    }

    pub async fn get_workspace(&self, id: &WorkspaceId) -> SdkResult<Workspace> {
        Ok(self.store.get_workspace(id).await?)
    }

    pub async fn delete_workspace(&self, id: &WorkspaceId) -> SdkResult<usize> {
        self.registrar.delete_workspace(id).await
    }

    // ---- Layers ----

    pub async fn load_workspace_layers(&self, workspace: &WorkspaceId) -> SdkResult<Vec<Layer>> {
        self.rehydrator.load_workspace_layers(workspace).await
    }

    /// Ingest user files. A failure aborts this upload only.
    pub async fn handle_upload(
        &self,
        workspace: &WorkspaceId,
        files: Vec<IngestFile>,
        name: Option<&str>,
        kind: AssetKind,
    ) -> SdkResult<Vec<Layer>> {
        Ok(self.ingest.ingest(workspace, files, name, kind).await?)
    }

    pub async fn run_demo_bootstrap(&self, workspace: &WorkspaceId) -> SdkResult<BootstrapReport> {
        Ok(self.demo.run(workspace).await?)
    }

    pub async fn toggle_visibility(&self, id: &LayerId) -> SdkResult<Layer> {
        self.lifecycle.toggle_visibility(id).await
    }

    pub async fn update_layer(&self, id: &LayerId, patch: &LayerPatch) -> SdkResult<Layer> {
        self.lifecycle.update_layer(id, patch).await
    }

    pub async fn delete_layer(&self, id: &LayerId) -> SdkResult<Layer> {
        self.lifecycle.delete_layer(id).await
    }

    /// Raw payload of a layer or photo-set image.
    pub async fn read_blob(&self, id: &BlobId) -> SdkResult<BlobRecord> {
        Ok(self.store.get_blob(id).await?)
    }

    /// Wipe the store and invalidate every handle of this session.
    pub async fn clear_all(&self) -> SdkResult<()> {
        self.store.clear().await?;
        let released = self.handles.release_all();
        info!(released, "all data cleared");
        Ok(())
    }
}

impl std::fmt::Debug for GeoHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoHub")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}
