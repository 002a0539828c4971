use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geohub_ingest::{resolve_position, GpsExtractor};
use geohub_store::{AssetStore, HandleRegistry};
use geohub_types::{
    BlobId, BlobRecord, GaussianSplat, GeoImage, ImageId, Layer, LayerContent, LayerId, PhotoSet,
    PointCloud, PointCloudFormat, WorkspaceId,
};
use tracing::{debug, info, warn};

use crate::catalog::DemoCatalog;
use crate::error::{DemoError, DemoResult};
use crate::fetch::Fetcher;
use crate::loader::{transition, Acquired, AssetState, TieredLoader};
use crate::source::{AssetSource, LocalSource, RemoteSource, Tier};
use crate::validate::PayloadValidator;

/// Final state of one demo asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Layer and blob(s) were committed.
    Persisted,
    /// The blob write failed; only metadata was kept, with session handles.
    MemoryOnly,
    /// Every source failed; the asset was skipped.
    Aborted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetReport {
    pub asset: String,
    pub outcome: AssetOutcome,
    pub tier: Option<Tier>,
    pub layer: Option<LayerId>,
}

/// What a bootstrap run did.
#[derive(Clone, Debug, Default)]
pub struct BootstrapReport {
    /// Layers deleted before seeding.
    pub removed: usize,
    pub assets: Vec<AssetReport>,
    /// Display copies of the created layers, with live handles.
    pub layers: Vec<Layer>,
}

impl BootstrapReport {
    pub fn outcome_of(&self, asset: &str) -> Option<AssetOutcome> {
        self.assets
            .iter()
            .find(|a| a.asset == asset)
            .map(|a| a.outcome)
    }
}

/// Resets the single-flight flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Seeds the demo workspace.
///
/// A run first cascades away every layer the workspace owns, then acquires
/// the splat, the point cloud, and each photo independently. Only one run may
/// be in flight; a concurrent call fails with [`DemoError::AlreadyRunning`].
pub struct DemoBootstrap {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
    fetcher: Arc<dyn Fetcher>,
    gps: Arc<dyn GpsExtractor>,
    catalog: DemoCatalog,
    loader: TieredLoader,
    running: AtomicBool,
}

impl DemoBootstrap {
    pub fn new(
        store: Arc<dyn AssetStore>,
        handles: Arc<HandleRegistry>,
        fetcher: Arc<dyn Fetcher>,
        gps: Arc<dyn GpsExtractor>,
        catalog: DemoCatalog,
    ) -> Self {
        let loader = TieredLoader::new(PayloadValidator::new(catalog.min_payload_bytes));
        Self {
            store,
            handles,
            fetcher,
            gps,
            catalog,
            loader,
            running: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &DemoCatalog {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn run(&self, workspace: &WorkspaceId) -> DemoResult<BootstrapReport> {
        if !workspace.is_demo() {
            return Err(DemoError::NotDemoWorkspace(workspace.clone()));
        }
        let _guard = RunGuard::acquire(&self.running).ok_or(DemoError::AlreadyRunning)?;
        self.store.get_workspace(workspace).await?;

        let mut report = BootstrapReport::default();
        for layer in self.store.list_layers(workspace).await? {
            self.store.delete_layer_cascade(&layer.id).await?;
            self.handles.release_layer(&layer);
            report.removed += 1;
        }
        info!(workspace = %workspace, removed = report.removed, "demo bootstrap started");

        self.seed_splat(workspace, &mut report).await;
        self.seed_point_cloud(workspace, &mut report).await;
        self.seed_photos(workspace, &mut report).await;

        info!(
            workspace = %workspace,
            layers = report.layers.len(),
            "demo bootstrap finished"
        );
        Ok(report)
    }

    fn sources(&self, remote: Option<&str>, local: Option<&str>) -> Vec<Box<dyn AssetSource>> {
        let mut sources: Vec<Box<dyn AssetSource>> = Vec::with_capacity(2);
        if let Some(url) = remote {
            sources.push(Box::new(RemoteSource::new(Arc::clone(&self.fetcher), url)));
        }
        if let Some(path) = local {
            sources.push(Box::new(LocalSource::new(&self.catalog.static_root, path)));
        }
        sources
    }

    async fn seed_splat(&self, workspace: &WorkspaceId, report: &mut BootstrapReport) {
        let asset = &self.catalog.splat;
        let sources = self.sources(asset.remote_url.as_deref(), asset.local_path.as_deref());
        let Some(acquired) = self.loader.acquire("splat", &sources).await else {
            report.assets.push(aborted("splat"));
            return;
        };

        let layer = Layer::new(
            LayerId::generate("demo-splat"),
            workspace.clone(),
            &asset.name,
            LayerContent::GaussianSplat(GaussianSplat::from_payload(
                &acquired.location,
                acquired.size(),
            )),
        );
        let blob = blob_of(BlobId::from(&layer.id), &acquired);
        self.finish("splat", acquired.tier, layer, vec![blob], report).await;
    }

    async fn seed_point_cloud(&self, workspace: &WorkspaceId, report: &mut BootstrapReport) {
        let asset = &self.catalog.point_cloud;
        let sources = self.sources(asset.remote_url.as_deref(), asset.local_path.as_deref());
        let Some(acquired) = self.loader.acquire("point_cloud", &sources).await else {
            report.assets.push(aborted("point_cloud"));
            return;
        };

        let layer = Layer::new(
            LayerId::generate("demo-pc"),
            workspace.clone(),
            &asset.name,
            LayerContent::PointCloud(PointCloud {
                point_count: 0,
                format: PointCloudFormat::from_file_name(&acquired.location),
                url: None,
            }),
        );
        let blob = blob_of(BlobId::from(&layer.id), &acquired);
        self.finish("point_cloud", acquired.tier, layer, vec![blob], report).await;
    }

    /// Each photo is acquired on its own; the ones that made it are saved as
    /// one photo-set layer.
    async fn seed_photos(&self, workspace: &WorkspaceId, report: &mut BootstrapReport) {
        let mut images = Vec::new();
        let mut blobs = Vec::new();
        let mut acquired_names = Vec::new();

        for photo in &self.catalog.photos {
            let sources = self.sources(photo.remote_url.as_deref(), photo.local_path.as_deref());
            let Some(acquired) = self.loader.acquire(&photo.filename, &sources).await else {
                report.assets.push(aborted(&photo.filename));
                continue;
            };

            let position = resolve_position(self.gps.read_gps(&acquired.payload.data).await.as_ref())
                .unwrap_or_else(|| {
                    debug!(photo = %photo.filename, "no GPS in demo photo, using catalog position");
                    photo.fallback_position()
                });
            let id = ImageId::generate();
            blobs.push(blob_of(BlobId::from(&id), &acquired));
            images.push(GeoImage::new(id, &photo.filename).with_position(Some(position)));
            acquired_names.push((photo.filename.clone(), acquired.tier));
        }

        if images.is_empty() {
            return;
        }

        let layer = Layer::new(
            LayerId::generate("demo-photo"),
            workspace.clone(),
            &self.catalog.photo_set_name,
            LayerContent::PhotoSet(PhotoSet { images }),
        );
        let layer_id = layer.id.clone();
        let outcome = self.save(&self.catalog.photo_set_name, layer, blobs, report).await;
        for (name, tier) in acquired_names {
            report.assets.push(AssetReport {
                asset: name,
                outcome,
                tier: Some(tier),
                layer: Some(layer_id.clone()),
            });
        }
    }

    async fn finish(
        &self,
        asset: &str,
        tier: Tier,
        layer: Layer,
        blobs: Vec<BlobRecord>,
        report: &mut BootstrapReport,
    ) {
        let layer_id = layer.id.clone();
        let outcome = self.save(asset, layer, blobs, report).await;
        report.assets.push(AssetReport {
            asset: asset.to_string(),
            outcome,
            tier: Some(tier),
            layer: Some(layer_id),
        });
    }

    /// SAVE, falling back to MEMORY_FALLBACK when the blob write fails.
    async fn save(
        &self,
        asset: &str,
        mut layer: Layer,
        blobs: Vec<BlobRecord>,
        report: &mut BootstrapReport,
    ) -> AssetOutcome {
        let state = transition(asset, AssetState::Validate, AssetState::Save);

        let outcome = match self.store.put_layer(&layer, &blobs).await {
            Ok(()) => {
                attach_handles(&self.handles, &mut layer, &blobs);
                AssetOutcome::Persisted
            }
            Err(err) => {
                let state = transition(asset, state, AssetState::MemoryFallback);
                warn!(asset, error = %err, "demo save failed, keeping payload in memory");
                attach_handles(&self.handles, &mut layer, &blobs);
                if let Err(err) = self.store.put_layer_metadata(&layer).await {
                    warn!(asset, ?state, error = %err, "demo metadata write failed, layer is session-only");
                }
                AssetOutcome::MemoryOnly
            }
        };

        transition(asset, AssetState::Save, AssetState::Done);
        info!(asset, layer = %layer.id, ?outcome, "demo asset ready");
        report.layers.push(layer);
        outcome
    }
}

fn aborted(asset: &str) -> AssetReport {
    AssetReport {
        asset: asset.to_string(),
        outcome: AssetOutcome::Aborted,
        tier: None,
        layer: None,
    }
}

fn blob_of(id: BlobId, acquired: &Acquired) -> BlobRecord {
    BlobRecord::new(id, acquired.payload.data.clone(), acquired.mime_type())
}

/// Point the layer's payload URL(s) at freshly minted handles.
fn attach_handles(handles: &HandleRegistry, layer: &mut Layer, blobs: &[BlobRecord]) {
    match layer.images_mut() {
        Some(images) => {
            for image in images.iter_mut() {
                let owner = BlobId::from(&image.id);
                if let Some(blob) = blobs.iter().find(|b| b.id == owner) {
                    image.url = Some(handles.mint_record(blob));
                }
            }
        }
        None => {
            let url = blobs.first().map(|blob| handles.mint_record(blob));
            layer.set_url(url);
        }
    }
}
