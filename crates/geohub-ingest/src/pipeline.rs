use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use geohub_store::{AssetStore, HandleLease, HandleRegistry};
use geohub_types::{
    BlobId, BlobRecord, GaussianSplat, GeoImage, ImageId, Layer, LayerContent, LayerId, PhotoSet,
    PointCloud, PointCloudFormat, WorkspaceId,
};
use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::exif::GpsExtractor;
use crate::gps::resolve_position;
use crate::mime::resolve_mime_type;

/// What the user said an upload contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Splat,
    Cloud,
    Photo,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Splat => write!(f, "SPLAT"),
            Self::Cloud => write!(f, "CLOUD"),
            Self::Photo => write!(f, "PHOTO"),
        }
    }
}

impl FromStr for AssetKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "splat" => Ok(Self::Splat),
            "cloud" | "point-cloud" | "pointcloud" => Ok(Self::Cloud),
            "photo" | "photos" => Ok(Self::Photo),
            _ => Err(IngestError::UnknownKind(s.to_string())),
        }
    }
}

/// One user-selected file.
#[derive(Clone, Debug)]
pub struct IngestFile {
    pub name: String,
    pub data: Bytes,
    /// Type declared by whoever supplied the file, if any.
    pub mime_type: Option<String>,
}

impl IngestFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Read a file from disk, naming it after its final path component.
    pub async fn read(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn blob(&self, id: BlobId) -> BlobRecord {
        let mime_type = resolve_mime_type(self.mime_type.as_deref(), &self.data);
        BlobRecord::new(id, self.data.clone(), mime_type)
    }
}

/// Turns uploads into stored layers.
///
/// Every returned layer is a display copy: its payload URLs are live handles
/// from the shared registry. The stored rows carry no ephemeral URLs.
pub struct IngestPipeline {
    store: Arc<dyn AssetStore>,
    handles: Arc<HandleRegistry>,
    gps: Arc<dyn GpsExtractor>,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn AssetStore>,
        handles: Arc<HandleRegistry>,
        gps: Arc<dyn GpsExtractor>,
    ) -> Self {
        Self { store, handles, gps }
    }

    /// Ingest `files` into `workspace` as `kind`.
    ///
    /// - `Splat`: only the first file is used.
    /// - `Cloud`: each file becomes its own layer, written one at a time; a
    ///   failure rolls back the layers already written and releases their
    ///   handles, so the upload is applied whole or not at all.
    /// - `Photo`: all files share one new photo-set layer.
    pub async fn ingest(
        &self,
        workspace: &WorkspaceId,
        files: Vec<IngestFile>,
        name_hint: Option<&str>,
        kind: AssetKind,
    ) -> IngestResult<Vec<Layer>> {
        if files.is_empty() {
            return Err(IngestError::NoFiles);
        }
        let name_hint = name_hint.map(str::trim).filter(|n| !n.is_empty());
        debug!(workspace = %workspace, %kind, files = files.len(), "ingest started");

        match kind {
            AssetKind::Splat => {
                let layer = self.ingest_splat(workspace, files, name_hint).await?;
                Ok(vec![layer])
            }
            AssetKind::Cloud => self.ingest_clouds(workspace, files, name_hint).await,
            AssetKind::Photo => {
                let layer = self.ingest_photos(workspace, files, name_hint).await?;
                Ok(vec![layer])
            }
        }
    }

    async fn ingest_splat(
        &self,
        workspace: &WorkspaceId,
        files: Vec<IngestFile>,
        name_hint: Option<&str>,
    ) -> IngestResult<Layer> {
        let extra = files.len().saturating_sub(1);
        let file = files.into_iter().next().ok_or(IngestError::NoFiles)?;
        if extra > 0 {
            debug!(ignored = extra, "splat upload uses only the first file");
        }

        let mut layer = Layer::new(
            LayerId::generate("splat"),
            workspace.clone(),
            name_hint.unwrap_or(&file.name),
            LayerContent::GaussianSplat(GaussianSplat::from_payload(&file.name, file.size())),
        );
        let blob = file.blob(BlobId::from(&layer.id));

        // The handle is usable before the write lands and released if it fails.
        let mut lease = HandleLease::new(Arc::clone(&self.handles));
        let url = lease.mint_record(&blob);
        self.store.put_layer(&layer, std::slice::from_ref(&blob)).await?;
        lease.keep();

        info!(layer = %layer.id, size = blob.size(), "splat ingested");
        layer.set_url(Some(url));
        Ok(layer)
    }

    async fn ingest_clouds(
        &self,
        workspace: &WorkspaceId,
        files: Vec<IngestFile>,
        name_hint: Option<&str>,
    ) -> IngestResult<Vec<Layer>> {
        let mut lease = HandleLease::new(Arc::clone(&self.handles));
        let mut layers = Vec::with_capacity(files.len());
        for file in files {
            let mut layer = Layer::new(
                LayerId::generate("pc"),
                workspace.clone(),
                name_hint.unwrap_or(&file.name),
                LayerContent::PointCloud(PointCloud {
                    point_count: 0,
                    format: PointCloudFormat::from_file_name(&file.name),
                    url: None,
                }),
            );
            let blob = file.blob(BlobId::from(&layer.id));
            if let Err(err) = self.store.put_layer(&layer, std::slice::from_ref(&blob)).await {
                self.roll_back(&layers).await;
                return Err(err.into());
            }

            info!(layer = %layer.id, size = blob.size(), "point cloud ingested");
            layer.set_url(Some(lease.mint_record(&blob)));
            layers.push(layer);
        }
        lease.keep();
        Ok(layers)
    }

    /// Undo the layers an interrupted upload already wrote.
    async fn roll_back(&self, layers: &[Layer]) {
        for layer in layers {
            if let Err(err) = self.store.delete_layer_cascade(&layer.id).await {
                warn!(layer = %layer.id, error = %err, "failed to roll back partial upload");
            }
        }
        if !layers.is_empty() {
            debug!(layers = layers.len(), "partial upload rolled back");
        }
    }

    async fn ingest_photos(
        &self,
        workspace: &WorkspaceId,
        files: Vec<IngestFile>,
        name_hint: Option<&str>,
    ) -> IngestResult<Layer> {
        let mut images = Vec::with_capacity(files.len());
        let mut blobs = Vec::with_capacity(files.len());
        for file in &files {
            let position = resolve_position(self.gps.read_gps(&file.data).await.as_ref());
            if position.is_none() {
                debug!(file = %file.name, "no usable GPS position");
            }
            let id = ImageId::generate();
            blobs.push(file.blob(BlobId::from(&id)));
            images.push(GeoImage::new(id, &file.name).with_position(position));
        }

        let name = name_hint
            .map(str::to_string)
            .unwrap_or_else(|| format!("Photo set ({})", files.len()));
        let mut layer = Layer::new(
            LayerId::generate("photos"),
            workspace.clone(),
            name,
            LayerContent::PhotoSet(PhotoSet { images }),
        );
        self.store.put_layer(&layer, &blobs).await?;

        info!(layer = %layer.id, images = blobs.len(), "photo set ingested");
        if let Some(images) = layer.images_mut() {
            for (image, blob) in images.iter_mut().zip(&blobs) {
                image.url = Some(self.handles.mint_record(blob));
            }
        }
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::{FixedGpsExtractor, NoGpsExtractor};
    use crate::gps::{DmsComponent, GpsTags};
    use geohub_store::InMemoryAssetStore;
    use geohub_types::{LayerKind, SplatFormat, Workspace};

    struct Harness {
        store: Arc<InMemoryAssetStore>,
        handles: Arc<HandleRegistry>,
        pipeline: IngestPipeline,
        workspace: WorkspaceId,
    }

    async fn harness_with(store: InMemoryAssetStore, gps: Arc<dyn GpsExtractor>) -> Harness {
        let store = Arc::new(store);
        let workspace = WorkspaceId::new("ws-1");
        store
            .put_workspace(&Workspace::new(workspace.clone(), "survey"))
            .await
            .unwrap();
        let handles = Arc::new(HandleRegistry::new());
        let pipeline = IngestPipeline::new(store.clone(), Arc::clone(&handles), gps);
        Harness {
            store,
            handles,
            pipeline,
            workspace,
        }
    }

    async fn harness() -> Harness {
        harness_with(InMemoryAssetStore::new(), Arc::new(NoGpsExtractor)).await
    }

    fn tags(lat: [f64; 3], lat_ref: &str, lng: [f64; 3], lng_ref: &str) -> GpsTags {
        GpsTags {
            latitude: lat.iter().copied().map(DmsComponent::Number).collect(),
            latitude_ref: lat_ref.into(),
            longitude: lng.iter().copied().map(DmsComponent::Number).collect(),
            longitude_ref: lng_ref.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Splats
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn splat_count_from_file_size() {
        let h = harness().await;
        let layers = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![IngestFile::new("scan.splat", vec![0u8; 3200])],
                None,
                AssetKind::Splat,
            )
            .await
            .unwrap();

        assert_eq!(layers.len(), 1);
        let layer = &layers[0];
        assert_eq!(layer.name, "scan.splat");
        match &layer.content {
            LayerContent::GaussianSplat(splat) => {
                assert_eq!(splat.splat_count, 100);
                assert_eq!(splat.file_size, 3200);
                assert_eq!(splat.format, SplatFormat::Splat);
            }
            other => panic!("unexpected content: {other:?}"),
        }

        let url = layer.url().unwrap();
        assert!(url.is_ephemeral());
        assert_eq!(h.handles.resolve(url).unwrap().len(), 3200);

        let stored = h.store.get_layer(&layer.id).await.unwrap();
        assert!(stored.url().is_none());
        assert_eq!(h.store.blob_count(), 1);
    }

    #[tokio::test]
    async fn splat_uses_only_first_file_and_name_hint() {
        let h = harness().await;
        let layers = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![
                    IngestFile::new("a.ply", vec![0u8; 64]),
                    IngestFile::new("b.splat", vec![0u8; 64]),
                ],
                Some("  Substation  "),
                AssetKind::Splat,
            )
            .await
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].name, "Substation");
        assert_eq!(h.store.layer_count(), 1);
        match &layers[0].content {
            LayerContent::GaussianSplat(splat) => assert_eq!(splat.format, SplatFormat::Ply),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_splat_write_releases_handle() {
        let h = harness_with(InMemoryAssetStore::with_capacity(100), Arc::new(NoGpsExtractor)).await;
        let err = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![IngestFile::new("big.splat", vec![0u8; 3200])],
                None,
                AssetKind::Splat,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Store(ref e) if e.is_quota_exceeded()));
        assert_eq!(h.handles.live_count(), 0);
        assert_eq!(h.store.layer_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Point clouds
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn each_cloud_file_is_its_own_layer() {
        let h = harness().await;
        let layers = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![
                    IngestFile::new("north.las", vec![1u8; 10]),
                    IngestFile::new("south.ply", vec![2u8; 20]),
                ],
                None,
                AssetKind::Cloud,
            )
            .await
            .unwrap();

        assert_eq!(layers.len(), 2);
        assert!(layers.iter().all(|l| l.kind() == LayerKind::PointCloud));
        match &layers[0].content {
            LayerContent::PointCloud(pc) => {
                assert_eq!(pc.point_count, 0);
                assert_eq!(pc.format, PointCloudFormat::Las);
            }
            other => panic!("unexpected content: {other:?}"),
        }
        assert_eq!(h.store.count_layers(&h.workspace).await.unwrap(), 2);
        assert_eq!(h.store.total_bytes(), 30);
    }

    #[tokio::test]
    async fn failed_cloud_file_rolls_back_the_whole_upload() {
        let h = harness_with(InMemoryAssetStore::with_capacity(150), Arc::new(NoGpsExtractor)).await;
        let err = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![
                    IngestFile::new("north.las", vec![1u8; 100]),
                    IngestFile::new("south.las", vec![2u8; 100]),
                ],
                None,
                AssetKind::Cloud,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Store(ref e) if e.is_quota_exceeded()));
        assert_eq!(h.store.layer_count(), 0);
        assert_eq!(h.store.total_bytes(), 0);
        assert_eq!(h.store.count_layers(&h.workspace).await.unwrap(), 0);
        assert_eq!(h.handles.live_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Photos
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn photos_share_one_layer_with_positions() {
        let gps = FixedGpsExtractor(Some(tags(
            [22.0, 53.0, 44.88],
            "S",
            [43.0, 10.0, 55.92],
            "W",
        )));
        let h = harness_with(InMemoryAssetStore::new(), Arc::new(gps)).await;
        let layers = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![
                    IngestFile::new("a.jpg", vec![1u8; 100]).with_mime_type("image/jpeg"),
                    IngestFile::new("b.jpg", vec![2u8; 200]).with_mime_type("image/jpeg"),
                ],
                None,
                AssetKind::Photo,
            )
            .await
            .unwrap();

        assert_eq!(layers.len(), 1);
        let layer = &layers[0];
        assert_eq!(layer.name, "Photo set (2)");
        let images = layer.images().unwrap();
        assert_eq!(images.len(), 2);
        for image in images {
            let pos = image.position().unwrap();
            assert!(pos.lat < 0.0 && pos.lng < 0.0);
            let url = image.url.as_ref().unwrap();
            assert!(h.handles.resolve(url).is_some());
        }

        assert_eq!(h.store.blob_count(), 2);
        let blob = h.store.get_blob(&BlobId::from(&images[1].id)).await.unwrap();
        assert_eq!(blob.size(), 200);
        assert_eq!(blob.mime_type, "image/jpeg");
        assert_eq!(h.store.count_layers(&h.workspace).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn null_island_photos_store_no_position() {
        let gps = FixedGpsExtractor(Some(tags([0.0, 0.0, 0.0], "N", [0.0, 0.0, 0.0], "E")));
        let h = harness_with(InMemoryAssetStore::new(), Arc::new(gps)).await;
        let layers = h
            .pipeline
            .ingest(
                &h.workspace,
                vec![IngestFile::new("x.jpg", vec![1u8; 10])],
                Some("Roof"),
                AssetKind::Photo,
            )
            .await
            .unwrap();

        let stored = h.store.get_layer(&layers[0].id).await.unwrap();
        let image = &stored.images().unwrap()[0];
        assert_eq!(image.lat, None);
        assert_eq!(image.lng, None);
        assert!(image.url.is_none());
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let h = harness().await;
        let err = h
            .pipeline
            .ingest(&h.workspace, Vec::new(), None, AssetKind::Cloud)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoFiles));
    }

    #[tokio::test]
    async fn unknown_workspace_is_rejected() {
        let h = harness().await;
        let err = h
            .pipeline
            .ingest(
                &WorkspaceId::new("ghost"),
                vec![IngestFile::new("a.splat", vec![0u8; 64])],
                None,
                AssetKind::Splat,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Store(_)));
        assert_eq!(h.handles.live_count(), 0);
    }

    #[tokio::test]
    async fn reads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.splat");
        std::fs::write(&path, vec![0u8; 96]).unwrap();
        let file = IngestFile::read(&path).await.unwrap();
        assert_eq!(file.name, "scene.splat");
        assert_eq!(file.size(), 96);

        let err = IngestFile::read(dir.path().join("missing.splat")).await.unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("SPLAT".parse::<AssetKind>().unwrap(), AssetKind::Splat);
        assert_eq!("point-cloud".parse::<AssetKind>().unwrap(), AssetKind::Cloud);
        assert_eq!("photos".parse::<AssetKind>().unwrap(), AssetKind::Photo);
        assert!("mesh".parse::<AssetKind>().is_err());
        assert_eq!(AssetKind::Photo.to_string(), "PHOTO");
    }
}
