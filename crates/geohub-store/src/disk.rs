use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fs4::FileExt;
use geohub_types::{BlobId, BlobRecord, Layer, LayerId, Workspace, WorkspaceId};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{BlobEntry, Catalog};
use crate::error::{RecordKind, StoreError, StoreResult};
use crate::traits::AssetStore;

const CATALOG_FILE: &str = "catalog.json";
const FILES_DIR: &str = "files";
const LOCK_FILE: &str = ".lock";

/// Catalog row describing one blob file.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FileEntry {
    file: String,
    mime_type: String,
    size: u64,
    /// BLAKE3 of the file contents, hex encoded.
    checksum: String,
}

impl BlobEntry for FileEntry {
    fn size(&self) -> u64 {
        self.size
    }
}

/// Directory-backed asset store.
///
/// On-disk layout:
/// ```text
/// <root>/catalog.json        workspaces, layers, blob index
/// <root>/files/<uuid>.bin    one file per blob
/// <root>/.lock               held exclusively while the store is open
/// ```
///
/// A transaction stages new blob files first, then atomically replaces
/// `catalog.json`. Only after the catalog lands are superseded files removed,
/// so a crash at any point leaves either the old or the new state plus, at
/// worst, unreferenced files. Those are swept on the next [`open`](Self::open).
///
/// One store instance owns the directory at a time: a second `open` on the
/// same root, from this process or another, fails with
/// [`StoreError::Locked`] until the first instance is dropped.
///
/// File I/O runs on tokio's blocking pool, so store calls suspend the caller
/// instead of stalling the runtime thread.
pub struct DiskAssetStore {
    inner: Arc<Inner>,
}

struct Inner {
    root: PathBuf,
    catalog: Mutex<Catalog<FileEntry>>,
    capacity: Option<u64>,
    _lock: File,
}

impl DiskAssetStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>, capacity: Option<u64>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(FILES_DIR))?;
        let lock = acquire_lock(&root)?;

        let catalog_path = root.join(CATALOG_FILE);
        let catalog = if catalog_path.exists() {
            let raw = fs::read(&catalog_path)?;
            serde_json::from_slice(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?
        } else {
            Catalog::default()
        };

        let inner = Inner {
            root,
            catalog: Mutex::new(catalog),
            capacity,
            _lock: lock,
        };
        let swept = inner.sweep_orphans()?;
        info!(
            root = %inner.root.display(),
            swept,
            "disk store opened"
        );
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn capacity(&self) -> Option<u64> {
        self.inner.capacity
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.inner.catalog.lock().expect("lock poisoned").blob_bytes()
    }

    fn files_dir(&self) -> PathBuf {
        self.inner.files_dir()
    }

    /// Run `work` against the store on the blocking pool.
    async fn blocking<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Inner) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&inner))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))?
    }

    async fn transact<T, F>(&self, blobs: Vec<BlobRecord>, apply: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Catalog<FileEntry>) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.blocking(move |inner| inner.transact(&blobs, apply)).await
    }
}

/// Take the directory's advisory lock without waiting.
fn acquire_lock(root: &Path) -> StoreResult<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(root.join(LOCK_FILE))?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
            Err(StoreError::Locked(root.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

impl Inner {
    fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    /// Delete blob files the catalog does not reference.
    fn sweep_orphans(&self) -> StoreResult<usize> {
        let catalog = self.catalog.lock().expect("lock poisoned");
        let referenced: HashSet<&str> = catalog.blobs.values().map(|e| e.file.as_str()).collect();

        let mut removed = 0;
        for entry in fs::read_dir(self.files_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if referenced.contains(name) {
                continue;
            }
            warn!(file = name, "removing orphaned blob file");
            fs::remove_file(entry.path())?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Run one transaction: `apply` validates and edits a copy of the
    /// catalog, then `blobs` are staged and the catalog is persisted.
    /// Nothing is visible unless every step succeeds.
    fn transact<T>(
        &self,
        blobs: &[BlobRecord],
        apply: impl FnOnce(&mut Catalog<FileEntry>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut current = self.catalog.lock().expect("lock poisoned");
        let mut next = current.clone();
        let out = apply(&mut next)?;

        let mut staged = Vec::with_capacity(blobs.len());
        if let Err(err) = self.stage(blobs, &mut next, &mut staged) {
            for file in &staged {
                let _ = fs::remove_file(self.files_dir().join(file));
            }
            return Err(err);
        }

        let live: HashSet<&str> = next.blobs.values().map(|e| e.file.as_str()).collect();
        let obsolete: Vec<String> = current
            .blobs
            .values()
            .filter(|e| !live.contains(e.file.as_str()))
            .map(|e| e.file.clone())
            .collect();

        *current = next;
        drop(current);

        for file in obsolete {
            if let Err(err) = fs::remove_file(self.files_dir().join(&file)) {
                warn!(file = %file, error = %err, "failed to remove superseded blob file");
            }
        }
        Ok(out)
    }

    fn stage(
        &self,
        blobs: &[BlobRecord],
        next: &mut Catalog<FileEntry>,
        staged: &mut Vec<String>,
    ) -> StoreResult<()> {
        for blob in blobs {
            let entry = self.write_blob_file(blob)?;
            staged.push(entry.file.clone());
            next.blobs.insert(blob.id.clone(), entry);
        }
        self.write_catalog(next)
    }

    fn write_blob_file(&self, blob: &BlobRecord) -> StoreResult<FileEntry> {
        let file = format!("{}.bin", Uuid::now_v7());
        let mut tmp = NamedTempFile::new_in(self.files_dir())?;
        tmp.write_all(&blob.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.files_dir().join(&file))
            .map_err(|e| e.error)?;

        Ok(FileEntry {
            file,
            mime_type: blob.mime_type.clone(),
            size: blob.size(),
            checksum: blake3::hash(&blob.data).to_hex().to_string(),
        })
    }

    fn write_catalog(&self, catalog: &Catalog<FileEntry>) -> StoreResult<()> {
        let json =
            serde_json::to_vec_pretty(catalog).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.root.join(CATALOG_FILE))
            .map_err(|e| e.error)?;
        Ok(())
    }

    fn read_blob(&self, id: &BlobId) -> StoreResult<BlobRecord> {
        let entry = self
            .catalog
            .lock()
            .expect("lock poisoned")
            .blobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(RecordKind::Blob, id))?;

        let data = match fs::read(self.files_dir().join(&entry.file)) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Corrupt {
                    id: id.clone(),
                    reason: format!("blob file {} is missing", entry.file),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let actual = blake3::hash(&data).to_hex().to_string();
        if actual != entry.checksum {
            return Err(StoreError::Corrupt {
                id: id.clone(),
                reason: format!("checksum mismatch: expected {}, found {actual}", entry.checksum),
            });
        }
        Ok(BlobRecord::new(id.clone(), data, entry.mime_type))
    }
}

#[async_trait]
impl AssetStore for DiskAssetStore {
    async fn put_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        let workspace = workspace.clone();
        self.transact(Vec::new(), move |catalog| {
            catalog.put_workspace(workspace);
            Ok(())
        })
        .await
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> StoreResult<Workspace> {
        self.inner.catalog.lock().expect("lock poisoned").workspace(id)
    }

    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let catalog = self.inner.catalog.lock().expect("lock poisoned");
        Ok(catalog.workspaces.values().cloned().collect())
    }

    async fn delete_workspace_cascade(&self, id: &WorkspaceId) -> StoreResult<Vec<Layer>> {
        let target = id.clone();
        let layers = self
            .transact(Vec::new(), move |catalog| {
                catalog.remove_workspace(&target).map(|(layers, _)| layers)
            })
            .await?;
        debug!(workspace = %id, layers = layers.len(), "workspace deleted");
        Ok(layers)
    }

    async fn list_layers(&self, workspace: &WorkspaceId) -> StoreResult<Vec<Layer>> {
        Ok(self.inner.catalog.lock().expect("lock poisoned").layers_in(workspace))
    }

    async fn get_layer(&self, id: &LayerId) -> StoreResult<Layer> {
        self.inner.catalog.lock().expect("lock poisoned").layer(id)
    }

    async fn put_layer(&self, layer: &Layer, blobs: &[BlobRecord]) -> StoreResult<()> {
        let capacity = self.inner.capacity;
        let row = layer.clone();
        let blobs = blobs.to_vec();
        let count = blobs.len();
        self.transact(blobs.clone(), move |catalog| {
            catalog.require_workspace(&row.workspace_id)?;
            catalog.check_quota(capacity, &blobs)?;
            catalog.put_layer(row);
            Ok(())
        })
        .await?;
        debug!(layer = %layer.id, blobs = count, "layer written");
        Ok(())
    }

    async fn get_blob(&self, id: &BlobId) -> StoreResult<BlobRecord> {
        let id = id.clone();
        self.blocking(move |inner| inner.read_blob(&id)).await
    }

    async fn delete_layer_cascade(&self, id: &LayerId) -> StoreResult<Layer> {
        let target = id.clone();
        let layer = self
            .transact(Vec::new(), move |catalog| {
                catalog.remove_layer(&target).map(|(layer, _)| layer)
            })
            .await?;
        debug!(layer = %id, "layer deleted");
        Ok(layer)
    }

    async fn count_layers(&self, workspace: &WorkspaceId) -> StoreResult<u64> {
        Ok(self.inner.catalog.lock().expect("lock poisoned").count_in(workspace))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.transact(Vec::new(), |catalog| {
            catalog.clear();
            Ok(())
        })
        .await
    }
}

impl std::fmt::Debug for DiskAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskAssetStore")
            .field("root", &self.inner.root)
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}
