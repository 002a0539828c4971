use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use geohub_types::{AssetUrl, BlobId, BlobRecord, Layer, EPHEMERAL_SCHEME};
use tracing::{debug, trace};
use uuid::Uuid;

struct IssuedHandle {
    owner: BlobId,
    data: Bytes,
    mime_type: String,
}

#[derive(Default)]
struct Issued {
    by_url: HashMap<AssetUrl, IssuedHandle>,
    by_owner: HashMap<BlobId, Vec<AssetUrl>>,
}

/// Session-scoped registry of ephemeral `blob:` handles.
///
/// Each registry is one session: its handles embed the session id and mean
/// nothing to another registry. Minting never reuses a handle, so two loads of
/// the same blob yield two distinct URLs. Handles stay live until released by
/// owner, through a [`HandleLease`], or when the registry drops.
pub struct HandleRegistry {
    session: Uuid,
    inner: RwLock<Issued>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            session: Uuid::new_v4(),
            inner: RwLock::new(Issued::default()),
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Mint a fresh handle addressing `data` on behalf of `owner`.
    pub fn mint(&self, owner: &BlobId, data: Bytes, mime_type: impl Into<String>) -> AssetUrl {
        let url = AssetUrl::new(format!(
            "{EPHEMERAL_SCHEME}geohub/{}/{}",
            self.session,
            Uuid::new_v4()
        ));
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.by_url.insert(
            url.clone(),
            IssuedHandle {
                owner: owner.clone(),
                data,
                mime_type: mime_type.into(),
            },
        );
        inner
            .by_owner
            .entry(owner.clone())
            .or_default()
            .push(url.clone());
        trace!(owner = %owner, url = %url, "handle minted");
        url
    }

    /// Mint a handle for a stored blob, owned by the blob's id.
    pub fn mint_record(&self, record: &BlobRecord) -> AssetUrl {
        self.mint(&record.id, record.data.clone(), record.mime_type.clone())
    }

    /// Bytes behind a live handle, or `None` if it was released or never
    /// issued by this registry.
    pub fn resolve(&self, url: &AssetUrl) -> Option<Bytes> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.by_url.get(url).map(|h| h.data.clone())
    }

    pub fn mime_type(&self, url: &AssetUrl) -> Option<String> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.by_url.get(url).map(|h| h.mime_type.clone())
    }

    pub fn owner_of(&self, url: &AssetUrl) -> Option<BlobId> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.by_url.get(url).map(|h| h.owner.clone())
    }

    /// Release every handle minted for `owner`. Returns how many were live.
    pub fn release_owner(&self, owner: &BlobId) -> usize {
        let mut inner = self.inner.write().expect("lock poisoned");
        let urls = inner.by_owner.remove(owner).unwrap_or_default();
        for url in &urls {
            inner.by_url.remove(url);
        }
        if !urls.is_empty() {
            debug!(owner = %owner, released = urls.len(), "handles released");
        }
        urls.len()
    }

    /// Release the handles of a layer and, for a photo set, of every image.
    pub fn release_layer(&self, layer: &Layer) -> usize {
        let mut owners = layer.blob_owners();
        let layer_key = BlobId::from(&layer.id);
        if !owners.contains(&layer_key) {
            owners.push(layer_key);
        }
        owners.iter().map(|owner| self.release_owner(owner)).sum()
    }

    pub fn release_all(&self) -> usize {
        let mut inner = self.inner.write().expect("lock poisoned");
        let released = inner.by_url.len();
        inner.by_url.clear();
        inner.by_owner.clear();
        released
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").by_url.len()
    }

    pub fn live_for(&self, owner: &BlobId) -> usize {
        let inner = self.inner.read().expect("lock poisoned");
        inner.by_owner.get(owner).map_or(0, Vec::len)
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            if !inner.by_url.is_empty() {
                debug!(session = %self.session, released = inner.by_url.len(), "session handles released");
            }
            inner.by_url.clear();
            inner.by_owner.clear();
        }
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("session", &self.session)
            .field("live", &self.live_count())
            .finish()
    }
}

/// Scoped ownership of the handles minted for a set of owners.
///
/// Dropping the lease releases them, on every exit path.
pub struct HandleLease {
    registry: Arc<HandleRegistry>,
    owners: Vec<BlobId>,
}

impl HandleLease {
    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self {
            registry,
            owners: Vec::new(),
        }
    }

    /// Mint a handle that the lease will release.
    pub fn mint(&mut self, owner: &BlobId, data: Bytes, mime_type: impl Into<String>) -> AssetUrl {
        if !self.owners.contains(owner) {
            self.owners.push(owner.clone());
        }
        self.registry.mint(owner, data, mime_type)
    }

    pub fn mint_record(&mut self, record: &BlobRecord) -> AssetUrl {
        self.mint(&record.id, record.data.clone(), record.mime_type.clone())
    }

    pub fn owners(&self) -> &[BlobId] {
        &self.owners
    }

    /// Hand the minted handles over to the registry's manual lifetime.
    pub fn keep(mut self) -> Vec<BlobId> {
        std::mem::take(&mut self.owners)
    }
}

impl Drop for HandleLease {
    fn drop(&mut self) {
        for owner in &self.owners {
            self.registry.release_owner(owner);
        }
    }
}
