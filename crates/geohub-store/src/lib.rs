//! Transactional metadata and blob storage for GeoHub.
//!
//! The store holds three tables: workspaces, layers (indexed by workspace)
//! and blobs (keyed by the owning layer or image id). A layer write commits
//! its metadata row, its blob rows, and the owning workspace's item-count
//! recompute as one unit; a layer delete removes the row, every blob it owns,
//! and recomputes the count, also as one unit.
//!
//! # Storage Backends
//!
//! All backends implement the [`AssetStore`] trait:
//!
//! - [`InMemoryAssetStore`] -- map-based store for tests and embedding
//! - [`DiskAssetStore`] -- directory-backed store that survives restarts
//!
//! # Ephemeral Handles
//!
//! [`HandleRegistry`] mints session-scoped `blob:` URLs that let stored bytes
//! be addressed like network resources. Handles are manually lifetimed: they
//! are released on delete, when a [`HandleLease`] drops, or when the registry
//! itself drops.
//!
//! # Design Rules
//!
//! 1. `item_count` is recomputed, never incremented, inside each transaction.
//! 2. A layer may only be written into an existing workspace.
//! 3. Validation (referential checks, quota) happens before any mutation.
//! 4. Reads of missing ids return [`StoreError::NotFound`].

mod catalog;
pub mod disk;
pub mod error;
pub mod handles;
pub mod memory;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use disk::DiskAssetStore;
pub use error::{RecordKind, StoreError, StoreResult};
pub use handles::{HandleLease, HandleRegistry};
pub use memory::InMemoryAssetStore;
pub use traits::AssetStore;
