//! High-level SDK for GeoHub.
//!
//! [`GeoHub`] is the entry point for applications: it wires a store, the
//! shared ephemeral-handle registry, the ingestion pipeline, and the demo
//! bootstrap together and exposes the operations a UI drives.
//!
//! # Components
//!
//! - [`WorkspaceRegistrar`] -- default workspace and active-workspace resolution
//! - [`Rehydrator`] -- rebuilds a session's live layer list from the store
//! - [`LifecycleManager`] -- visibility, metadata updates, cascading deletes
//! - [`HubConfig`] -- TOML configuration

pub mod config;
pub mod error;
pub mod hub;
pub mod lifecycle;
pub mod registrar;
pub mod rehydrate;

pub use config::{HubConfig, CONFIG_FILE};
pub use error::{SdkError, SdkResult};
pub use hub::GeoHub;
pub use lifecycle::LifecycleManager;
pub use registrar::WorkspaceRegistrar;
pub use rehydrate::Rehydrator;

pub use geohub_demo::{AssetOutcome, BootstrapReport, DemoCatalog};
pub use geohub_ingest::{AssetKind, IngestFile};
pub use geohub_types::{
    AssetUrl, BlobId, BlobRecord, GeoImage, GeoPoint, ImageId, ImagePatch, Layer, LayerContent,
    LayerId, LayerKind, LayerPatch, Severity, Workspace, WorkspaceId,
};
