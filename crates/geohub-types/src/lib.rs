//! Foundation types for GeoHub.
//!
//! Every other GeoHub crate depends on `geohub-types`. The types here
//! describe what is persisted in the local asset store and what is handed to
//! rendering collaborators after rehydration.
//!
//! # Key Types
//!
//! - [`Workspace`] — Named scope owning a set of layers, with a maintained item count
//! - [`Layer`] — A geospatial dataset; its variant data lives in [`LayerContent`]
//! - [`GeoImage`] — A single geo-tagged photo nested inside a photo set
//! - [`AssetUrl`] — Where a layer's payload can be addressed (remote, ephemeral, relative)
//! - [`BlobRecord`] — Binary payload stored 1:1 against a layer or image ([`BlobId`])
//! - [`LayerPatch`] — Partial update merged into a stored layer

pub mod blob;
pub mod error;
pub mod id;
pub mod image;
pub mod layer;
pub mod patch;
pub mod url;
pub mod workspace;

pub use blob::{BlobId, BlobRecord, DEFAULT_MIME_TYPE};
pub use error::TypeError;
pub use id::{ImageId, LayerId, WorkspaceId, DEMO_WORKSPACE_ID};
pub use image::{GeoImage, GeoPoint, Severity};
pub use layer::{
    GaussianSplat, Layer, LayerContent, LayerKind, PhotoSet, PointCloud, PointCloudFormat,
    SplatFormat, SPLAT_RECORD_STRIDE,
};
pub use patch::{ImagePatch, LayerPatch};
pub use url::{AssetUrl, UrlClass, EPHEMERAL_SCHEME};
pub use workspace::Workspace;
