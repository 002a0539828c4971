//! Asset ingestion for GeoHub.
//!
//! Turns user-selected files into layer and blob records. Splats and point
//! clouds are stored as-is; photos have their embedded GPS tags converted
//! from degrees/minutes/seconds to decimal degrees before they are grouped
//! into one photo-set layer.
//!
//! # Key Types
//!
//! - [`IngestPipeline`] -- dispatches an upload by [`AssetKind`]
//! - [`IngestFile`] -- one selected file with its bytes and declared type
//! - [`GpsExtractor`] -- seam for reading raw GPS tags from image bytes
//! - [`DmsComponent`] -- one degrees/minutes/seconds term, plain or fractional
//!
//! GPS extraction never fails: a missing parser, malformed tags, or an absent
//! GPS block all resolve to "no position".

pub mod error;
pub mod exif;
pub mod gps;
pub mod mime;
pub mod pipeline;

pub use error::{IngestError, IngestResult};
pub use exif::{ExifToolExtractor, FixedGpsExtractor, GpsExtractor, NoGpsExtractor};
pub use gps::{dms_to_decimal, resolve_position, DmsComponent, GpsTags};
pub use mime::{resolve_mime_type, sniff_mime_type};
pub use pipeline::{AssetKind, IngestFile, IngestPipeline};
