//! Demo workspace bootstrap for GeoHub.
//!
//! Seeds the demo workspace with a Gaussian splat, a point cloud, and a set of
//! inspection photos. Each asset runs its own acquisition state machine:
//!
//! ```text
//! START -> REMOTE_FETCH -> VALIDATE -> SAVE -> DONE
//!              |              |          |
//!              v              v          v
//!          LOCAL_FETCH -> VALIDATE   MEMORY_FALLBACK -> DONE
//!              |
//!              v
//!         ABORT_ASSET
//! ```
//!
//! Sources are an ordered list of [`AssetSource`] strategies tried by the
//! [`TieredLoader`] until one yields a payload that passes the
//! [`PayloadValidator`]. One asset aborting never blocks the others.

pub mod bootstrap;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod source;
pub mod validate;

pub use bootstrap::{AssetOutcome, AssetReport, BootstrapReport, DemoBootstrap};
pub use catalog::{DemoAsset, DemoCatalog, DemoPhoto};
pub use error::{DemoError, DemoResult, FetchError, FetchResult};
pub use fetch::{FetchedPayload, Fetcher, HttpFetcher, OfflineFetcher};
pub use loader::{Acquired, AssetState, TieredLoader};
pub use source::{AssetSource, LocalSource, RemoteSource, Tier};
pub use validate::{PayloadValidator, DEFAULT_MIN_PAYLOAD_BYTES};
