//! Cache-first delivery of the web shell's static assets.
//!
//! Assets live in named generations. A generation becomes active only after
//! every entry of its manifest was fetched, and older generations are
//! deleted only at that point.

mod fetch;
mod manifest;
mod store;

pub use fetch::{AssetFetcher, CachedAsset, HttpFetcher};
pub use manifest::CacheManifest;
pub use store::{AssetSource, OfflineCache, RequestKind};
