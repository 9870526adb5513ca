//! Asset reads.
//!
//! [`source::AssetSource`] is the uncached read path; [`cache::AssetCache`] is the opt-in cached
//! path for assets that are plausibly reused (row thumbnails). Callers pick one deliberately.

/// Opt-in LRU cache layered over an [`source::AssetSource`].
pub mod cache;
pub(crate) mod decode;
/// Uncached asset reads.
pub mod source;
/// Storage backends supplying raw bytes by identifier.
pub mod storage;
