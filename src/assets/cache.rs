use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::assets::source::{Asset, AssetSource};
use crate::foundation::core::AssetId;
use crate::foundation::error::VignetteResult;

/// Default byte budget of the cached read path (32 MiB).
pub const DEFAULT_CACHE_BYTES: usize = 32 * 1024 * 1024;

/// Default maximum number of retained assets.
pub const DEFAULT_CACHE_ASSETS: usize = 64;

/// Bounds of the opt-in asset cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetCacheOpts {
    /// Maximum decoded bytes retained across all entries.
    pub max_bytes: usize,
    /// Maximum number of retained entries.
    pub max_assets: usize,
}

impl Default for AssetCacheOpts {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_CACHE_BYTES,
            max_assets: DEFAULT_CACHE_ASSETS,
        }
    }
}

/// Hit/miss counters for [`AssetCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssetCacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the source.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Assets returned but not retained because they exceed half the byte budget.
    pub skipped_oversized: u64,
    /// Entries currently retained.
    pub entries: usize,
    /// Decoded bytes currently retained.
    pub bytes: usize,
}

/// Cached read path for assets that are plausibly shown again (row thumbnails).
///
/// LRU by entry count and decoded bytes. Entries are shared with callers through `Arc`, so an
/// eviction never invalidates an asset a caller still holds.
pub struct AssetCache {
    cache: LruCache<AssetId, Arc<Asset>>,
    opts: AssetCacheOpts,
    stats: AssetCacheStats,
}

impl AssetCache {
    /// Create an empty cache. A zero `max_assets` is treated as one entry.
    pub fn new(opts: AssetCacheOpts) -> Self {
        let capacity = NonZeroUsize::new(opts.max_assets).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            opts,
            stats: AssetCacheStats::default(),
        }
    }

    /// Return the cached asset for `id`, reading it through `source` on a miss.
    pub fn get_or_read(&mut self, source: &AssetSource, id: &AssetId) -> VignetteResult<Arc<Asset>> {
        if let Some(hit) = self.cache.get(id) {
            self.stats.hits += 1;
            return Ok(Arc::clone(hit));
        }
        self.stats.misses += 1;
        let asset = Arc::new(source.read(id)?);
        self.insert(Arc::clone(&asset));
        Ok(asset)
    }

    /// Return the cached asset for `id` without touching storage.
    pub fn get(&mut self, id: &AssetId) -> Option<Arc<Asset>> {
        self.cache.get(id).cloned()
    }

    /// Drop the entry for `id`, if any.
    pub fn invalidate(&mut self, id: &AssetId) {
        if let Some(old) = self.cache.pop(id) {
            self.stats.bytes = self.stats.bytes.saturating_sub(old.byte_len());
            self.stats.entries = self.cache.len();
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.stats.entries = 0;
        self.stats.bytes = 0;
    }

    /// Current counters.
    pub fn stats(&self) -> AssetCacheStats {
        self.stats
    }

    fn insert(&mut self, asset: Arc<Asset>) {
        let size = asset.byte_len();
        if size > self.opts.max_bytes / 2 {
            self.stats.skipped_oversized += 1;
            tracing::debug!(id = %asset.id(), size, "asset too large for cache");
            return;
        }

        while self.stats.bytes + size > self.opts.max_bytes && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.stats.bytes = self.stats.bytes.saturating_sub(evicted.byte_len());
                self.stats.evictions += 1;
            }
        }

        let id = asset.id().clone();
        if let Some((old_id, evicted)) = self.cache.push(id.clone(), asset) {
            self.stats.bytes = self.stats.bytes.saturating_sub(evicted.byte_len());
            if old_id != id {
                self.stats.evictions += 1;
            }
        }
        self.stats.bytes += size;
        self.stats.entries = self.cache.len();
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("opts", &self.opts)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
