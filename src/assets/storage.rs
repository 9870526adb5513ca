use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::AssetId;
use crate::foundation::error::{VignetteError, VignetteResult};

/// Core-to-storage boundary: fetch raw encoded bytes for an identifier.
///
/// Implementations must not cache decoded results; they return bytes or
/// [`VignetteError::NotFound`].
pub trait StorageBackend: Send + Sync {
    /// Read all bytes stored under `id`.
    fn read_bytes(&self, id: &AssetId) -> VignetteResult<Vec<u8>>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn read_bytes(&self, id: &AssetId) -> VignetteResult<Vec<u8>> {
        (**self).read_bytes(id)
    }
}

/// Normalize and validate storage-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> VignetteResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(VignetteError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(VignetteError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(VignetteError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(VignetteError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Filesystem storage rooted at a directory; identifiers are relative paths below it.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create a storage backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory all identifiers resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &AssetId) -> VignetteResult<PathBuf> {
        // An identifier that cannot name a file below the root does not resolve.
        let norm = normalize_rel_path(id.as_str())
            .map_err(|e| VignetteError::not_found(format!("'{id}': {e}")))?;
        Ok(self.root.join(Path::new(&norm)))
    }
}

impl StorageBackend for FsStorage {
    fn read_bytes(&self, id: &AssetId) -> VignetteResult<Vec<u8>> {
        let path = self.resolve(id)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(VignetteError::not_found(
                format!("'{id}' ({})", path.display()),
            )),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read asset '{}'", path.display()))
                .into()),
        }
    }
}

/// In-memory storage, mainly for hosts that already hold encoded bytes and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: HashMap<AssetId, Arc<[u8]>>,
    reads: AtomicU64,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the bytes stored under `id`.
    pub fn insert(&mut self, id: impl Into<AssetId>, bytes: impl Into<Arc<[u8]>>) {
        self.blobs.insert(id.into(), bytes.into());
    }

    /// Builder-style [`MemoryStorage::insert`].
    pub fn with(mut self, id: impl Into<AssetId>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(id, bytes);
        self
    }

    /// Number of successful `read_bytes` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl StorageBackend for MemoryStorage {
    fn read_bytes(&self, id: &AssetId) -> VignetteResult<Vec<u8>> {
        let bytes = self
            .blobs
            .get(id)
            .ok_or_else(|| VignetteError::not_found(format!("'{id}'")))?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/storage.rs"]
mod tests;
