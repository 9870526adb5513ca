use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::core::AssetId;
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::thumbnail::Thumbnail;

static NEXT_POOL_SERIAL: AtomicU32 = AtomicU32::new(1);

/// Pool configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Expected upper bound of surfaces per kind. Exceeding it still constructs a surface but
    /// logs a warning; `None` disables the check.
    pub soft_cap_per_kind: Option<usize>,
}

/// Identifier of a family of interchangeable surfaces (e.g. `"row"`, `"detail"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceKind(Arc<str>);

impl SurfaceKind {
    /// Create a kind from a name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Kind name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SurfaceKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a surface owned by a [`SurfacePool`].
///
/// A handle names one acquisition of a surface. The surface itself lives for the whole lifetime
/// of the pool, but its handle stops matching once it is released: a stale handle cannot release
/// or assign to the surface after it has been handed to a new owner. Handles from another pool
/// are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    pool: u32,
    slot: u32,
    generation: u32,
}

impl SurfaceId {
    /// Slot index inside the owning pool (stable for the pool's lifetime).
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Return `true` when both handles name the same underlying surface, regardless of which
    /// acquisition they came from.
    pub fn same_surface(self, other: SurfaceId) -> bool {
        self.pool == other.pool && self.slot == other.slot
    }
}

/// Surface lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    /// Available for `acquire`.
    Idle,
    /// Handed out to a display slot.
    InUse,
}

/// Displayable content assigned to an in-use surface.
#[derive(Clone, Debug)]
pub enum SurfaceContent {
    /// A rendered row thumbnail.
    Thumbnail(Thumbnail),
    /// A detail view presenting the named asset.
    Detail(AssetId),
}

/// Reusable display container.
#[derive(Debug)]
pub struct Surface {
    kind: SurfaceKind,
    state: SurfaceState,
    content: Option<SurfaceContent>,
    uses: u64,
    generation: u32,
}

impl Surface {
    /// Kind this surface was constructed for.
    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    /// Current state.
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Assigned content, if any.
    pub fn content(&self) -> Option<&SurfaceContent> {
        self.content.as_ref()
    }

    /// Number of times this surface has been acquired.
    pub fn uses(&self) -> u64 {
        self.uses
    }
}

/// Per-kind counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindStats {
    /// Surfaces ever constructed for this kind.
    pub constructed: usize,
    /// Surfaces currently in use.
    pub in_use: usize,
    /// Highest number of simultaneously in-use surfaces observed.
    pub high_water: usize,
}

impl KindStats {
    /// Surfaces currently idle.
    pub fn idle(&self) -> usize {
        self.constructed - self.in_use
    }
}

/// Pool-wide counters.
#[derive(Debug, Default, Clone)]
pub struct SurfacePoolStats {
    /// Counters keyed by kind.
    pub kinds: HashMap<SurfaceKind, KindStats>,
    /// Total acquisitions served.
    pub acquires: u64,
    /// Acquisitions served by reusing an idle surface.
    pub reuses: u64,
    /// Releases rejected as double releases or foreign handles.
    pub rejected_releases: u64,
}

impl SurfacePoolStats {
    /// Counters for `kind` (zeroes when the kind was never requested).
    pub fn kind(&self, kind: &SurfaceKind) -> KindStats {
        self.kinds.get(kind).copied().unwrap_or_default()
    }
}

struct Bucket {
    kind: SurfaceKind,
    idle: Vec<u32>,
    stats: KindStats,
}

/// Reuse pool for display surfaces, keyed by [`SurfaceKind`].
///
/// `acquire` never constructs while an idle surface of the requested kind exists, so the
/// number of surfaces of a kind equals the high-water mark of its concurrent use. Surfaces are
/// never dropped while the pool lives; there is no eviction.
pub struct SurfacePool {
    serial: u32,
    opts: SurfacePoolOpts,
    acquires: u64,
    reuses: u64,
    rejected_releases: u64,

    bucket_idx_by_kind: HashMap<SurfaceKind, usize>,
    buckets: Vec<Bucket>,
    slots: Vec<(usize, Surface)>,
}

impl SurfacePool {
    /// Create an empty pool.
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            serial: NEXT_POOL_SERIAL.fetch_add(1, Ordering::Relaxed),
            opts,
            acquires: 0,
            reuses: 0,
            rejected_releases: 0,
            bucket_idx_by_kind: HashMap::new(),
            buckets: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Hand out an idle surface of `kind`, constructing one only when none is idle.
    pub fn acquire(&mut self, kind: &SurfaceKind) -> SurfaceId {
        self.acquires += 1;
        let bi = self.bucket_for(kind);

        let slot = match self.buckets[bi].idle.pop() {
            Some(slot) => {
                self.reuses += 1;
                slot
            }
            None => self.construct(bi),
        };

        let bucket = &mut self.buckets[bi];
        bucket.stats.in_use += 1;
        bucket.stats.high_water = bucket.stats.high_water.max(bucket.stats.in_use);

        let surface = &mut self.slots[slot as usize].1;
        surface.state = SurfaceState::InUse;
        surface.uses += 1;
        SurfaceId {
            pool: self.serial,
            slot,
            generation: surface.generation,
        }
    }

    /// Return `id` to the idle set, logging and ignoring double or foreign releases.
    pub fn release(&mut self, id: SurfaceId) {
        if let Err(e) = self.try_release(id) {
            tracing::warn!(error = %e, "ignored surface release");
        }
    }

    /// Return `id` to the idle set.
    ///
    /// Fails with [`VignetteError::PoolCorruption`] when `id` belongs to another pool, was
    /// already released, or names an earlier acquisition of a surface now held by someone else;
    /// the pool is left unchanged in that case.
    pub fn try_release(&mut self, id: SurfaceId) -> VignetteResult<()> {
        let checked = self.check_in_use(id);
        if let Err(e) = checked {
            self.rejected_releases += 1;
            return Err(e);
        }

        let (bi, surface) = &mut self.slots[id.slot as usize];
        surface.state = SurfaceState::Idle;
        surface.content = None;
        surface.generation = surface.generation.wrapping_add(1);
        let bucket = &mut self.buckets[*bi];
        bucket.stats.in_use -= 1;
        bucket.idle.push(id.slot);
        Ok(())
    }

    /// Attach displayable content to an in-use surface, replacing any previous content.
    pub fn assign(&mut self, id: SurfaceId, content: SurfaceContent) -> VignetteResult<()> {
        self.check_in_use(id)?;
        self.slots[id.slot as usize].1.content = Some(content);
        Ok(())
    }

    /// Look up the surface held through `id`; `None` once `id` has been released.
    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        if id.pool != self.serial {
            return None;
        }
        self.slots
            .get(id.slot as usize)
            .map(|(_, s)| s)
            .filter(|s| s.generation == id.generation)
    }

    /// Return `true` when `id` was issued by this pool.
    pub fn owns(&self, id: SurfaceId) -> bool {
        id.pool == self.serial && (id.slot as usize) < self.slots.len()
    }

    /// Total surfaces ever constructed, across kinds.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Return `true` when no surface was ever constructed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> SurfacePoolStats {
        SurfacePoolStats {
            kinds: self
                .buckets
                .iter()
                .map(|b| (b.kind.clone(), b.stats))
                .collect(),
            acquires: self.acquires,
            reuses: self.reuses,
            rejected_releases: self.rejected_releases,
        }
    }

    fn bucket_for(&mut self, kind: &SurfaceKind) -> usize {
        if let Some(&bi) = self.bucket_idx_by_kind.get(kind) {
            return bi;
        }
        let bi = self.buckets.len();
        self.buckets.push(Bucket {
            kind: kind.clone(),
            idle: Vec::new(),
            stats: KindStats::default(),
        });
        self.bucket_idx_by_kind.insert(kind.clone(), bi);
        bi
    }

    fn construct(&mut self, bi: usize) -> u32 {
        let slot = self.slots.len() as u32;
        let bucket = &mut self.buckets[bi];
        bucket.stats.constructed += 1;
        if let Some(cap) = self.opts.soft_cap_per_kind
            && bucket.stats.constructed > cap
        {
            tracing::warn!(
                kind = %bucket.kind,
                constructed = bucket.stats.constructed,
                cap,
                "surface pool exceeded soft cap"
            );
        }
        tracing::debug!(kind = %bucket.kind, slot, "constructed surface");
        self.slots.push((
            bi,
            Surface {
                kind: bucket.kind.clone(),
                state: SurfaceState::Idle,
                content: None,
                uses: 0,
                generation: 0,
            },
        ));
        slot
    }

    fn check_in_use(&self, id: SurfaceId) -> VignetteResult<()> {
        if !self.owns(id) {
            return Err(VignetteError::pool_corruption(format!(
                "surface {:?} is not owned by pool {}",
                id, self.serial
            )));
        }
        let surface = &self.slots[id.slot as usize].1;
        if surface.generation != id.generation {
            return Err(VignetteError::pool_corruption(format!(
                "stale handle for surface {} ({}): released and reacquired since",
                id.slot, surface.kind
            )));
        }
        if surface.state != SurfaceState::InUse {
            return Err(VignetteError::pool_corruption(format!(
                "surface {} ({}) is not in use",
                id.slot, surface.kind
            )));
        }
        Ok(())
    }
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new(SurfacePoolOpts::default())
    }
}

impl fmt::Debug for SurfacePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfacePool")
            .field("serial", &self.serial)
            .field("surfaces", &self.slots.len())
            .field("acquires", &self.acquires)
            .finish_non_exhaustive()
    }
}

/// Pool shared by the host and the sessions it drives (single-threaded).
pub type SharedSurfacePool = Rc<RefCell<SurfacePool>>;

/// A surface held on behalf of a longer-lived owner; released back to its pool on drop.
///
/// The lease keeps only a weak back-reference to the pool, so it never extends the pool's
/// lifetime. If the pool is already gone, dropping the lease does nothing.
pub struct SurfaceLease {
    pool: Weak<RefCell<SurfacePool>>,
    id: SurfaceId,
}

impl SurfaceLease {
    /// Acquire a surface of `kind` from `pool`.
    pub fn acquire(pool: &SharedSurfacePool, kind: &SurfaceKind) -> Self {
        let id = pool.borrow_mut().acquire(kind);
        Self {
            pool: Rc::downgrade(pool),
            id,
        }
    }

    /// Leased surface.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Attach content to the leased surface.
    pub fn assign(&self, content: SurfaceContent) -> VignetteResult<()> {
        let pool = self
            .pool
            .upgrade()
            .ok_or_else(|| VignetteError::invalid_state("surface pool was dropped"))?;
        let mut pool = pool.borrow_mut();
        pool.assign(self.id, content)
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.borrow_mut().release(self.id);
        }
    }
}

impl fmt::Debug for SurfaceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceLease").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/pool.rs"]
mod tests;
