//! Host-facing facade wiring the asset, render, surface and session layers together.
//!
//! The display host drives everything through the `on_*` callbacks and [`Gallery::advance`];
//! every call runs on the host's thread.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::assets::cache::{AssetCache, AssetCacheStats};
use crate::assets::source::{Asset, AssetSource};
use crate::assets::storage::StorageBackend;
use crate::foundation::core::AssetId;
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::batch::{RenderJob, render_batch};
use crate::render::shape::ShadowDescriptor;
use crate::render::thumbnail::{Thumbnail, ThumbnailRenderer};
use crate::session::controller::{SessionController, SessionId};
use crate::session::ticker::TickLoop;
use crate::surface::pool::{
    SharedSurfacePool, SurfaceContent, SurfaceId, SurfaceKind, SurfaceLease, SurfacePool,
    SurfacePoolStats,
};

/// Gallery configuration.
pub mod config;

use config::GalleryOpts;

/// Host-side handle to an open detail session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(SessionId);

impl SessionHandle {
    /// Id of the session.
    pub fn id(self) -> SessionId {
        self.0
    }
}

/// List-to-detail gallery core.
///
/// Rows read through the cached path and render into pooled `row` surfaces. Detail views read
/// through the uncached path and live in a [`SessionController`] that holds a leased `detail`
/// surface.
pub struct Gallery {
    source: AssetSource,
    cache: AssetCache,
    renderer: ThumbnailRenderer,
    pool: SharedSurfacePool,
    ticker: TickLoop,
    sessions: HashMap<SessionId, SessionController>,

    shadow: ShadowDescriptor,
    row_kind: SurfaceKind,
    detail_kind: SurfaceKind,
    opts: GalleryOpts,
}

impl Gallery {
    /// Create a gallery reading from `storage`.
    pub fn new(storage: impl StorageBackend + 'static, opts: GalleryOpts) -> VignetteResult<Self> {
        opts.validate()?;
        Ok(Self {
            source: AssetSource::new(storage),
            cache: AssetCache::new(opts.cache),
            renderer: ThumbnailRenderer::new(opts.render),
            pool: Rc::new(RefCell::new(SurfacePool::new(opts.pool))),
            ticker: TickLoop::new(),
            sessions: HashMap::new(),
            shadow: opts.shadow_descriptor(),
            row_kind: opts.row_kind(),
            detail_kind: opts.detail_kind(),
            opts,
        })
    }

    /// Options this gallery was built with.
    pub fn opts(&self) -> &GalleryOpts {
        &self.opts
    }

    /// A row became visible: acquire a row surface and fill it with the asset's thumbnail.
    ///
    /// On failure no surface is held and the error is returned so the host can show a
    /// placeholder.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub fn on_row_needed(&mut self, id: &AssetId) -> VignetteResult<SurfaceId> {
        let asset = self.cache.get_or_read(&self.source, id)?;
        let thumb = self
            .renderer
            .render(&asset, self.opts.thumbnail_size, &self.shadow)?;
        self.place_row(thumb)
    }

    /// Several rows became visible at once.
    ///
    /// With `render.parallel` set the thumbnails are rendered on a rayon pool and assigned after
    /// the whole batch is back; otherwise this is `on_row_needed` in a loop. Results are in input
    /// order.
    pub fn on_rows_needed(
        &mut self,
        ids: &[AssetId],
    ) -> VignetteResult<Vec<VignetteResult<SurfaceId>>> {
        if !self.opts.render.parallel {
            return Ok(ids.iter().map(|id| self.on_row_needed(id)).collect());
        }

        let assets: Vec<VignetteResult<Arc<Asset>>> = ids
            .iter()
            .map(|id| self.cache.get_or_read(&self.source, id))
            .collect();
        let jobs: Vec<RenderJob<'_>> = assets
            .iter()
            .filter_map(|a| a.as_ref().ok())
            .map(|asset| RenderJob {
                asset: asset.as_ref(),
                target: self.opts.thumbnail_size,
                shadow: &self.shadow,
            })
            .collect();
        let mut rendered = render_batch(&jobs, self.opts.render)?.into_iter();
        drop(jobs);

        let mut out = Vec::with_capacity(ids.len());
        for asset in assets {
            let placed = match asset {
                Err(e) => Err(e),
                Ok(_) => match rendered.next() {
                    Some(thumb) => thumb.and_then(|t| self.place_row(t)),
                    None => Err(VignetteError::invalid_state(
                        "render batch returned fewer results than jobs",
                    )),
                },
            };
            out.push(placed);
        }
        Ok(out)
    }

    /// A row scrolled out of view; its surface goes back to the pool.
    pub fn on_row_recycled(&mut self, surface: SurfaceId) {
        self.pool.borrow_mut().release(surface);
    }

    /// Open a detail view: uncached read, detail surface lease, started session.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub fn on_detail_open(&mut self, id: &AssetId) -> VignetteResult<SessionHandle> {
        let mut session = SessionController::create(
            &self.source,
            id,
            self.ticker.clone(),
            self.opts.session_opts(),
        )?;
        session.attach_surface(SurfaceLease::acquire(&self.pool, &self.detail_kind))?;
        session.open()?;

        let sid = session.id();
        self.sessions.insert(sid, session);
        Ok(SessionHandle(sid))
    }

    /// Close a detail view. Unknown or already-closed handles are ignored.
    pub fn on_detail_close(&mut self, handle: SessionHandle) {
        match self.sessions.remove(&handle.0) {
            Some(mut session) => session.close(),
            None => tracing::debug!(session = %handle.0, "detail close for unknown session"),
        }
    }

    /// Advance host time, running due session ticks.
    pub fn advance(&self, dt: Duration) {
        self.ticker.advance(dt);
    }

    /// Open session for `handle`.
    pub fn session(&self, handle: SessionHandle) -> Option<&SessionController> {
        self.sessions.get(&handle.0)
    }

    /// Number of open detail sessions.
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Content currently assigned to `surface`.
    pub fn surface_content(&self, surface: SurfaceId) -> Option<SurfaceContent> {
        self.pool.borrow().get(surface)?.content().cloned()
    }

    /// Surface pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.borrow().stats()
    }

    /// Cached read path counters.
    pub fn cache_stats(&self) -> AssetCacheStats {
        self.cache.stats()
    }

    /// The tick loop driving detail sessions.
    pub fn ticker(&self) -> &TickLoop {
        &self.ticker
    }

    fn place_row(&self, thumb: Thumbnail) -> VignetteResult<SurfaceId> {
        let mut pool = self.pool.borrow_mut();
        let surface = pool.acquire(&self.row_kind);
        if let Err(e) = pool.assign(surface, SurfaceContent::Thumbnail(thumb)) {
            pool.release(surface);
            return Err(e);
        }
        Ok(surface)
    }
}

impl fmt::Debug for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gallery")
            .field("source", &self.source)
            .field("pool", &self.pool.borrow())
            .field("ticker", &self.ticker)
            .field("open_sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gallery/facade.rs"]
mod tests;
