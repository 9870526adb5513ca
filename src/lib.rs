//! Vignette is the rendering-resource core of a list-to-detail image gallery.
//!
//! It covers three concerns:
//!
//! - Render large assets into small, pre-clipped, pre-shadowed [`Thumbnail`]s in a single pass at
//!   display resolution ([`ThumbnailRenderer`])
//! - Reuse row containers through a bounded [`SurfacePool`] instead of allocating per row
//! - Run detail views as [`SessionController`]s whose periodic tick never keeps the session alive
//!
//! [`Gallery`] wires these together behind the host callbacks (`on_row_needed`,
//! `on_row_recycled`, `on_detail_open`, `on_detail_close`).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Animation easing.
pub mod animation;
/// Asset reads: storage backends, the uncached source and the opt-in cache.
pub mod assets;
/// Host facade and configuration.
pub mod gallery;
/// Thumbnail rendering.
pub mod render;
/// Detail sessions and the tick loop.
pub mod session;
/// Surface reuse pool.
pub mod surface;

pub use crate::foundation::core::{
    Affine, AssetId, BezPath, PixelSize, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{VignetteError, VignetteResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::cache::{AssetCache, AssetCacheOpts, AssetCacheStats};
pub use crate::assets::source::{Asset, AssetSource};
pub use crate::assets::storage::{FsStorage, MemoryStorage, StorageBackend, normalize_rel_path};
pub use crate::gallery::config::{GalleryOpts, SessionDef, ShadowDef};
pub use crate::gallery::{Gallery, SessionHandle};
pub use crate::render::batch::{RenderJob, render_batch};
pub use crate::render::shape::{MaskShape, ShadowDescriptor};
pub use crate::render::thumbnail::{
    RenderOpts, ShadowHint, ShadowMode, Thumbnail, ThumbnailRenderer,
};
pub use crate::session::controller::{
    SessionController, SessionFrame, SessionId, SessionObserver, SessionOpts, SessionState,
};
pub use crate::session::ticker::{CancelAck, TickControl, TickHandle, TickInfo, TickLoop};
pub use crate::surface::pool::{
    KindStats, SharedSurfacePool, Surface, SurfaceContent, SurfaceId, SurfaceKind, SurfaceLease,
    SurfacePool, SurfacePoolOpts, SurfacePoolStats,
};
