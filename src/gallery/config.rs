use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::animation::ease::Ease;
use crate::assets::cache::AssetCacheOpts;
use crate::foundation::core::{PixelSize, Rgba8Premul, Vec2};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::shape::{MaskShape, ShadowDescriptor};
use crate::render::thumbnail::{RenderOpts, ShadowMode};
use crate::session::controller::SessionOpts;
use crate::surface::pool::{SurfaceKind, SurfacePoolOpts};

/// JSON-facing shadow settings. Color is straight (non-premultiplied) RGBA.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowDef {
    /// Shadow offset `[dx, dy]` in pixels.
    pub offset: [f64; 2],
    /// Blur radius in pixels.
    pub blur_radius: f64,
    /// Straight RGBA color.
    pub color: [u8; 4],
    /// Mask and shadow outline.
    pub shape: MaskShape,
}

impl Default for ShadowDef {
    fn default() -> Self {
        Self {
            offset: [0.0, 2.0],
            blur_radius: 4.0,
            color: [0, 0, 0, 96],
            shape: MaskShape::RoundedRect { radius: 8.0 },
        }
    }
}

impl ShadowDef {
    /// Runtime descriptor for these settings.
    pub fn descriptor(&self) -> ShadowDescriptor {
        let [r, g, b, a] = self.color;
        ShadowDescriptor {
            offset: Vec2::new(self.offset[0], self.offset[1]),
            blur_radius: self.blur_radius,
            color: Rgba8Premul::from_straight_rgba(r, g, b, a),
            shape: self.shape,
        }
    }
}

/// JSON-facing session settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionDef {
    /// Tick period in milliseconds.
    pub tick_interval_ms: u64,
    /// Animation length in milliseconds.
    pub animation_ms: u64,
    /// Animation curve.
    pub ease: Ease,
    /// Loop the animation.
    pub looping: bool,
    /// Strict lifecycle checking; `None` follows the build profile.
    pub strict: Option<bool>,
}

impl Default for SessionDef {
    fn default() -> Self {
        let d = SessionOpts::default();
        Self {
            tick_interval_ms: d.tick_interval.as_millis() as u64,
            animation_ms: d.animation_duration.as_millis() as u64,
            ease: d.ease,
            looping: d.looping,
            strict: None,
        }
    }
}

impl SessionDef {
    /// Runtime options for these settings.
    pub fn opts(&self) -> SessionOpts {
        SessionOpts {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            animation_duration: Duration::from_millis(self.animation_ms),
            ease: self.ease,
            looping: self.looping,
            strict: self.strict.unwrap_or(cfg!(debug_assertions)),
        }
    }
}

/// Configuration of a [`crate::Gallery`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GalleryOpts {
    /// Size every row thumbnail is rendered at.
    pub thumbnail_size: PixelSize,
    /// Row thumbnail shadow.
    pub shadow: ShadowDef,
    /// Renderer options.
    pub render: RenderOpts,
    /// Cached read path budget (row thumbnails only).
    pub cache: AssetCacheOpts,
    /// Surface pool options.
    pub pool: SurfacePoolOpts,
    /// Detail session options.
    pub session: SessionDef,
    /// Surface kind used for list rows.
    pub row_kind: String,
    /// Surface kind used for detail views.
    pub detail_kind: String,
}

impl Default for GalleryOpts {
    fn default() -> Self {
        Self {
            thumbnail_size: PixelSize::new(90, 90),
            shadow: ShadowDef::default(),
            render: RenderOpts::default(),
            cache: AssetCacheOpts::default(),
            pool: SurfacePoolOpts::default(),
            session: SessionDef::default(),
            row_kind: "row".to_owned(),
            detail_kind: "detail".to_owned(),
        }
    }
}

impl GalleryOpts {
    /// Parse and validate options from JSON text. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> VignetteResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| VignetteError::validation(format!("parse gallery options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse and validate options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VignetteResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| VignetteError::validation(format!("parse gallery options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse and validate options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VignetteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VignetteError::validation(format!("open gallery options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every value the runtime relies on.
    pub fn validate(&self) -> VignetteResult<()> {
        self.thumbnail_size
            .validate()
            .map_err(|e| VignetteError::validation(format!("thumbnail_size: {e}")))?;
        self.shadow_descriptor().validate()?;
        if self.render.shadow_mode == ShadowMode::Baked {
            self.shadow_descriptor()
                .content_frame(self.thumbnail_size)
                .map_err(|e| {
                    VignetteError::validation(format!("shadow does not fit thumbnail: {e}"))
                })?;
        }
        if self.session.tick_interval_ms == 0 {
            return Err(VignetteError::validation("session.tick_interval_ms must be > 0"));
        }
        if self.render.threads == Some(0) {
            return Err(VignetteError::validation("render.threads must be >= 1"));
        }
        if self.row_kind.is_empty() || self.detail_kind.is_empty() {
            return Err(VignetteError::validation("surface kinds must be non-empty"));
        }
        if self.row_kind == self.detail_kind {
            return Err(VignetteError::validation(
                "row_kind and detail_kind must differ",
            ));
        }
        Ok(())
    }

    /// Runtime shadow descriptor for row thumbnails.
    pub fn shadow_descriptor(&self) -> ShadowDescriptor {
        self.shadow.descriptor()
    }

    /// Runtime session options.
    pub fn session_opts(&self) -> SessionOpts {
        self.session.opts()
    }

    /// Row surface kind.
    pub fn row_kind(&self) -> SurfaceKind {
        SurfaceKind::new(&self.row_kind)
    }

    /// Detail surface kind.
    pub fn detail_kind(&self) -> SurfaceKind {
        SurfaceKind::new(&self.detail_kind)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gallery/config.rs"]
mod tests;
