use std::sync::Arc;

use crate::assets::source::Asset;
use crate::foundation::core::{Affine, BezPath, PixelSize, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::VignetteResult;
use crate::render::cpu::{CpuContext, affine_to_cpu, bezpath_to_cpu, new_pixmap};
use crate::render::shadow::ShadowLayers;
use crate::render::shape::ShadowDescriptor;

/// How the shadow reaches the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    /// Shadow is drawn into the bitmap in the same pass as the masked content.
    #[default]
    Baked,
    /// Bitmap holds only the masked content; the compositor draws the shadow from a
    /// precomputed [`ShadowHint`].
    Hinted,
}

/// Thumbnail rendering options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Shadow delivery mode.
    pub shadow_mode: ShadowMode,
    /// Render row batches on a rayon pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Precomputed shadow geometry handed to the compositor in [`ShadowMode::Hinted`].
///
/// The outline is in thumbnail pixel space and equals the thumbnail's clip outline; the
/// compositor applies `offset`, `blur_radius` and `color` without inspecting pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowHint {
    /// Outline of the masked content (clip path) in thumbnail coordinates.
    pub outline: BezPath,
    /// Displacement to apply to the outline.
    pub offset: Vec2,
    /// Blur radius in pixels.
    pub blur_radius: f64,
    /// Shadow color.
    pub color: Rgba8Premul,
}

/// Immutable rendered bitmap sized exactly to its display target.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
    shadow_hint: Option<Arc<ShadowHint>>,
}

impl Thumbnail {
    /// Width in pixels (always the requested target width).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (always the requested target height).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Row-major premultiplied RGBA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Shadow geometry for the compositor, present only for [`ShadowMode::Hinted`] renders.
    pub fn shadow_hint(&self) -> Option<&ShadowHint> {
        self.shadow_hint.as_deref()
    }

    /// Stable 64-bit fingerprint of dimensions and pixels.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hasher.digest()
    }
}

/// Renders assets into masked, shadowed thumbnails in one rasterization pass.
///
/// The clip is filled directly with the asset as an image paint whose transform maps native
/// pixels onto the target frame, so no native-resolution intermediate is ever allocated.
/// Shadow layers come from [`ShadowDescriptor`] geometry and are cached per size/descriptor.
#[derive(Default)]
pub struct ThumbnailRenderer {
    opts: RenderOpts,
    cpu: CpuContext,
    shadows: ShadowLayers,
}

impl ThumbnailRenderer {
    /// Construct a renderer.
    pub fn new(opts: RenderOpts) -> Self {
        Self {
            opts,
            cpu: CpuContext::default(),
            shadows: ShadowLayers::default(),
        }
    }

    /// Options this renderer was built with.
    pub fn opts(&self) -> RenderOpts {
        self.opts
    }

    /// Number of shadow layers computed so far (cache misses).
    pub fn shadow_layer_builds(&self) -> u64 {
        self.shadows.builds()
    }

    /// Render `asset` into a thumbnail of exactly `target` pixels.
    ///
    /// Fails with [`crate::VignetteError::InvalidSize`] when either target edge is zero or the
    /// shadow margins leave no room for content.
    #[tracing::instrument(skip(self, asset, shadow), fields(id = %asset.id()))]
    pub fn render(
        &mut self,
        asset: &Asset,
        target: PixelSize,
        shadow: &ShadowDescriptor,
    ) -> VignetteResult<Thumbnail> {
        let target = target.validate()?;
        shadow.validate()?;

        let (frame, hint) = match self.opts.shadow_mode {
            ShadowMode::Baked => (shadow.content_frame(target)?, None),
            ShadowMode::Hinted => {
                let frame = target.to_rect();
                let hint = ShadowHint {
                    outline: shadow.clip_path(frame),
                    offset: shadow.offset,
                    blur_radius: shadow.blur_radius,
                    color: shadow.color,
                };
                (frame, Some(Arc::new(hint)))
            }
        };

        let shadow_layer = if hint.is_none() && !shadow.is_invisible() {
            Some(
                self.shadows
                    .get_or_build(&mut self.cpu, target, frame, shadow)?,
            )
        } else {
            None
        };

        let clip = bezpath_to_cpu(&shadow.clip_path(frame));
        let source = asset.paint();
        let paint_transform = affine_to_cpu(cover_transform(asset.native_size(), frame));

        let mut out = new_pixmap(target)?;
        self.cpu.with_ctx_mut(target, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            if let Some(layer) = shadow_layer {
                ctx.set_paint(layer);
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(target.width),
                    f64::from(target.height),
                ));
            }
            ctx.set_paint(source);
            ctx.set_paint_transform(paint_transform);
            ctx.fill_path(&clip);
            ctx.flush();
            ctx.render_to_pixmap(&mut out);
            Ok(())
        })?;

        Ok(Thumbnail {
            width: target.width,
            height: target.height,
            pixels: Arc::from(out.data_as_u8_slice()),
            shadow_hint: hint,
        })
    }
}

/// Map native asset pixels onto `frame`, scaled to cover it and centered (aspect fill).
pub(crate) fn cover_transform(native: PixelSize, frame: Rect) -> Affine {
    let (iw, ih) = (f64::from(native.width), f64::from(native.height));
    let scale = (frame.width() / iw).max(frame.height() / ih);
    let dx = frame.x0 + 0.5 * (frame.width() - iw * scale);
    let dy = frame.y0 + 0.5 * (frame.height() - ih * scale);
    Affine::translate((dx, dy)) * Affine::scale(scale)
}

#[cfg(test)]
#[path = "../../tests/unit/render/thumbnail.rs"]
mod tests;
