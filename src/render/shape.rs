use kurbo::Shape;

use crate::foundation::core::{BezPath, PixelSize, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::{VignetteError, VignetteResult};

/// Flattening tolerance (pixels) used when converting analytic shapes to paths.
pub(crate) const PATH_TOLERANCE: f64 = 0.1;

/// Analytic outline used both as the clip region and as the shadow outline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskShape {
    /// Axis-aligned rectangle filling the frame.
    Rect,
    /// Rectangle with uniformly rounded corners.
    RoundedRect {
        /// Corner radius in pixels; clamped to half the shorter edge.
        radius: f64,
    },
    /// Ellipse inscribed in the frame (a circle for square frames).
    Ellipse,
}

impl MaskShape {
    /// Outline of this shape laid out in `frame`.
    pub fn path_in(&self, frame: Rect) -> BezPath {
        match *self {
            Self::Rect => frame.to_path(PATH_TOLERANCE),
            Self::RoundedRect { radius } => {
                let max_r = 0.5 * frame.width().min(frame.height());
                let r = radius.clamp(0.0, max_r.max(0.0));
                kurbo::RoundedRect::from_rect(frame, r).to_path(PATH_TOLERANCE)
            }
            Self::Ellipse => kurbo::Ellipse::from_rect(frame).to_path(PATH_TOLERANCE),
        }
    }

    fn validate(&self) -> VignetteResult<()> {
        if let Self::RoundedRect { radius } = self
            && (!radius.is_finite() || *radius < 0.0)
        {
            return Err(VignetteError::validation(
                "rounded rect radius must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Explicit shadow geometry and paint.
///
/// The shadow outline is `shape` laid out in the same content frame as the clip region, then
/// translated by `offset`. Clip and shadow therefore always come from one geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowDescriptor {
    /// Shadow displacement in pixels (`+y` is down).
    pub offset: Vec2,
    /// Blur radius in pixels; `0` draws a hard-edged shadow.
    pub blur_radius: f64,
    /// Shadow color.
    pub color: Rgba8Premul,
    /// Outline shared by the clip region and the shadow.
    pub shape: MaskShape,
}

impl ShadowDescriptor {
    /// A descriptor that draws no shadow but still defines the clip shape.
    pub fn none(shape: MaskShape) -> Self {
        Self {
            offset: Vec2::ZERO,
            blur_radius: 0.0,
            color: Rgba8Premul::transparent(),
            shape,
        }
    }

    /// Check that every numeric field is usable.
    pub fn validate(&self) -> VignetteResult<()> {
        if !self.offset.x.is_finite() || !self.offset.y.is_finite() {
            return Err(VignetteError::validation("shadow offset must be finite"));
        }
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(VignetteError::validation(
                "shadow blur radius must be finite and >= 0",
            ));
        }
        self.shape.validate()
    }

    /// Return `true` when the shadow contributes no pixels.
    pub fn is_invisible(&self) -> bool {
        self.color.is_transparent()
    }

    /// Frame the masked content occupies inside a `size` bitmap that also holds the shadow.
    ///
    /// Each edge is inset by the blur radius, plus the offset on the side the shadow is cast
    /// towards. Errors with [`VignetteError::InvalidSize`] when nothing remains.
    pub fn content_frame(&self, size: PixelSize) -> VignetteResult<Rect> {
        let full = size.validate()?.to_rect();
        if self.is_invisible() {
            return Ok(full);
        }
        let blur = self.blur_radius.ceil();
        let left = (blur - self.offset.x).max(0.0);
        let right = (blur + self.offset.x).max(0.0);
        let top = (blur - self.offset.y).max(0.0);
        let bottom = (blur + self.offset.y).max(0.0);
        let frame = Rect::new(full.x0 + left, full.y0 + top, full.x1 - right, full.y1 - bottom);
        if frame.width() <= 0.0 || frame.height() <= 0.0 {
            return Err(VignetteError::invalid_size(format!(
                "target size {}x{} leaves no room for content after shadow margins",
                size.width, size.height
            )));
        }
        Ok(frame)
    }

    /// Clip region for content in `frame`.
    pub fn clip_path(&self, frame: Rect) -> BezPath {
        self.shape.path_in(frame)
    }

    /// Shadow outline for content in `frame`: the clip path translated by `offset`.
    pub fn shadow_path(&self, frame: Rect) -> BezPath {
        let mut path = self.clip_path(frame);
        path.apply_affine(kurbo::Affine::translate(self.offset));
        path
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/shape.rs"]
mod tests;
