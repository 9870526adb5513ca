use std::collections::HashMap;

use crate::foundation::core::{PixelSize, Rect};
use crate::foundation::error::VignetteResult;
use crate::render::cpu::{
    CpuContext, bezpath_to_cpu, blur_plane_q16, gaussian_kernel_q16, image_paint, new_pixmap,
    pixmap_from_premul_bytes,
};
use crate::render::shape::{MaskShape, ShadowDescriptor};

/// Upper bound on cached shadow layers per renderer.
const MAX_LAYERS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ShadowKey {
    size: PixelSize,
    offset: (u64, u64),
    blur: u64,
    color: [u8; 4],
    shape: (u8, u64),
}

impl ShadowKey {
    fn new(size: PixelSize, desc: &ShadowDescriptor) -> Self {
        let shape = match desc.shape {
            MaskShape::Rect => (0, 0),
            MaskShape::RoundedRect { radius } => (1, radius.to_bits()),
            MaskShape::Ellipse => (2, 0),
        };
        Self {
            size,
            offset: (desc.offset.x.to_bits(), desc.offset.y.to_bits()),
            blur: desc.blur_radius.to_bits(),
            color: desc.color.to_array(),
            shape,
        }
    }
}

/// Shadow layers computed analytically from the descriptor's outline.
///
/// A layer depends only on `(size, descriptor)`, never on rendered content, so thumbnails of one
/// row style share it.
#[derive(Default)]
pub(crate) struct ShadowLayers {
    layers: HashMap<ShadowKey, vello_cpu::Image>,
    builds: u64,
}

impl ShadowLayers {
    pub(crate) fn get_or_build(
        &mut self,
        cpu: &mut CpuContext,
        size: PixelSize,
        frame: Rect,
        desc: &ShadowDescriptor,
    ) -> VignetteResult<vello_cpu::Image> {
        let key = ShadowKey::new(size, desc);
        if let Some(layer) = self.layers.get(&key) {
            return Ok(layer.clone());
        }
        let layer = build_layer(cpu, size, frame, desc)?;
        if self.layers.len() >= MAX_LAYERS {
            self.layers.clear();
        }
        self.layers.insert(key, layer.clone());
        self.builds += 1;
        Ok(layer)
    }

    pub(crate) fn builds(&self) -> u64 {
        self.builds
    }
}

/// Rasterize `desc.shadow_path(frame)`, blur its coverage and tint it.
///
/// Input is the analytic outline only; rendered thumbnail pixels are never read.
fn build_layer(
    cpu: &mut CpuContext,
    size: PixelSize,
    frame: Rect,
    desc: &ShadowDescriptor,
) -> VignetteResult<vello_cpu::Image> {
    let outline = bezpath_to_cpu(&desc.shadow_path(frame));
    let mut coverage = new_pixmap(size)?;
    cpu.with_ctx_mut(size, |ctx| {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_path(&outline);
        ctx.flush();
        ctx.render_to_pixmap(&mut coverage);
        Ok(())
    })?;

    let mut plane: Vec<u8> = coverage
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| px[3])
        .collect();
    let radius = desc.blur_radius.ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, (desc.blur_radius / 2.0).max(0.5) as f32)?;
    blur_plane_q16(&mut plane, size.width, size.height, &kernel);

    let [r, g, b, a] = desc.color.to_array();
    let tint = |c: u8, cov: u8| -> u8 { ((u16::from(c) * u16::from(cov) + 127) / 255) as u8 };
    let mut rgba = Vec::with_capacity(size.rgba8_len());
    for &cov in &plane {
        rgba.extend_from_slice(&[tint(r, cov), tint(g, cov), tint(b, cov), tint(a, cov)]);
    }
    Ok(image_paint(pixmap_from_premul_bytes(&rgba, size)?))
}

#[cfg(test)]
#[path = "../../tests/unit/render/shadow.rs"]
mod tests;
