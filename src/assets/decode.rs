use crate::foundation::core::PixelSize;
use crate::foundation::error::{VignetteError, VignetteResult};

/// Decoded raster in premultiplied RGBA8 form.
pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8_premul: Vec<u8>,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub(crate) fn decode_image(bytes: &[u8]) -> VignetteResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| VignetteError::decode_failure(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(VignetteError::decode_failure("decoded image is empty"));
    }
    // The rasterizer samples sources as u16-addressed pixmaps.
    if width > PixelSize::MAX_EDGE || height > PixelSize::MAX_EDGE {
        return Err(VignetteError::decode_failure(format!(
            "decoded image {width}x{height} exceeds {} pixels per edge",
            PixelSize::MAX_EDGE
        )));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul,
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
