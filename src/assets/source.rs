use std::sync::Arc;

use crate::assets::decode::decode_image;
use crate::assets::storage::StorageBackend;
use crate::foundation::core::{AssetId, PixelSize};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::cpu::pixmap_from_premul_bytes;

/// Decoded source image read from storage.
///
/// Immutable once created. Pixels are premultiplied RGBA8 at the asset's native resolution,
/// stored directly in the rasterizer's pixmap layout so renders sample them without a copy.
pub struct Asset {
    id: AssetId,
    width: u32,
    height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl Asset {
    /// Wrap already-decoded premultiplied RGBA8 pixels.
    pub fn from_premul_rgba8(
        id: impl Into<AssetId>,
        width: u32,
        height: u32,
        rgba8_premul: &[u8],
    ) -> VignetteResult<Self> {
        let id = id.into();
        PixelSize::new(width, height)
            .validate()
            .map_err(|e| VignetteError::decode_failure(format!("'{id}': {e}")))?;
        if rgba8_premul.len() != PixelSize::new(width, height).rgba8_len() {
            return Err(VignetteError::decode_failure(format!(
                "'{id}': pixel buffer length {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Self::from_decoded(id, width, height, rgba8_premul)
    }

    fn from_decoded(id: AssetId, width: u32, height: u32, premul: &[u8]) -> VignetteResult<Self> {
        let pixmap = pixmap_from_premul_bytes(premul, PixelSize::new(width, height))
            .map_err(|e| VignetteError::decode_failure(format!("'{id}': {e}")))?;
        Ok(Self {
            id,
            width,
            height,
            pixmap: Arc::new(pixmap),
        })
    }

    /// Storage identifier this asset was read from.
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Native width in pixels.
    pub fn native_width(&self) -> u32 {
        self.width
    }

    /// Native height in pixels.
    pub fn native_height(&self) -> u32 {
        self.height
    }

    /// Native dimensions.
    pub fn native_size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Row-major premultiplied RGBA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Bytes held by the decoded pixel buffer.
    pub fn byte_len(&self) -> usize {
        self.native_size().rgba8_len()
    }

    /// Image paint sampling this asset's native pixels.
    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&self.pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Uncached reader turning storage bytes into [`Asset`]s.
///
/// Every call goes to storage and decodes afresh; nothing is retained after returning. Use
/// [`crate::AssetCache`] for assets that are shown repeatedly.
pub struct AssetSource {
    storage: Box<dyn StorageBackend>,
}

impl AssetSource {
    /// Create a source reading from `storage`.
    pub fn new(storage: impl StorageBackend + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Read and decode the asset stored under `id`.
    ///
    /// Fails with [`VignetteError::NotFound`] when the identifier does not resolve and
    /// [`VignetteError::DecodeFailure`] when the bytes are not an image.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub fn read(&self, id: &AssetId) -> VignetteResult<Asset> {
        let bytes = self.storage.read_bytes(id)?;
        let decoded = decode_image(&bytes).map_err(|e| match e {
            VignetteError::DecodeFailure(msg) => {
                VignetteError::decode_failure(format!("'{id}': {msg}"))
            }
            other => other,
        })?;
        tracing::debug!(
            width = decoded.width,
            height = decoded.height,
            "decoded asset"
        );
        Asset::from_decoded(
            id.clone(),
            decoded.width,
            decoded.height,
            &decoded.rgba8_premul,
        )
    }
}

impl std::fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
