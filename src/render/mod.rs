//! Thumbnail rendering.
//!
//! Clip region and shadow outline are derived from one [`shape::ShadowDescriptor`]; the final
//! bitmap is produced by a single `vello_cpu` pass at target resolution.

/// Parallel batch rendering.
pub mod batch;
pub(crate) mod cpu;
pub(crate) mod shadow;
/// Mask and shadow geometry.
pub mod shape;
/// Single-pass thumbnail renderer.
pub mod thumbnail;
