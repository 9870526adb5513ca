use rayon::prelude::*;

use crate::assets::source::Asset;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::shape::ShadowDescriptor;
use crate::render::thumbnail::{RenderOpts, Thumbnail, ThumbnailRenderer};

/// One thumbnail to render off the host thread.
#[derive(Clone, Copy, Debug)]
pub struct RenderJob<'a> {
    /// Source asset.
    pub asset: &'a Asset,
    /// Exact output size.
    pub target: PixelSize,
    /// Clip and shadow geometry.
    pub shadow: &'a ShadowDescriptor,
}

/// Render `jobs` on a dedicated rayon pool.
///
/// Each worker owns its own [`ThumbnailRenderer`]. Results come back in input order once every
/// job has finished; per-job failures are reported in place.
pub fn render_batch(
    jobs: &[RenderJob<'_>],
    opts: RenderOpts,
) -> VignetteResult<Vec<VignetteResult<Thumbnail>>> {
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let pool = build_thread_pool(opts.threads)?;
    let rendered = pool.install(|| {
        jobs.par_iter()
            .map_init(
                || ThumbnailRenderer::new(opts),
                |renderer, job| renderer.render(job.asset, job.target, job.shadow),
            )
            .collect::<Vec<_>>()
    });
    Ok(rendered)
}

fn build_thread_pool(threads: Option<usize>) -> VignetteResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VignetteError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VignetteError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
