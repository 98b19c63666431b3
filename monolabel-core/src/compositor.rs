//! Margin compositor - last stage before the container
//!
//! The code raster is exactly the inner area. The output is exactly the outer
//! pixel geometry with a white margin band of `margin_px` on every side.

use tracing::{info, instrument};

use crate::config::RenderConfig;
use crate::error::{ErrorCode, LabelError, Result};
use crate::export::encode_png;
use crate::job::Job;
use crate::raster::RasterBuffer;
use crate::sizing::JobGeometry;

/// Finalized outer raster, strictly monochrome.
#[instrument(skip_all, fields(symbology = %job.symbology, invert = job.invert))]
pub fn compose_raster(
    job: &Job,
    code: &RasterBuffer,
    config: &RenderConfig,
) -> Result<RasterBuffer> {
    let geo = JobGeometry::resolve(job)?;

    if code.width() != geo.inner_width || code.height() != geo.inner_height {
        return Err(LabelError::infeasible(
            ErrorCode::Inner,
            format!(
                "Code raster must be exactly {}x{}px (inner area after {}px margin), got {}x{}px.",
                geo.inner_width,
                geo.inner_height,
                geo.margin_px,
                code.width(),
                code.height()
            ),
        ));
    }

    // gray or translucent input is a renderer defect, never coerced
    code.assert_monochrome()?;

    let mut canvas = RasterBuffer::white(geo.pixel.pixel_width, geo.pixel.pixel_height);
    canvas.blit(code, geo.margin_px, geo.margin_px)?;

    if job.invert {
        canvas.invert();
    }

    canvas.threshold(config.mono_threshold);
    canvas.assert_monochrome()?;

    info!(
        width = canvas.width(),
        height = canvas.height(),
        margin_px = geo.margin_px,
        "Label composed"
    );
    Ok(canvas)
}

/// `compose_raster`, then PNG.
pub fn compose(job: &Job, code: &RasterBuffer, config: &RenderConfig) -> Result<Vec<u8>> {
    let canvas = compose_raster(job, code, config)?;
    let png = encode_png(&canvas)?;
    info!(bytes = png.len(), "PNG encoded");
    Ok(png)
}
