//! Symbology renderers
//!
//! Each renderer produces the code-only raster (no margin). Sizing goes
//! through `crate::sizing` so validators see the same pass/fail boundary.

pub mod code128;
pub mod datamatrix;
pub mod qr;
pub mod surface;

use std::sync::Arc;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::job::{Job, Symbology};
use crate::raster::RasterBuffer;

pub use code128::Code128Renderer;
pub use datamatrix::DataMatrixRenderer;
pub use qr::QrRenderer;
pub use surface::{select_surface, DirectSurface, PngSurface, SymbolSurface};

pub trait SymbolRenderer: Send + Sync {
    fn symbology(&self) -> Symbology;

    /// Code-only raster for `job`, strictly monochrome.
    fn render(&self, job: &Job, config: &RenderConfig) -> Result<RasterBuffer>;
}

/// Renderer for `symbology`; Data Matrix probes through `surface`.
pub fn renderer_for(
    symbology: Symbology,
    surface: Arc<dyn SymbolSurface>,
) -> Box<dyn SymbolRenderer> {
    match symbology {
        Symbology::Qr => Box::new(QrRenderer),
        Symbology::Datamatrix => Box::new(DataMatrixRenderer::new(surface)),
        Symbology::Code128 => Box::new(Code128Renderer),
    }
}
