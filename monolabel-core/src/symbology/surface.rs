//! Rendering surfaces for Data Matrix probing
//!
//! One capability: render a payload's symbol to an RGBA bitmap at an integer
//! module scale. Which surface backs it is decided once, in `select_surface`.

use std::sync::Arc;

use datamatrix::{DataMatrix, SymbolList};
use tracing::debug;

use crate::config::SurfaceKind;
use crate::error::{LabelError, Result};
use crate::export::{decode_png, encode_png};
use crate::job::Symbology;
use crate::raster::{BitGrid, RasterBuffer};

/// Environment override consulted by `SurfaceKind::Auto`.
pub const SURFACE_ENV: &str = "MONOLABEL_SURFACE";

pub trait SymbolSurface: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render the symbol for `payload` with each module `scale` px square.
    fn render(&self, payload: &str, scale: u32) -> Result<RasterBuffer>;
}

/// Raw module grid from the Data Matrix encoder, square symbols only.
fn encode_modules(payload: &str) -> Result<BitGrid> {
    let code = DataMatrix::encode(payload.as_bytes(), SymbolList::default().enforce_square())
        .map_err(|e| LabelError::encoding(Symbology::Datamatrix, format!("{:?}", e)))?;
    let bitmap = code.bitmap();
    let (width, height) = (bitmap.width(), bitmap.height());

    let mut bits = vec![false; width * height];
    for (x, y) in bitmap.pixels() {
        bits[y * width + x] = true;
    }
    Ok(BitGrid { width, height, bits })
}

fn paint(grid: &BitGrid, scale: u32, quiet_modules: u32) -> RasterBuffer {
    let w = (grid.width as u32 + 2 * quiet_modules) * scale;
    let h = (grid.height as u32 + 2 * quiet_modules) * scale;
    let mut out = RasterBuffer::white(w, h);
    for y in 0..grid.height {
        for x in 0..grid.width {
            if grid.get(x, y) {
                out.fill_black(
                    (x as u32 + quiet_modules) * scale,
                    (y as u32 + quiet_modules) * scale,
                    scale,
                    scale,
                );
            }
        }
    }
    out
}

/// Paints the encoder's module grid directly, no padding.
pub struct DirectSurface;

impl SymbolSurface for DirectSurface {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn render(&self, payload: &str, scale: u32) -> Result<RasterBuffer> {
        let grid = encode_modules(payload)?;
        Ok(paint(&grid, scale.max(1), 0))
    }
}

/// Goes through an encoded PNG with a one-module quiet zone, then decodes it.
pub struct PngSurface;

impl SymbolSurface for PngSurface {
    fn name(&self) -> &'static str {
        "png"
    }

    fn render(&self, payload: &str, scale: u32) -> Result<RasterBuffer> {
        let grid = encode_modules(payload)?;
        let png = encode_png(&paint(&grid, scale.max(1), 1))?;
        decode_png(&png)
    }
}

pub fn select_surface(kind: SurfaceKind) -> Arc<dyn SymbolSurface> {
    let resolved = match kind {
        SurfaceKind::Auto => match std::env::var(SURFACE_ENV).as_deref() {
            Ok("png") => SurfaceKind::Png,
            _ => SurfaceKind::Direct,
        },
        other => other,
    };
    let surface: Arc<dyn SymbolSurface> = match resolved {
        SurfaceKind::Png => Arc::new(PngSurface),
        _ => Arc::new(DirectSurface),
    };
    debug!(surface = surface.name(), "Data Matrix surface selected");
    surface
}
