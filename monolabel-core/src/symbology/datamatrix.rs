//! Data Matrix renderer
//!
//! Module counts depend on the encoder, so the symbol is probed once at
//! scale 1, tight-cropped, and the final raster is synthesized from the
//! probed bit matrix at `floor(target / modules)` px per module.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::surface::SymbolSurface;
use super::SymbolRenderer;
use crate::config::RenderConfig;
use crate::error::{LabelError, Result};
use crate::job::{Job, Symbology};
use crate::raster::{BitGrid, RasterBuffer};
use crate::sizing::{check_symbology, DataMatrixPlan, JobGeometry};

/// Tight-cropped square module matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    pub modules: u32,
    grid: BitGrid,
}

impl ModuleMatrix {
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.grid.get(x as usize, y as usize)
    }
}

pub fn probe_modules(
    surface: &dyn SymbolSurface,
    payload: &str,
    threshold: u8,
) -> Result<ModuleMatrix> {
    let symbol = surface.render(payload, 1)?;
    let grid = BitGrid::from_raster(&symbol, threshold);

    let bounds = grid.tight_bounds().ok_or_else(|| {
        LabelError::encoding(Symbology::Datamatrix, "encoded symbol has no black modules")
    })?;
    if bounds.width != bounds.height {
        return Err(LabelError::encoding(
            Symbology::Datamatrix,
            format!("expected square module matrix, got {}x{}", bounds.width, bounds.height),
        ));
    }

    debug!(
        surface = surface.name(),
        raw_w = symbol.width(),
        raw_h = symbol.height(),
        modules = bounds.width,
        "Data Matrix probed"
    );
    Ok(ModuleMatrix {
        modules: bounds.width as u32,
        grid: grid.crop(bounds),
    })
}

/// Everything but drawing: probe and size.
pub fn prepare(
    job: &Job,
    geo: &JobGeometry,
    config: &RenderConfig,
    surface: &dyn SymbolSurface,
) -> Result<(ModuleMatrix, DataMatrixPlan)> {
    let matrix = probe_modules(surface, &job.payload, config.mono_threshold)?;
    let plan = DataMatrixPlan::derive(geo, matrix.modules, config)?;
    Ok((matrix, plan))
}

/// Tight `modules*scale` square, no quiet zone.
#[instrument(skip_all, fields(payload_len = job.payload.len(), surface = surface.name()))]
pub fn render(
    job: &Job,
    config: &RenderConfig,
    surface: &dyn SymbolSurface,
) -> Result<RasterBuffer> {
    check_symbology(job, Symbology::Datamatrix)?;
    let geo = JobGeometry::resolve(job)?;
    let (matrix, plan) = prepare(job, &geo, config, surface)?;

    let mut out = RasterBuffer::white(plan.side_px, plan.side_px);
    for my in 0..matrix.modules {
        for mx in 0..matrix.modules {
            if matrix.is_dark(mx, my) {
                out.fill_black(mx * plan.scale, my * plan.scale, plan.scale, plan.scale);
            }
        }
    }
    Ok(out)
}

pub struct DataMatrixRenderer {
    surface: Arc<dyn SymbolSurface>,
}

impl DataMatrixRenderer {
    pub fn new(surface: Arc<dyn SymbolSurface>) -> Self {
        Self { surface }
    }
}

impl SymbolRenderer for DataMatrixRenderer {
    fn symbology(&self) -> Symbology {
        Symbology::Datamatrix
    }

    fn render(&self, job: &Job, config: &RenderConfig) -> Result<RasterBuffer> {
        render(job, config, self.surface.as_ref())
    }
}
