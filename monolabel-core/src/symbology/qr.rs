//! QR renderer - integer-scaled module grid centered in the inner area.

use qrcode::{Color, EcLevel, QrCode};
use tracing::instrument;

use super::SymbolRenderer;
use crate::config::RenderConfig;
use crate::error::{LabelError, Result};
use crate::job::{Job, Symbology};
use crate::raster::RasterBuffer;
use crate::sizing::{check_symbology, JobGeometry, QrPlan};

/// Fixed error-correction level; validators and renderer both read this.
pub const QR_EC_LEVEL: EcLevel = EcLevel::M;

/// Square module matrix, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    pub modules: u32,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.dark[(y * self.modules + x) as usize]
    }
}

pub fn encode_matrix(payload: &str) -> Result<QrMatrix> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), QR_EC_LEVEL)
        .map_err(|e| LabelError::encoding(Symbology::Qr, e.to_string()))?;
    let modules = code.width() as u32;
    let dark = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
    Ok(QrMatrix { modules, dark })
}

/// Everything but drawing: encode and size.
pub fn prepare(job: &Job, geo: &JobGeometry, config: &RenderConfig) -> Result<(QrMatrix, QrPlan)> {
    let matrix = encode_matrix(&job.payload)?;
    let plan = QrPlan::derive(geo, matrix.modules, config)?;
    Ok((matrix, plan))
}

#[instrument(skip_all, fields(payload_len = job.payload.len()))]
pub fn render(job: &Job, config: &RenderConfig) -> Result<RasterBuffer> {
    check_symbology(job, Symbology::Qr)?;
    let geo = JobGeometry::resolve(job)?;
    let (matrix, plan) = prepare(job, &geo, config)?;

    let mut out = RasterBuffer::white(geo.inner_width, geo.inner_height);
    for r in 0..matrix.modules {
        for c in 0..matrix.modules {
            if !matrix.is_dark(c, r) {
                continue;
            }
            out.fill_black(
                plan.offset_x + c * plan.scale,
                plan.offset_y + r * plan.scale,
                plan.scale,
                plan.scale,
            );
        }
    }
    Ok(out)
}

pub struct QrRenderer;

impl SymbolRenderer for QrRenderer {
    fn symbology(&self) -> Symbology {
        Symbology::Qr
    }

    fn render(&self, job: &Job, config: &RenderConfig) -> Result<RasterBuffer> {
        render(job, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::job::{PhysicalSize, Unit};

    fn job(payload: &str, width: f64, height: f64, dpi: u32, margin: f64) -> Job {
        let size = PhysicalSize { unit: Unit::In, width, height, dpi };
        Job::new(Symbology::Qr, payload, size, margin)
    }

    #[test]
    fn test_hello_code_area_is_inner_square() {
        let out = render(&job("HELLO", 1.0, 1.0, 600, 0.04), &RenderConfig::default()).unwrap();
        // 600 - 2 * 24
        assert_eq!(out.width(), 552);
        assert_eq!(out.height(), 552);
        assert!(out.assert_monochrome().is_ok());
        // top-left finder pattern starts at the centering offset
        assert!(!out.is_black(2, 2));
        assert!(out.is_black(3, 3));
    }

    #[test]
    fn test_rectangular_job_fills_inner_area() {
        let out = render(&job("SIZE_TEST", 2.0, 1.0, 300, 0.04), &RenderConfig::default()).unwrap();
        assert_eq!((out.width(), out.height()), (576, 276));
        assert!(out.assert_monochrome().is_ok());
        // symbol is centered horizontally, leaving white columns on the left
        assert!((0..out.height()).all(|y| !out.is_black(0, y)));
    }

    #[test]
    fn test_deterministic() {
        let j = job("DET_TEST", 1.0, 1.0, 600, 0.04);
        let a = render(&j, &RenderConfig::default()).unwrap();
        let b = render(&j, &RenderConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_dense_fails_with_px_per_module() {
        let j = job("TOO_SMALL_PAYLOAD_DENSITY_TEST_1234567890", 0.2, 0.2, 203, 0.01);
        let err = render(&j, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooDense);
        assert!(err.to_string().contains("px/module"));
        assert!(err.to_string().contains("QR too small"));
    }

    #[test]
    fn test_wrong_symbology() {
        let mut j = job("HELLO", 1.0, 1.0, 600, 0.04);
        j.symbology = Symbology::Code128;
        let err = render(&j, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Symbology);
        assert!(err.to_string().contains("must be 'qr'"));
    }

    #[test]
    fn test_matrix_size() {
        // Version 1 at level M holds "HELLO"
        assert_eq!(encode_matrix("HELLO").unwrap().modules, 21);
    }
}
