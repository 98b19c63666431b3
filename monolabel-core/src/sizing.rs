//! Shared sizing and density calculators
//!
//! Validators and renderers both call these. A job passes validation exactly
//! when the renderer's sizing succeeds, because there is only one formula.

use serde::Serialize;
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{ErrorCode, LabelError, Result};
use crate::job::{Job, Symbology, Unit};
use crate::units::{self, compute_pixel_size, margin_to_pixels, trim_decimals, PixelGeometry};

/// Outer and inner pixel geometry of a job.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct JobGeometry {
    pub pixel: PixelGeometry,
    pub margin_px: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub dpi: u32,
    pub unit: Unit,
}

impl JobGeometry {
    /// Input-shape checks plus margin-in-pixels and inner-area derivation.
    pub fn resolve(job: &Job) -> Result<Self> {
        if job.payload.trim().is_empty() {
            return Err(LabelError::invalid(
                ErrorCode::Payload,
                "Payload must be a non-empty string.",
            ));
        }

        let size = &job.size;
        if size.dpi == 0 {
            return Err(LabelError::invalid(
                ErrorCode::Dpi,
                "DPI must be an integer greater than 0.",
            ));
        }
        if !size.width.is_finite() || size.width <= 0.0 {
            return Err(LabelError::invalid(ErrorCode::Size, "Width must be a finite number > 0."));
        }
        if !size.height.is_finite() || size.height <= 0.0 {
            return Err(LabelError::invalid(ErrorCode::Size, "Height must be a finite number > 0."));
        }

        let margin = job.margin.value;
        if !margin.is_finite() || margin < 0.0 {
            return Err(LabelError::invalid(
                ErrorCode::Margin,
                "Margin must be a finite number >= 0.",
            ));
        }
        if margin * 2.0 > size.width || margin * 2.0 > size.height {
            return Err(LabelError::invalid(
                ErrorCode::Margin,
                format!(
                    "Margin cannot exceed half of width or height ({} {} margin on {}).",
                    trim_decimals(margin, 4),
                    size.unit,
                    units::format_size(size, 3)
                ),
            ));
        }

        let pixel = compute_pixel_size(size)?;
        let margin_px = margin_to_pixels(margin, size.unit, size.dpi)?;

        let inner_w = pixel.pixel_width as i64 - 2 * margin_px as i64;
        let inner_h = pixel.pixel_height as i64 - 2 * margin_px as i64;
        if inner_w <= 0 || inner_h <= 0 {
            return Err(LabelError::infeasible(
                ErrorCode::Inner,
                format!(
                    "Inner pixel size must be > 0 after margins: {}x{}px outer, {}px margin leaves {}x{}px.",
                    pixel.pixel_width, pixel.pixel_height, margin_px, inner_w, inner_h
                ),
            ));
        }

        Ok(Self {
            pixel,
            margin_px,
            inner_width: inner_w as u32,
            inner_height: inner_h as u32,
            dpi: size.dpi,
            unit: size.unit,
        })
    }

    /// Side of the largest square that fits the inner area.
    pub fn inner_side(&self) -> u32 {
        self.inner_width.min(self.inner_height)
    }

    /// "<x><unit> (~<y><other unit>)" for an outer length of `px` at this DPI.
    pub fn suggest(&self, px: u32) -> String {
        let primary = units::px_to_physical(px, self.unit, self.dpi);
        let other_unit = self.unit.complement();
        let secondary = units::px_to_physical(px, other_unit, self.dpi);
        format!(
            "{}{} (~{}{})",
            trim_decimals(primary, 3),
            self.unit,
            trim_decimals(secondary, 3),
            other_unit
        )
    }
}

pub fn check_symbology(job: &Job, expected: Symbology) -> Result<()> {
    if job.symbology != expected {
        return Err(LabelError::invalid(
            ErrorCode::Symbology,
            format!("Job symbology must be '{}' (received '{}').", expected, job.symbology),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct QrPlan {
    pub modules: u32,
    pub scale: u32,
    pub symbol_px: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl QrPlan {
    pub fn derive(geo: &JobGeometry, modules: u32, config: &RenderConfig) -> Result<Self> {
        if modules == 0 {
            return Err(LabelError::encoding(Symbology::Qr, "invalid module matrix size 0"));
        }
        let side = geo.inner_side();
        let scale = side / modules;
        let min = config.qr_min_module_px;

        if scale < min {
            let min_code_px = modules.saturating_mul(min);
            let min_outer_px = min_code_px.saturating_add(2 * geo.margin_px);
            return Err(LabelError::density(
                ErrorCode::TooDense,
                format!(
                    "QR too small for payload at current size: {}px/module achieved (min {}px/module). \
                     Need at least {}px code area, which is about {} at {} DPI including margin.",
                    scale,
                    min,
                    min_code_px,
                    geo.suggest(min_outer_px),
                    geo.dpi
                ),
            ));
        }

        let symbol_px = scale * modules;
        let plan = Self {
            modules,
            scale,
            symbol_px,
            offset_x: (geo.inner_width - symbol_px) / 2,
            offset_y: (geo.inner_height - symbol_px) / 2,
        };
        debug!(?plan, "QR plan");
        Ok(plan)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DataMatrixPlan {
    pub modules: u32,
    pub scale: u32,
    pub side_px: u32,
}

impl DataMatrixPlan {
    pub fn derive(geo: &JobGeometry, modules: u32, config: &RenderConfig) -> Result<Self> {
        if modules == 0 {
            return Err(LabelError::encoding(
                Symbology::Datamatrix,
                "Unable to determine Data Matrix module dimensions.",
            ));
        }
        let target = geo.inner_side();
        let scale = target / modules;
        let min = config.datamatrix_min_module_px;

        if scale < min {
            let min_side_px = modules.saturating_mul(min);
            return Err(LabelError::density(
                ErrorCode::TooSmall,
                format!(
                    "Output too small for reliable scanning: {}px/module achieved (min {}px/module) \
                     for a {}x{} module symbol. Need at least {}px square, about {} at {} DPI including margin.",
                    scale,
                    min,
                    modules,
                    modules,
                    min_side_px,
                    geo.suggest(min_side_px.saturating_add(2 * geo.margin_px)),
                    geo.dpi
                ),
            ));
        }

        let plan = Self { modules, scale, side_px: modules * scale };
        debug!(?plan, "Data Matrix plan");
        Ok(plan)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Code128Plan {
    pub base_width: u32,
    pub scale: u32,
    pub draw_width: u32,
    pub offset_x: u32,
}

impl Code128Plan {
    pub fn check_payload(payload: &str, config: &RenderConfig) -> Result<()> {
        let len = payload.chars().count();
        if len > config.code128_max_payload_len {
            return Err(LabelError::invalid(
                ErrorCode::Payload,
                format!(
                    "Payload too long ({} chars). Please shorten it (max {}).",
                    len, config.code128_max_payload_len
                ),
            ));
        }
        Ok(())
    }

    /// Physical bounds imposed by the label UI, when configured.
    pub fn check_range(job: &Job, config: &RenderConfig) -> Result<()> {
        let Some(range) = config.code128_range else {
            return Ok(());
        };
        let width_mm = units::convert(job.size.width, job.size.unit, Unit::Mm);
        let height_mm = units::convert(job.size.height, job.size.unit, Unit::Mm);
        // Tolerance absorbs in->mm float noise at the range edges
        let eps = 1e-9;

        if width_mm < range.min_width_mm - eps || width_mm > range.max_width_mm + eps {
            return Err(LabelError::invalid(
                ErrorCode::Range,
                format!(
                    "Code128 width must be between {} and {} mm (received {} mm).",
                    range.min_width_mm,
                    range.max_width_mm,
                    trim_decimals(width_mm, 2)
                ),
            ));
        }
        if height_mm < range.min_height_mm - eps || height_mm > range.max_height_mm + eps {
            return Err(LabelError::invalid(
                ErrorCode::Range,
                format!(
                    "Code128 height must be between {} and {} mm (received {} mm).",
                    range.min_height_mm,
                    range.max_height_mm,
                    trim_decimals(height_mm, 2)
                ),
            ));
        }
        Ok(())
    }

    pub fn derive(geo: &JobGeometry, base_width: u32, config: &RenderConfig) -> Result<Self> {
        let min_h = config.code128_min_inner_height_px;
        if geo.inner_height < min_h {
            return Err(LabelError::density(
                ErrorCode::TooSmall,
                format!(
                    "Barcode height too small: {}px inner (suggest >= {}px). \
                     Increase height or DPI, or reduce margin.",
                    geo.inner_height, min_h
                ),
            ));
        }

        if base_width == 0 {
            return Err(LabelError::encoding(
                Symbology::Code128,
                "could not determine base width from bar geometry",
            ));
        }

        let scale = geo.inner_width / base_width;
        let min = config.code128_min_bar_px;
        if scale < min {
            let required_inner = base_width.saturating_mul(min);
            return Err(LabelError::density(
                ErrorCode::TooDense,
                format!(
                    "Barcode too dense for reliable scanning: {}px/module achieved, need about {}px inner width \
                     (min {}px per bar/module) but only {}px available. At {} DPI, try width >= {} \
                     including margin, or reduce payload length.",
                    scale,
                    required_inner,
                    min,
                    geo.inner_width,
                    geo.dpi,
                    geo.suggest(required_inner.saturating_add(2 * geo.margin_px))
                ),
            ));
        }

        let draw_width = base_width * scale;
        let plan = Self {
            base_width,
            scale,
            draw_width,
            offset_x: (geo.inner_width - draw_width) / 2,
        };
        debug!(?plan, "Code128 plan");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::PhysicalSize;

    fn job(symbology: Symbology, unit: Unit, w: f64, h: f64, dpi: u32, margin: f64) -> Job {
        Job::new(symbology, "PAYLOAD", PhysicalSize { unit, width: w, height: h, dpi }, margin)
    }

    #[test]
    fn test_geometry_inner_area() {
        let geo = JobGeometry::resolve(&job(Symbology::Qr, Unit::In, 2.0, 1.0, 300, 0.04)).unwrap();
        assert_eq!(geo.pixel.pixel_width, 600);
        assert_eq!(geo.margin_px, 12);
        assert_eq!((geo.inner_width, geo.inner_height), (576, 276));
        assert_eq!(geo.inner_side(), 276);
    }

    #[test]
    fn test_geometry_rejects_bad_shape() {
        let mut j = job(Symbology::Qr, Unit::In, 1.0, 1.0, 300, 0.1);
        j.payload = "   ".into();
        assert_eq!(JobGeometry::resolve(&j).unwrap_err().code(), ErrorCode::Payload);

        let j = job(Symbology::Qr, Unit::In, 1.0, 1.0, 0, 0.1);
        assert_eq!(JobGeometry::resolve(&j).unwrap_err().code(), ErrorCode::Dpi);

        let j = job(Symbology::Qr, Unit::In, f64::NAN, 1.0, 300, 0.1);
        assert_eq!(JobGeometry::resolve(&j).unwrap_err().code(), ErrorCode::Size);

        let j = job(Symbology::Qr, Unit::In, 1.0, 1.0, 300, -0.1);
        assert_eq!(JobGeometry::resolve(&j).unwrap_err().code(), ErrorCode::Margin);

        let j = job(Symbology::Qr, Unit::In, 3.0, 1.0, 300, 0.6);
        assert_eq!(JobGeometry::resolve(&j).unwrap_err().code(), ErrorCode::Margin);
    }

    #[test]
    fn test_margin_of_exactly_half_leaves_no_inner_area() {
        let j = job(Symbology::Qr, Unit::In, 1.0, 1.0, 300, 0.5);
        let err = JobGeometry::resolve(&j).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Inner);
        assert!(err.to_string().contains("150px margin"));
    }

    #[test]
    fn test_qr_plan_centers_symbol() {
        let geo = JobGeometry::resolve(&job(Symbology::Qr, Unit::In, 1.0, 1.0, 600, 0.04)).unwrap();
        assert_eq!(geo.inner_side(), 552);
        let plan = QrPlan::derive(&geo, 21, &RenderConfig::default()).unwrap();
        assert_eq!(plan.scale, 26);
        assert_eq!(plan.symbol_px, 546);
        assert_eq!((plan.offset_x, plan.offset_y), (3, 3));
    }

    #[test]
    fn test_qr_plan_density_message() {
        let geo = JobGeometry::resolve(&job(Symbology::Qr, Unit::In, 0.2, 0.2, 203, 0.01)).unwrap();
        let err = QrPlan::derive(&geo, 29, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooDense);
        let msg = err.to_string();
        assert!(msg.contains("QR too small"));
        assert!(msg.contains("px/module"));
        assert!(msg.contains("116px code area"));
        assert!(msg.contains("in (~"));
    }

    #[test]
    fn test_suggest_uses_job_unit_first() {
        let j = job(Symbology::Qr, Unit::Mm, 25.4, 25.4, 300, 0.0);
        let geo = JobGeometry::resolve(&j).unwrap();
        assert_eq!(geo.suggest(300), "25.4mm (~1in)");
    }

    #[test]
    fn test_datamatrix_plan() {
        let j = job(Symbology::Datamatrix, Unit::In, 2.0, 1.0, 300, 0.0);
        let geo = JobGeometry::resolve(&j).unwrap();
        let plan = DataMatrixPlan::derive(&geo, 12, &RenderConfig::default()).unwrap();
        assert_eq!(plan.scale, 25);
        assert_eq!(plan.side_px, 300);

        let j = job(Symbology::Datamatrix, Unit::In, 0.03, 0.03, 203, 0.0);
        let tiny = JobGeometry::resolve(&j).unwrap();
        let err = DataMatrixPlan::derive(&tiny, 10, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooSmall);
        assert!(err.to_string().contains("0px/module achieved (min 1px/module)"));
    }

    #[test]
    fn test_code128_plan() {
        let j = job(Symbology::Code128, Unit::In, 3.0, 1.0, 300, 0.1);
        let geo = JobGeometry::resolve(&j).unwrap();
        let plan = Code128Plan::derive(&geo, 156, &RenderConfig::default()).unwrap();
        assert_eq!(plan.scale, 5);
        assert_eq!(plan.draw_width, 780);
        assert_eq!(plan.offset_x, 30);
    }

    #[test]
    fn test_code128_height_checked_before_density() {
        let j = job(Symbology::Code128, Unit::In, 0.03, 0.03, 300, 0.0);
        let geo = JobGeometry::resolve(&j).unwrap();
        let err = Code128Plan::derive(&geo, 500, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooSmall);
        assert!(err.to_string().contains("height too small"));
    }

    #[test]
    fn test_code128_too_dense() {
        let j = job(Symbology::Code128, Unit::In, 1.0, 0.3, 203, 0.0);
        let geo = JobGeometry::resolve(&j).unwrap();
        let err = Code128Plan::derive(&geo, 156, &RenderConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TooDense);
        assert!(err.to_string().to_lowercase().contains("too dense"));
    }

    #[test]
    fn test_code128_range_only_when_configured() {
        let j = job(Symbology::Code128, Unit::Mm, 60.0, 8.0, 300, 1.0);
        assert!(Code128Plan::check_range(&j, &RenderConfig::default()).is_ok());
        let err = Code128Plan::check_range(&j, &RenderConfig::label_ui()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Range);

        let ok = job(Symbology::Code128, Unit::Mm, 20.0, 3.0, 300, 0.5);
        assert!(Code128Plan::check_range(&ok, &RenderConfig::label_ui()).is_ok());
    }

    #[test]
    fn test_huge_minimums_report_instead_of_overflowing() {
        let config = RenderConfig {
            qr_min_module_px: u32::MAX / 2,
            datamatrix_min_module_px: u32::MAX / 2,
            code128_min_bar_px: u32::MAX / 2,
            ..RenderConfig::default()
        };
        let geo = JobGeometry::resolve(&job(Symbology::Qr, Unit::In, 1.0, 1.0, 300, 0.1)).unwrap();
        assert_eq!(QrPlan::derive(&geo, 21, &config).unwrap_err().code(), ErrorCode::TooDense);
        let dm = DataMatrixPlan::derive(&geo, 12, &config).unwrap_err();
        assert_eq!(dm.code(), ErrorCode::TooSmall);
        let c128 = Code128Plan::derive(&geo, 156, &config).unwrap_err();
        assert_eq!(c128.code(), ErrorCode::TooDense);
    }

    #[test]
    fn test_code128_payload_length() {
        let config = RenderConfig::default();
        assert!(Code128Plan::check_payload(&"A".repeat(256), &config).is_ok());
        let err = Code128Plan::check_payload(&"A".repeat(257), &config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Payload);
    }
}
