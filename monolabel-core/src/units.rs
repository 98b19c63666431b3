//! Unit conversion and pixel math
//!
//! Rounding rule: `f64::round` (half away from zero), applied identically by
//! every renderer, validator and the compositor.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, LabelError, Result};
use crate::job::{PhysicalSize, Unit};

pub const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelGeometry {
    pub pixel_width: u32,
    pub pixel_height: u32,
}

pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

pub fn in_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

/// Express `value` (in `from`) in `to`.
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    match (from, to) {
        (Unit::In, Unit::Mm) => in_to_mm(value),
        (Unit::Mm, Unit::In) => mm_to_in(value),
        _ => value,
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(LabelError::invalid(
            ErrorCode::Size,
            format!("{} must be a finite number (received: {})", name, value),
        ));
    }
    if value <= 0.0 {
        return Err(LabelError::invalid(
            ErrorCode::Size,
            format!("{} must be > 0 (received: {})", name, value),
        ));
    }
    Ok(())
}

fn check_dpi(dpi: u32) -> Result<()> {
    if dpi == 0 {
        return Err(LabelError::invalid(ErrorCode::Dpi, "dpi must be an integer > 0 (received: 0)"));
    }
    Ok(())
}

/// Convert a physical length to whole pixels at `dpi`.
pub fn to_pixels(value: f64, unit: Unit, dpi: u32) -> Result<u32> {
    check_positive("value", value)?;
    check_dpi(dpi)?;

    let inches = match unit {
        Unit::In => value,
        Unit::Mm => mm_to_in(value),
    };
    let px = (inches * dpi as f64).round();
    if px > u32::MAX as f64 {
        return Err(LabelError::invalid(
            ErrorCode::Size,
            format!("{} {} at {} DPI exceeds the addressable pixel range", value, unit, dpi),
        ));
    }
    Ok(px as u32)
}

/// Margin-to-pixels; a zero margin is 0 px without going through `to_pixels`.
pub fn margin_to_pixels(value: f64, unit: Unit, dpi: u32) -> Result<u32> {
    if value == 0.0 {
        check_dpi(dpi)?;
        return Ok(0);
    }
    to_pixels(value, unit, dpi)
}

/// Width and height are rounded independently.
pub fn compute_pixel_size(size: &PhysicalSize) -> Result<PixelGeometry> {
    check_positive("width", size.width)?;
    check_positive("height", size.height)?;
    check_dpi(size.dpi)?;

    Ok(PixelGeometry {
        pixel_width: to_pixels(size.width, size.unit, size.dpi)?,
        pixel_height: to_pixels(size.height, size.unit, size.dpi)?,
    })
}

/// Physical length covered by `px` pixels at `dpi`.
pub fn px_to_physical(px: u32, unit: Unit, dpi: u32) -> f64 {
    let inches = px as f64 / dpi.max(1) as f64;
    convert(inches, Unit::In, unit)
}

pub fn trim_decimals(value: f64, precision: usize) -> String {
    let s = format!("{:.*}", precision, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

pub fn format_size(size: &PhysicalSize, precision: usize) -> String {
    format!(
        "{} × {} {}",
        trim_decimals(size.width, precision),
        trim_decimals(size.height, precision),
        size.unit
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(unit: Unit, width: f64, height: f64, dpi: u32) -> PhysicalSize {
        PhysicalSize { unit, width, height, dpi }
    }

    #[test]
    fn test_mm_inch_round_trip() {
        assert!((mm_to_in(25.4) - 1.0).abs() < 1e-10);
        assert!((in_to_mm(2.0) - 50.8).abs() < 1e-10);
    }

    #[test]
    fn test_one_inch_at_600_dpi() {
        assert_eq!(to_pixels(1.0, Unit::In, 600).unwrap(), 600);
        let geo = compute_pixel_size(&size(Unit::In, 1.0, 1.0, 600)).unwrap();
        assert_eq!(geo, PixelGeometry { pixel_width: 600, pixel_height: 600 });
    }

    #[test]
    fn test_millimeters_at_300_dpi() {
        assert_eq!(to_pixels(25.4, Unit::Mm, 300).unwrap(), 300);
        let geo = compute_pixel_size(&size(Unit::Mm, 25.4, 25.4, 300)).unwrap();
        assert_eq!(geo.pixel_width, 300);
        assert_eq!(geo.pixel_height, 300);
    }

    #[test]
    fn test_rectangular_at_203_dpi() {
        let geo = compute_pixel_size(&size(Unit::In, 2.0, 1.0, 203)).unwrap();
        assert_eq!(geo, PixelGeometry { pixel_width: 406, pixel_height: 203 });
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        // 0.5 in at 1 dpi sits exactly on the tie
        assert_eq!(to_pixels(0.5, Unit::In, 1).unwrap(), 1);
        assert_eq!(to_pixels(2.5, Unit::In, 1).unwrap(), 3);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(to_pixels(1.0, Unit::In, 0).is_err());
        assert!(to_pixels(0.0, Unit::In, 300).is_err());
        assert!(to_pixels(-1.0, Unit::Mm, 300).is_err());
        assert!(compute_pixel_size(&size(Unit::Mm, f64::NAN, 10.0, 300)).is_err());
        assert!(compute_pixel_size(&size(Unit::Mm, 10.0, f64::INFINITY, 300)).is_err());
    }

    #[test]
    fn test_zero_margin_is_zero_pixels() {
        assert_eq!(margin_to_pixels(0.0, Unit::Mm, 300).unwrap(), 0);
        assert_eq!(margin_to_pixels(0.1, Unit::In, 300).unwrap(), 30);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(&size(Unit::In, 1.0, 0.5, 300), 3), "1 × 0.5 in");
        assert_eq!(trim_decimals(2.0, 3), "2");
        assert_eq!(trim_decimals(0.1234, 2), "0.12");
    }
}
