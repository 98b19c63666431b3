//! Print Profile - where a job's DPI comes from
//!
//! Caller-supplied DPI bounds the raster allocation, so it is checked here
//! before any job reaches the renderers.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DPI, DPI_PRESETS, MAX_DPI, MAX_PIXEL_SIDE, MIN_DPI};
use crate::error::{ErrorCode, LabelError};
use crate::job::Job;
use crate::units::compute_pixel_size;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintAuthority {
    /// Built-in defaults
    #[default]
    System,
    /// One of the printer presets
    Preset,
    /// User-provided (bounds-checked)
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintProfile {
    pub authority: PrintAuthority,
    pub dpi: u32,
}

impl Default for PrintProfile {
    fn default() -> Self {
        Self {
            authority: PrintAuthority::System,
            dpi: DEFAULT_DPI,
        }
    }
}

impl PrintProfile {
    /// 203 / 300 / 600 dpi label printers.
    pub fn presets() -> Vec<Self> {
        DPI_PRESETS
            .iter()
            .map(|&dpi| Self { authority: PrintAuthority::Preset, dpi })
            .collect()
    }

    pub fn from_user(dpi: u32) -> Result<Self, LabelError> {
        if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
            return Err(LabelError::invalid(
                ErrorCode::Dpi,
                format!("DPI must be between {} and {} (received {}).", MIN_DPI, MAX_DPI, dpi),
            ));
        }
        let authority = if DPI_PRESETS.contains(&dpi) {
            PrintAuthority::Preset
        } else {
            PrintAuthority::User
        };
        Ok(Self { authority, dpi })
    }

    /// DPI bounds plus an outer pixel size the raster allocation can honor.
    pub fn for_job(job: &Job) -> Result<Self, LabelError> {
        let profile = Self::from_user(job.size.dpi)?;
        let pixel = compute_pixel_size(&job.size)?;
        if pixel.pixel_width > MAX_PIXEL_SIDE || pixel.pixel_height > MAX_PIXEL_SIDE {
            return Err(LabelError::invalid(
                ErrorCode::Size,
                format!(
                    "Output of {}x{}px exceeds the {}px per side limit.",
                    pixel.pixel_width, pixel.pixel_height, MAX_PIXEL_SIDE
                ),
            ));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{PhysicalSize, Symbology, Unit};

    fn job(width: f64, height: f64, dpi: u32) -> Job {
        Job::new(Symbology::Qr, "HELLO", PhysicalSize { unit: Unit::In, width, height, dpi }, 0.0)
    }

    #[test]
    fn test_default_is_system_600() {
        let p = PrintProfile::default();
        assert_eq!(p.authority, PrintAuthority::System);
        assert_eq!(p.dpi, 600);
    }

    #[test]
    fn test_presets() {
        let dpis: Vec<u32> = PrintProfile::presets().iter().map(|p| p.dpi).collect();
        assert_eq!(dpis, vec![203, 300, 600]);
    }

    #[test]
    fn test_user_bounds() {
        assert_eq!(PrintProfile::from_user(300).unwrap().authority, PrintAuthority::Preset);
        assert_eq!(PrintProfile::from_user(1200).unwrap().authority, PrintAuthority::User);
        assert!(PrintProfile::from_user(72).is_ok());
        assert!(PrintProfile::from_user(2400).is_ok());

        let err = PrintProfile::from_user(71).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Dpi);
        assert!(PrintProfile::from_user(2401).is_err());
    }

    #[test]
    fn test_job_size_bound() {
        assert!(PrintProfile::for_job(&job(10.0, 1.0, 2400)).is_ok());

        let err = PrintProfile::for_job(&job(1.0e6, 1.0, 600)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Size);
        assert!(err.to_string().contains("24000px"));

        assert_eq!(PrintProfile::for_job(&job(1.0, 1.0, 10)).unwrap_err().code(), ErrorCode::Dpi);
    }
}
