//! Render configuration - named thresholds passed explicitly into every calculator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LabelError, Result};
use crate::job::{Job, Margin, PhysicalSize, Symbology, Unit};
use crate::units::mm_to_in;

/// Recommended default DPI for crisp label work.
pub const DEFAULT_DPI: u32 = 600;

/// Common label printer DPIs plus one design-friendly high DPI.
pub const DPI_PRESETS: [u32; 3] = [203, 300, 600];

pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 2400;

/// Longest outer side a caller may request: 10 in at `MAX_DPI`.
pub const MAX_PIXEL_SIDE: u32 = 24_000;

/// Default quiet zone: 1 mm, expressed in the job unit when building defaults.
pub const DEFAULT_MARGIN_MM: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Pick a surface from runtime capability detection.
    #[default]
    Auto,
    /// Module bitmap straight from the encoder.
    Direct,
    /// Encode to PNG then decode, as an image-buffer environment would.
    Png,
}

/// Physical bounds the label UI imposes on a symbology, in millimeters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalRange {
    pub min_width_mm: f64,
    pub max_width_mm: f64,
    pub min_height_mm: f64,
    pub max_height_mm: f64,
}

pub const CODE128_UI_RANGE: PhysicalRange = PhysicalRange {
    min_width_mm: 20.0,
    max_width_mm: 50.0,
    min_height_mm: 3.0,
    max_height_mm: 10.0,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    #[serde(default = "default_qr_min_module_px")]
    pub qr_min_module_px: u32,
    #[serde(default = "default_datamatrix_min_module_px")]
    pub datamatrix_min_module_px: u32,
    #[serde(default = "default_code128_min_bar_px")]
    pub code128_min_bar_px: u32,
    #[serde(default = "default_code128_min_inner_height_px")]
    pub code128_min_inner_height_px: u32,
    #[serde(default = "default_code128_max_payload_len")]
    pub code128_max_payload_len: usize,
    #[serde(default)]
    pub code128_range: Option<PhysicalRange>,
    /// Mean-of-RGB cut between black and white.
    #[serde(default = "default_mono_threshold")]
    pub mono_threshold: u8,
    #[serde(default)]
    pub surface: SurfaceKind,
}

fn default_qr_min_module_px() -> u32 {
    4
}

fn default_datamatrix_min_module_px() -> u32 {
    1
}

fn default_code128_min_bar_px() -> u32 {
    2
}

fn default_code128_min_inner_height_px() -> u32 {
    24
}

fn default_code128_max_payload_len() -> usize {
    256
}

fn default_mono_threshold() -> u8 {
    128
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            qr_min_module_px: default_qr_min_module_px(),
            datamatrix_min_module_px: default_datamatrix_min_module_px(),
            code128_min_bar_px: default_code128_min_bar_px(),
            code128_min_inner_height_px: default_code128_min_inner_height_px(),
            code128_max_payload_len: default_code128_max_payload_len(),
            code128_range: None,
            mono_threshold: default_mono_threshold(),
            surface: SurfaceKind::Auto,
        }
    }
}

impl RenderConfig {
    /// Defaults plus the physical ranges the label UI enforces.
    pub fn label_ui() -> Self {
        Self {
            code128_range: Some(CODE128_UI_RANGE),
            ..Self::default()
        }
    }

    /// Every minimum at least 1, threshold in 1..=255, a non-empty payload
    /// limit and an ordered, finite Code128 range.
    pub fn validate(&self) -> Result<()> {
        let minimums = [
            ("qrMinModulePx", self.qr_min_module_px),
            ("datamatrixMinModulePx", self.datamatrix_min_module_px),
            ("code128MinBarPx", self.code128_min_bar_px),
            ("code128MinInnerHeightPx", self.code128_min_inner_height_px),
        ];
        for (name, value) in minimums {
            if value == 0 {
                return Err(LabelError::Config(format!("{} must be >= 1 (received 0)", name)));
            }
        }
        if self.mono_threshold == 0 {
            return Err(LabelError::Config(
                "monoThreshold must be between 1 and 255 (received 0)".into(),
            ));
        }
        if self.code128_max_payload_len == 0 {
            return Err(LabelError::Config("code128MaxPayloadLen must be >= 1 (received 0)".into()));
        }
        if let Some(range) = &self.code128_range {
            let bounds = [
                range.min_width_mm,
                range.max_width_mm,
                range.min_height_mm,
                range.max_height_mm,
            ];
            if bounds.iter().any(|v| !v.is_finite() || *v < 0.0)
                || range.min_width_mm > range.max_width_mm
                || range.min_height_mm > range.max_height_mm
            {
                return Err(LabelError::Config(format!(
                    "code128Range must be finite, non-negative and min <= max (received {:?})",
                    range
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// Starting job for a symbology; payload is intentionally left empty.
pub fn default_job(symbology: Symbology) -> Job {
    let size = match symbology {
        Symbology::Code128 => (Unit::Mm, 40.0, 8.0),
        Symbology::Datamatrix => (Unit::Mm, 10.0, 10.0),
        Symbology::Qr => (Unit::In, 1.0, 1.0),
    };
    let size = PhysicalSize { unit: size.0, width: size.1, height: size.2, dpi: DEFAULT_DPI };
    let margin = match size.unit {
        Unit::Mm => DEFAULT_MARGIN_MM,
        Unit::In => mm_to_in(DEFAULT_MARGIN_MM),
    };
    Job {
        symbology,
        payload: String::new(),
        size,
        margin: Margin { value: margin },
        invert: false,
    }
}
