//! Job model - the immutable input to the pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorCode, LabelError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    Qr,
    Datamatrix,
    Code128,
}

impl Symbology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Datamatrix => "datamatrix",
            Self::Code128 => "code128",
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    In,
    Mm,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Mm => "mm",
        }
    }

    /// The other supported unit, used for dual-unit size suggestions.
    pub fn complement(&self) -> Self {
        match self {
            Self::In => Self::Mm,
            Self::Mm => Self::In,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhysicalSize {
    pub unit: Unit,
    pub width: f64,
    pub height: f64,
    pub dpi: u32,
}

/// Quiet zone around the symbol, in the same unit as `PhysicalSize::unit`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Margin {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub symbology: Symbology,
    pub payload: String,
    pub size: PhysicalSize,
    #[serde(default)]
    pub margin: Margin,
    #[serde(default, alias = "invertOutput")]
    pub invert: bool,
}

impl Job {
    pub fn new(
        symbology: Symbology,
        payload: impl Into<String>,
        size: PhysicalSize,
        margin: f64,
    ) -> Self {
        Self {
            symbology,
            payload: payload.into(),
            size,
            margin: Margin { value: margin },
            invert: false,
        }
    }

    pub fn inverted(self) -> Self {
        Self { invert: true, ..self }
    }

    /// Parse bridge JSON. Shape defects carry the same codes the validators use.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        check_shape(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "nothing".to_string(), Value::to_string)
}

fn check_shape(job: &Value) -> Result<()> {
    let symbology = job.get("symbology");
    if !matches!(symbology.and_then(Value::as_str), Some("qr" | "datamatrix" | "code128")) {
        return Err(LabelError::invalid(
            ErrorCode::Symbology,
            format!(
                "Symbology must be one of qr, datamatrix, code128 (received {}).",
                describe(symbology)
            ),
        ));
    }
    if !job.get("payload").is_some_and(Value::is_string) {
        return Err(LabelError::invalid(ErrorCode::Payload, "Payload must be a non-empty string."));
    }

    let size = job.get("size");
    let field = |name: &str| size.and_then(|s| s.get(name));

    let unit = field("unit");
    if !matches!(unit.and_then(Value::as_str), Some("in" | "mm")) {
        return Err(LabelError::invalid(
            ErrorCode::Unit,
            format!("Unit must be 'in' or 'mm' (received {}).", describe(unit)),
        ));
    }

    let dpi = field("dpi").and_then(Value::as_u64);
    if !dpi.is_some_and(|d| d > 0 && d <= u32::MAX as u64) {
        return Err(LabelError::invalid(
            ErrorCode::Dpi,
            format!("DPI must be an integer greater than 0 (received {}).", describe(field("dpi"))),
        ));
    }

    for name in ["width", "height"] {
        if field(name).and_then(Value::as_f64).is_none() {
            return Err(LabelError::invalid(
                ErrorCode::Size,
                format!("Size {} must be a number (received {}).", name, describe(field(name))),
            ));
        }
    }

    if let Some(margin) = job.get("margin") {
        if margin.get("value").and_then(Value::as_f64).is_none() {
            return Err(LabelError::invalid(
                ErrorCode::Margin,
                format!("Margin value must be a number (received {}).", margin),
            ));
        }
    }
    Ok(())
}
