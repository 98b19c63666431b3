//! Pre-flight validation - rules over the shared sizing calculators
//!
//! Rules produce the first failure in order; the validator reports it.
//! Each rule calls the same `sizing` / `prepare` functions the renderer uses,
//! so a job fails validation exactly when rendering would fail.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{ErrorCode, LabelError};
use crate::job::{Job, Symbology};
use crate::sizing::{check_symbology, Code128Plan, JobGeometry};
use crate::symbology::surface::{DirectSurface, SymbolSurface};
use crate::symbology::{code128, datamatrix, qr};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(ValidationError { code, message: message.into() }),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

impl From<&LabelError> for ValidationResult {
    fn from(err: &LabelError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Validation rule trait - one check, first failure wins
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, job: &Job, config: &RenderConfig) -> Result<(), LabelError>;
}

// --- Concrete Rules ---

pub struct SymbologyRule(pub Symbology);

impl ValidationRule for SymbologyRule {
    fn name(&self) -> &'static str {
        "symbology"
    }

    fn check(&self, job: &Job, _config: &RenderConfig) -> Result<(), LabelError> {
        check_symbology(job, self.0)
    }
}

/// Payload, dpi, size, margin and inner-area sanity.
pub struct JobShapeRule;

impl ValidationRule for JobShapeRule {
    fn name(&self) -> &'static str {
        "job_shape"
    }

    fn check(&self, job: &Job, _config: &RenderConfig) -> Result<(), LabelError> {
        JobGeometry::resolve(job).map(|_| ())
    }
}

pub struct PhysicalRangeRule;

impl ValidationRule for PhysicalRangeRule {
    fn name(&self) -> &'static str {
        "physical_range"
    }

    fn check(&self, job: &Job, config: &RenderConfig) -> Result<(), LabelError> {
        Code128Plan::check_range(job, config)
    }
}

pub struct QrDensityRule;

impl ValidationRule for QrDensityRule {
    fn name(&self) -> &'static str {
        "qr_density"
    }

    fn check(&self, job: &Job, config: &RenderConfig) -> Result<(), LabelError> {
        let geo = JobGeometry::resolve(job)?;
        qr::prepare(job, &geo, config).map(|_| ())
    }
}

pub struct DataMatrixDensityRule {
    surface: Arc<dyn SymbolSurface>,
}

impl ValidationRule for DataMatrixDensityRule {
    fn name(&self) -> &'static str {
        "datamatrix_density"
    }

    fn check(&self, job: &Job, config: &RenderConfig) -> Result<(), LabelError> {
        let geo = JobGeometry::resolve(job)?;
        datamatrix::prepare(job, &geo, config, self.surface.as_ref()).map(|_| ())
    }
}

pub struct Code128DensityRule;

impl ValidationRule for Code128DensityRule {
    fn name(&self) -> &'static str {
        "code128_density"
    }

    fn check(&self, job: &Job, config: &RenderConfig) -> Result<(), LabelError> {
        let geo = JobGeometry::resolve(job)?;
        code128::prepare(job, &geo, config).map(|_| ())
    }
}

/// Ordered rules for one symbology
pub struct Validator {
    symbology: Symbology,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Rules run in the same order the renderer performs its checks.
    pub fn for_symbology(symbology: Symbology, surface: Arc<dyn SymbolSurface>) -> Self {
        let mut rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(SymbologyRule(symbology)),
            Box::new(JobShapeRule),
        ];
        match symbology {
            Symbology::Qr => rules.push(Box::new(QrDensityRule)),
            Symbology::Datamatrix => rules.push(Box::new(DataMatrixDensityRule { surface })),
            Symbology::Code128 => {
                rules.push(Box::new(PhysicalRangeRule));
                rules.push(Box::new(Code128DensityRule));
            }
        }
        Self { symbology, rules }
    }

    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    pub fn validate(&self, job: &Job, config: &RenderConfig) -> ValidationResult {
        for rule in &self.rules {
            if let Err(err) = rule.check(job, config) {
                debug!(rule = rule.name(), code = %err.code(), "Validation failed");
                return ValidationResult::from(&err);
            }
        }
        ValidationResult::success()
    }
}

pub fn validate_qr_job(job: &Job, config: &RenderConfig) -> ValidationResult {
    Validator::for_symbology(Symbology::Qr, Arc::new(DirectSurface)).validate(job, config)
}

pub fn validate_datamatrix_job(job: &Job, config: &RenderConfig) -> ValidationResult {
    Validator::for_symbology(Symbology::Datamatrix, Arc::new(DirectSurface)).validate(job, config)
}

pub fn validate_code128_job(job: &Job, config: &RenderConfig) -> ValidationResult {
    Validator::for_symbology(Symbology::Code128, Arc::new(DirectSurface)).validate(job, config)
}

/// Dispatch on the job's own symbology.
pub fn validate_job(job: &Job, config: &RenderConfig) -> ValidationResult {
    match job.symbology {
        Symbology::Qr => validate_qr_job(job, config),
        Symbology::Datamatrix => validate_datamatrix_job(job, config),
        Symbology::Code128 => validate_code128_job(job, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{PhysicalSize, Unit};

    fn job(
        symbology: Symbology,
        payload: &str,
        width: f64,
        height: f64,
        dpi: u32,
        margin: f64,
    ) -> Job {
        let size = PhysicalSize { unit: Unit::In, width, height, dpi };
        Job::new(symbology, payload, size, margin)
    }

    #[test]
    fn test_serialized_shape() {
        let ok = serde_json::to_string(&ValidationResult::success()).unwrap();
        assert_eq!(ok, r#"{"ok":true}"#);

        let failed =
            serde_json::to_value(ValidationResult::failure(ErrorCode::Margin, "m")).unwrap();
        assert_eq!(failed["ok"], false);
        assert_eq!(failed["error"]["code"], "margin");
    }

    #[test]
    fn test_qr_accepts_valid_job() {
        let j = job(Symbology::Qr, "HELLO", 1.0, 1.0, 600, 0.04);
        let r = validate_qr_job(&j, &RenderConfig::default());
        assert!(r.ok);
    }

    #[test]
    fn test_qr_rejects_wrong_symbology() {
        let j = job(Symbology::Datamatrix, "HELLO", 1.0, 1.0, 600, 0.04);
        let r = validate_qr_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::Symbology));
    }

    #[test]
    fn test_qr_too_dense() {
        let payload = "TOO_SMALL_PAYLOAD_DENSITY_TEST_1234567890";
        let j = job(Symbology::Qr, payload, 0.2, 0.2, 203, 0.01);
        let r = validate_qr_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::TooDense));
        assert!(r.error.unwrap().message.contains("px/module"));
    }

    #[test]
    fn test_qr_margin_too_large_for_dpi() {
        // legal physically, but 0.499 in at 72 dpi rounds to 36 px on a 72 px side
        let j = job(Symbology::Qr, "HELLO", 1.0, 1.0, 72, 0.499);
        let r = validate_qr_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::Inner));
    }

    #[test]
    fn test_datamatrix_accepts_valid_job() {
        let r = validate_datamatrix_job(
            &job(Symbology::Datamatrix, "HELLO WORLD", 1.0, 1.0, 300, 0.1),
            &RenderConfig::default(),
        );
        assert!(r.ok);
    }

    #[test]
    fn test_datamatrix_rejects_empty_payload() {
        let j = job(Symbology::Datamatrix, "   ", 1.0, 1.0, 300, 0.1);
        let r = validate_datamatrix_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::Payload));
    }

    #[test]
    fn test_datamatrix_rejects_negative_margin() {
        let j = job(Symbology::Datamatrix, "ABC", 1.0, 1.0, 300, -1.0);
        let r = validate_datamatrix_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::Margin));
    }

    #[test]
    fn test_datamatrix_too_small() {
        let r = validate_datamatrix_job(
            &job(Symbology::Datamatrix, "HELLO WORLD", 0.03, 0.03, 203, 0.0),
            &RenderConfig::default(),
        );
        assert_eq!(r.code(), Some(ErrorCode::TooSmall));
    }

    #[test]
    fn test_code128_rules() {
        let config = RenderConfig::default();
        let base = job(Symbology::Code128, "1234567890", 3.0, 1.0, 300, 0.1);
        assert!(validate_code128_job(&base, &config).ok);

        let empty = Job { payload: "   ".into(), ..base.clone() };
        assert_eq!(validate_code128_job(&empty, &config).code(), Some(ErrorCode::Payload));

        let no_dpi = Job { size: PhysicalSize { dpi: 0, ..base.size }, ..base.clone() };
        assert_eq!(validate_code128_job(&no_dpi, &config).code(), Some(ErrorCode::Dpi));

        let big_margin = Job::new(Symbology::Code128, "1234567890", base.size, 2.0);
        assert_eq!(validate_code128_job(&big_margin, &config).code(), Some(ErrorCode::Margin));
    }

    #[test]
    fn test_code128_too_dense() {
        let j = job(Symbology::Code128, "ABC-123-XYZ", 1.0, 0.3, 203, 0.0);
        let r = validate_code128_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::TooDense));
        assert!(r.error.unwrap().message.to_lowercase().contains("too dense"));
    }

    #[test]
    fn test_code128_tiny_canvas_height_too_small() {
        let j = job(Symbology::Code128, &"LONG-PAYLOAD-".repeat(8), 0.03, 0.03, 300, 0.0);
        let r = validate_code128_job(&j, &RenderConfig::default());
        assert_eq!(r.code(), Some(ErrorCode::TooSmall));
        assert!(r.error.unwrap().message.contains("height too small"));
    }

    #[test]
    fn test_code128_range_in_ui_config() {
        let j = Job::new(
            Symbology::Code128,
            "ABC-123",
            PhysicalSize { unit: Unit::Mm, width: 80.0, height: 8.0, dpi: 300 },
            1.0,
        );
        assert!(validate_code128_job(&j, &RenderConfig::default()).ok);
        assert_eq!(
            validate_code128_job(&j, &RenderConfig::label_ui()).code(),
            Some(ErrorCode::Range)
        );
    }

    #[test]
    fn test_dispatch() {
        let j = job(Symbology::Datamatrix, "ABC123", 1.0, 1.0, 300, 0.0);
        assert!(validate_job(&j, &RenderConfig::default()).ok);
    }
}
