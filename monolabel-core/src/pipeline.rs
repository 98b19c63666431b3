//! Label Pipeline - Single Entry Point
//!
//! render -> (center) -> compose -> encode. Every failure surfaces as a
//! `LabelError`; a failed call never returns image bytes.

use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::compositor;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::hashing::{compute_job_hash, compute_manifest_hash, sha256_hex};
use crate::job::{Job, Symbology};
use crate::raster::RasterBuffer;
use crate::sizing::JobGeometry;
use crate::symbology::{renderer_for, select_surface, SymbolSurface};
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

/// Manifest for one exported label. Only `id`, `created_at` and the
/// `manifest_hash` covering them vary between runs of the same job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLabel {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub symbology: Symbology,
    pub manifest_hash: String,
    pub job_hash: String,
    pub image_sha256: String,
    pub format: ExportFormat,
    pub mime_type: String,
    pub size: [u32; 2],
    pub data_base64: String,
}

pub struct LabelPipeline {
    config: RenderConfig,
    surface: Arc<dyn SymbolSurface>,
}

impl LabelPipeline {
    /// Rejects a config whose thresholds would let a blank or broken label through.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let surface = select_surface(config.surface);
        Ok(Self { config, surface })
    }

    pub fn with_surface(config: RenderConfig, surface: Arc<dyn SymbolSurface>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, surface })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Pre-flight check using the same surface the renderer will use.
    pub fn validate(&self, job: &Job) -> ValidationResult {
        Validator::for_symbology(job.symbology, self.surface.clone()).validate(job, &self.config)
    }

    /// Code-only raster as the symbology renderer produces it.
    pub fn render_code(&self, job: &Job) -> Result<RasterBuffer> {
        renderer_for(job.symbology, self.surface.clone()).render(job, &self.config)
    }

    /// Code raster sized to the inner area. Data Matrix squares are centered.
    pub fn inner_raster(&self, job: &Job) -> Result<RasterBuffer> {
        let code = self.render_code(job)?;
        match job.symbology {
            Symbology::Datamatrix => {
                let geo = JobGeometry::resolve(job)?;
                code.centered_in(geo.inner_width, geo.inner_height)
            }
            Symbology::Qr | Symbology::Code128 => Ok(code),
        }
    }

    /// Final PNG bytes at the job's outer pixel geometry.
    #[instrument(skip_all, fields(symbology = %job.symbology, dpi = job.size.dpi))]
    pub fn generate(&self, job: &Job) -> Result<Vec<u8>> {
        let inner = self.inner_raster(job)?;
        compositor::compose(job, &inner, &self.config)
    }

    pub fn export(&self, job: &Job, format: ExportFormat) -> Result<Vec<u8>> {
        let png = self.generate(job)?;
        export::convert(&png, format)
    }

    pub fn generate_label(&self, job: &Job, format: ExportFormat) -> Result<GeneratedLabel> {
        let geo = JobGeometry::resolve(job)?;
        let data = self.export(job, format)?;

        let mut label = GeneratedLabel {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            symbology: job.symbology,
            manifest_hash: String::new(), // Computed after
            job_hash: compute_job_hash(job, ENGINE_VERSION)?,
            image_sha256: sha256_hex(&data),
            format,
            mime_type: format.mime_type().to_string(),
            size: [geo.pixel.pixel_width, geo.pixel.pixel_height],
            data_base64: base64::engine::general_purpose::STANDARD.encode(&data),
        };
        label.manifest_hash = compute_manifest_hash(&label)?;
        info!(id = %label.id, format = format.extension(), bytes = data.len(), "Label generated");
        Ok(label)
    }
}

impl Default for LabelPipeline {
    fn default() -> Self {
        let config = RenderConfig::default();
        let surface = select_surface(config.surface);
        Self { config, surface }
    }
}
