//! MonoLabel Core - Monochrome Label Raster Engine
//!
//! # Pipeline Rules
//! 1. Physical size is truth; pixels are derived, never guessed
//! 2. One sizing formula, shared by validators and renderers
//! 3. Strictly black and white at every stage boundary
//! 4. Output dimensions equal the job's outer pixel geometry
//! 5. Identical jobs produce identical bytes

pub mod config;
pub mod error;
pub mod units;
pub mod job;
pub mod raster;
pub mod sizing;
pub mod symbology;
pub mod validation;
pub mod compositor;
pub mod export;
pub mod hashing;
pub mod print;
pub mod pipeline;

pub use config::{default_job, RenderConfig, SurfaceKind};
pub use error::{ErrorCode, LabelError, Result};
pub use job::{Job, Margin, PhysicalSize, Symbology, Unit};
pub use units::{compute_pixel_size, PixelGeometry};
pub use raster::RasterBuffer;
pub use validation::{
    validate_code128_job, validate_datamatrix_job, validate_job, validate_qr_job, ValidationResult,
};
pub use compositor::{compose, compose_raster};
pub use export::{convert, ExportFormat};
pub use hashing::{canonical_json, compute_job_hash, compute_manifest_hash};
pub use print::{PrintAuthority, PrintProfile};
pub use pipeline::{GeneratedLabel, LabelPipeline};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
