//! Error types for label generation.
//!
//! Every failure is categorical: input shape, geometric infeasibility,
//! scan density, encoder backend, or a monochrome invariant defect.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::Symbology;

/// Closed vocabulary of failure codes shared by validators and renderers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Symbology,
    Payload,
    Dpi,
    Size,
    Unit,
    Margin,
    Range,
    Inner,
    TooSmall,
    TooDense,
    Encode,
    Invariant,
    Export,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbology => "symbology",
            Self::Payload => "payload",
            Self::Dpi => "dpi",
            Self::Size => "size",
            Self::Unit => "unit",
            Self::Margin => "margin",
            Self::Range => "range",
            Self::Inner => "inner",
            Self::TooSmall => "too_small",
            Self::TooDense => "too_dense",
            Self::Encode => "encode",
            Self::Invariant => "invariant",
            Self::Export => "export",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LabelError {
    /// Rejected before any rendering attempt.
    #[error("{message}")]
    InvalidInput { code: ErrorCode, message: String },

    /// Margin, inner area or raster dimensions do not fit together.
    #[error("{message}")]
    Infeasible { code: ErrorCode, message: String },

    /// px/module or px/bar below the symbology minimum.
    #[error("{message}")]
    Density { code: ErrorCode, message: String },

    /// The symbology encoder failed or produced a degenerate symbol.
    #[error("{symbology} encoding failed: {message}")]
    Encoding { symbology: Symbology, message: String },

    /// A buffer reached a stage boundary with a gray or non-opaque pixel.
    #[error("Monochrome invariant violated: {0}")]
    Invariant(String),

    /// A `RenderConfig` value outside its accepted range.
    #[error("Invalid render config: {0}")]
    Config(String),

    #[error("Image container error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabelError {
    pub fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidInput { code, message: message.into() }
    }

    pub fn infeasible(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Infeasible { code, message: message.into() }
    }

    pub fn density(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Density { code, message: message.into() }
    }

    pub fn encoding(symbology: Symbology, message: impl Into<String>) -> Self {
        Self::Encoding { symbology, message: message.into() }
    }

    /// Map to the closed failure vocabulary.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { code, .. }
            | Self::Infeasible { code, .. }
            | Self::Density { code, .. } => *code,
            Self::Encoding { .. } => ErrorCode::Encode,
            Self::Invariant(_) => ErrorCode::Invariant,
            Self::Config(_) | Self::Image(_) | Self::Io(_) | Self::Json(_) => ErrorCode::Export,
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
