//! Image container encoding and downstream format conversion.

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::raster::RasterBuffer;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
        }
    }
}

/// Lossless RGBA PNG. The buffer is encoded as-is.
pub fn encode_png(raster: &RasterBuffer) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        raster.data(),
        raster.width(),
        raster.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

pub fn decode_png(bytes: &[u8]) -> Result<RasterBuffer> {
    let rgba = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterBuffer::from_rgba(width, height, rgba.into_raw())
}

/// Re-encode finalized PNG bytes into `format`.
#[instrument(skip(png), fields(png_len = png.len()))]
pub fn convert(png: &[u8], format: ExportFormat) -> Result<Vec<u8>> {
    if format == ExportFormat::Png {
        return Ok(png.to_vec());
    }

    let img = image::load_from_memory_with_format(png, ImageFormat::Png)?;
    let (width, height) = (img.width(), img.height());
    let mut out = Vec::new();

    match format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel; the raster is opaque anyway
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::Bmp => {
            let rgba = img.to_rgba8();
            BmpEncoder::new(&mut out).write_image(
                rgba.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Png => out.extend_from_slice(png),
    }

    debug!(?format, bytes = out.len(), "Converted export");
    Ok(out)
}
