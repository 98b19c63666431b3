//! RGBA raster buffers and the strict monochrome helpers.

use crate::error::{ErrorCode, LabelError, Result};

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 255;
pub const OPAQUE: u8 = 255;

/// Row-major RGBA, `data.len() == width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Fully opaque white canvas.
    pub fn white(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![WHITE; width as usize * height as usize * 4],
        }
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(LabelError::infeasible(
                ErrorCode::Inner,
                format!("Invalid RGBA length: got {}, expected {}", data.len(), expected),
            ));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y) == [BLACK, BLACK, BLACK, OPAQUE]
    }

    /// Paint `[x, x+w) × [y, y+h)` black, clipped to the buffer.
    pub fn fill_black(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for yy in y.min(self.height)..y_end {
            let start = self.index(x.min(x_end), yy);
            let end = self.index(x_end, yy);
            for px in self.data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&[BLACK, BLACK, BLACK, OPAQUE]);
            }
        }
    }

    /// Copy `src` into `self` with its top-left corner at `(x, y)`. `src` must fit.
    pub fn blit(&mut self, src: &RasterBuffer, x: u32, y: u32) -> Result<()> {
        let fits_x = x as u64 + src.width as u64 <= self.width as u64;
        let fits_y = y as u64 + src.height as u64 <= self.height as u64;
        if !fits_x || !fits_y {
            return Err(LabelError::infeasible(
                ErrorCode::Inner,
                format!(
                    "{}x{} raster does not fit in {}x{} at ({}, {})",
                    src.width, src.height, self.width, self.height, x, y
                ),
            ));
        }
        let row_len = src.width as usize * 4;
        for row in 0..src.height {
            let s = src.index(0, row);
            let d = self.index(x, y + row);
            self.data[d..d + row_len].copy_from_slice(&src.data[s..s + row_len]);
        }
        Ok(())
    }

    /// Place `self` on a white `width × height` canvas, floor-split remainder as leading offset.
    pub fn centered_in(&self, width: u32, height: u32) -> Result<RasterBuffer> {
        if self.width > width || self.height > height {
            return Err(LabelError::infeasible(
                ErrorCode::Inner,
                format!(
                    "Code raster {}x{} is larger than the {}x{} inner area",
                    self.width, self.height, width, height
                ),
            ));
        }
        let mut canvas = RasterBuffer::white(width, height);
        canvas.blit(self, (width - self.width) / 2, (height - self.height) / 2)?;
        Ok(canvas)
    }

    /// Swap black and white; alpha untouched.
    pub fn invert(&mut self) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
    }

    /// Force every pixel to 0/255 by mean RGB against `threshold`, alpha to 255.
    pub fn threshold(&mut self, threshold: u8) {
        threshold_to_monochrome(&mut self.data, threshold);
    }

    pub fn assert_monochrome(&self) -> Result<()> {
        assert_monochrome(&self.data)
    }
}

pub fn threshold_to_monochrome(rgba: &mut [u8], threshold: u8) {
    for px in rgba.chunks_exact_mut(4) {
        let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
        // avg < threshold  <=>  sum < 3 * threshold
        let v = if sum < 3 * threshold as u32 { BLACK } else { WHITE };
        px[0] = v;
        px[1] = v;
        px[2] = v;
        px[3] = OPAQUE;
    }
}

/// Fails on the first channel not in {0, 255} or alpha not 255.
pub fn assert_monochrome(rgba: &[u8]) -> Result<()> {
    if rgba.len() % 4 != 0 {
        return Err(LabelError::Invariant(format!(
            "Invalid RGBA buffer length: {} (not divisible by 4)",
            rgba.len()
        )));
    }
    for (p, px) in rgba.chunks_exact(4).enumerate() {
        let i = p * 4;
        if px[..3].iter().any(|&c| c != BLACK && c != WHITE) {
            return Err(LabelError::Invariant(format!(
                "Non-monochrome RGB detected at byte {}: ({},{},{})",
                i, px[0], px[1], px[2]
            )));
        }
        if px[3] != OPAQUE {
            return Err(LabelError::Invariant(format!(
                "Non-opaque alpha detected at byte {}: {}",
                i + 3,
                px[3]
            )));
        }
    }
    Ok(())
}

/// Inclusive-exclusive rectangle in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

/// Dark-cell bit grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitGrid {
    pub width: usize,
    pub height: usize,
    pub bits: Vec<bool>,
}

impl BitGrid {
    /// Dark where mean RGB < `threshold` and the pixel is fully opaque.
    pub fn from_raster(raster: &RasterBuffer, threshold: u8) -> Self {
        let bits = raster
            .data
            .chunks_exact(4)
            .map(|px| {
                let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
                sum < 3 * threshold as u32 && px[3] == OPAQUE
            })
            .collect();
        Self {
            width: raster.width as usize,
            height: raster.height as usize,
            bits,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Smallest rectangle containing every dark cell, or `None` when there are none.
    pub fn tight_bounds(&self) -> Option<Bounds> {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) {
                    continue;
                }
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        any.then(|| Bounds {
            left: min_x,
            top: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    pub fn crop(&self, b: Bounds) -> BitGrid {
        let mut bits = Vec::with_capacity(b.width * b.height);
        for y in b.top..b.top + b.height {
            for x in b.left..b.left + b.width {
                bits.push(self.get(x, y));
            }
        }
        BitGrid { width: b.width, height: b.height, bits }
    }
}
