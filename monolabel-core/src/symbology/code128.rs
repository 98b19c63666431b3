//! Code128 renderer - integer-scaled bars across the full inner height.

use barcoders::sym::code128::Code128;
use tracing::instrument;

use super::SymbolRenderer;
use crate::config::RenderConfig;
use crate::error::{LabelError, Result};
use crate::job::{Job, Symbology};
use crate::raster::RasterBuffer;
use crate::sizing::{check_symbology, Code128Plan, JobGeometry};

// Character-set selectors understood by the encoder
const SET_B: char = '\u{0181}';
const SET_C: char = '\u{0106}';

/// One dark bar at unit module width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub x: u32,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarGeometry {
    pub bars: Vec<Bar>,
    /// Right edge of the last bar, in modules.
    pub base_width: u32,
}

/// Set C packs digit pairs; everything else goes through set B.
fn with_charset(payload: &str) -> String {
    let digits_only = !payload.is_empty() && payload.bytes().all(|b| b.is_ascii_digit());
    if digits_only && payload.len() % 2 == 0 {
        format!("{}{}", SET_C, payload)
    } else {
        format!("{}{}", SET_B, payload)
    }
}

/// Set B covers printable ASCII. Anything else, including the encoder's own
/// charset selectors, is rejected rather than silently dropped.
pub fn encode_bars(payload: &str) -> Result<BarGeometry> {
    if let Some(c) = payload.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(LabelError::encoding(
            Symbology::Code128,
            format!("character {:?} (U+{:04X}) is outside printable ASCII", c, c as u32),
        ));
    }
    let barcode = Code128::new(&with_charset(payload))
        .map_err(|e| LabelError::encoding(Symbology::Code128, format!("{:?}", e)))?;
    let modules = barcode.encode();

    let mut bars = Vec::new();
    let mut run_start: Option<u32> = None;
    for (i, &m) in modules.iter().enumerate() {
        let i = i as u32;
        match (m == 1, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                bars.push(Bar { x: start, width: i - start });
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        bars.push(Bar { x: start, width: modules.len() as u32 - start });
    }

    let base_width = match bars.last() {
        Some(last) => last.x + last.width,
        None => {
            return Err(LabelError::encoding(Symbology::Code128, "encoder produced no bars"));
        }
    };
    Ok(BarGeometry { bars, base_width })
}

/// Everything but drawing: payload bounds, encode, size.
///
/// Surrounding whitespace is not part of the symbol.
pub fn prepare(
    job: &Job,
    geo: &JobGeometry,
    config: &RenderConfig,
) -> Result<(BarGeometry, Code128Plan)> {
    let payload = job.payload.trim();
    Code128Plan::check_payload(payload, config)?;
    let bars = encode_bars(payload)?;
    let plan = Code128Plan::derive(geo, bars.base_width, config)?;
    Ok((bars, plan))
}

/// Exactly `inner_width × inner_height`, bars centered horizontally.
#[instrument(skip_all, fields(payload_len = job.payload.len()))]
pub fn render(job: &Job, config: &RenderConfig) -> Result<RasterBuffer> {
    check_symbology(job, Symbology::Code128)?;
    let geo = JobGeometry::resolve(job)?;
    Code128Plan::check_range(job, config)?;
    let (geometry, plan) = prepare(job, &geo, config)?;

    let mut out = RasterBuffer::white(geo.inner_width, geo.inner_height);
    for bar in &geometry.bars {
        out.fill_black(
            plan.offset_x + bar.x * plan.scale,
            0,
            bar.width * plan.scale,
            geo.inner_height,
        );
    }
    out.threshold(config.mono_threshold);
    Ok(out)
}

pub struct Code128Renderer;

impl SymbolRenderer for Code128Renderer {
    fn symbology(&self) -> Symbology {
        Symbology::Code128
    }

    fn render(&self, job: &Job, config: &RenderConfig) -> Result<RasterBuffer> {
        render(job, config)
    }
}
