use std::borrow::Cow;

use color_quant::NeuQuant;
use image::RgbaImage;
use rayon::prelude::*;

use crate::config::ComposeOpts;
use crate::encode::optimize::optimize_gif;
use crate::encode::{EncodedAnimation, MIME_GIF, canvas_size};
use crate::foundation::core::Rational;
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::synth::CompositeSequence;

/// Pixels with alpha below this are written with the transparent index.
const ALPHA_CUTOFF: u8 = 128;
/// NeuQuant sampling factor (1 = best, 30 = fastest).
const SAMPLE_FACTOR: i32 = 10;

/// GIF delay in milliseconds: floored at `min_ms`, then rounded to the nearest `grid_ms`.
///
/// Never returns less than one grid step.
pub fn quantize_delay_ms(secs: Rational, min_ms: u32, grid_ms: u32) -> u32 {
    let grid = f64::from(grid_ms.max(1));
    let ms = secs.as_millis_f64().max(f64::from(min_ms));
    let steps = (ms / grid).round().max(1.0);
    (steps * grid).min(f64::from(u32::MAX)) as u32
}

/// GIF frame delays are stored in centiseconds.
pub(crate) fn ms_to_centis(ms: u32) -> u16 {
    (f64::from(ms) / 10.0)
        .round()
        .clamp(1.0, f64::from(u16::MAX)) as u16
}

/// One frame reduced to palette indices.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IndexedFrame {
    pub(crate) indices: Vec<u8>,
    /// Flat RGB triples.
    pub(crate) palette: Vec<u8>,
    pub(crate) transparent: Option<u8>,
}

/// Quantize `image` to at most `palette_size` entries.
///
/// When any pixel is (mostly) transparent, one entry is reserved for transparency and the
/// remaining colors are learned from the opaque pixels only.
pub(crate) fn quantize_frame(image: &RgbaImage, palette_size: usize) -> IndexedFrame {
    let palette_size = palette_size.clamp(2, 256);
    let has_transparency = image.pixels().any(|p| p[3] < ALPHA_CUTOFF);
    let colors = if has_transparency {
        palette_size - 1
    } else {
        palette_size
    };
    let transparent = has_transparency.then_some(colors as u8);

    let mut samples = Vec::with_capacity(image.as_raw().len());
    for p in image.pixels().filter(|p| p[3] >= ALPHA_CUTOFF) {
        samples.extend_from_slice(&[p[0], p[1], p[2], 255]);
    }

    if samples.is_empty() {
        return IndexedFrame {
            indices: vec![0; image.as_raw().len() / 4],
            palette: vec![0; 3],
            transparent: Some(0),
        };
    }

    let nq = NeuQuant::new(SAMPLE_FACTOR, colors, &samples);
    let mut palette = nq.color_map_rgb();
    if has_transparency {
        palette.extend_from_slice(&[0, 0, 0]);
    }

    let indices = image
        .pixels()
        .map(|p| match transparent {
            Some(t) if p[3] < ALPHA_CUTOFF => t,
            _ => nq.index_of(&[p[0], p[1], p[2], 255]) as u8,
        })
        .collect();

    IndexedFrame {
        indices,
        palette,
        transparent,
    }
}

/// Encode `seq` as an infinitely repeating GIF with quantized delays.
///
/// Frames are quantized in parallel; the optional external optimizer runs last.
#[tracing::instrument(skip_all, fields(frames = seq.len()))]
pub fn encode_gif(seq: &CompositeSequence, opts: &ComposeOpts) -> LoopcompResult<EncodedAnimation> {
    let (width, height) = canvas_size(seq)?;
    let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(LoopcompError::validation(format!(
                "canvas {width}x{height} exceeds the GIF limit of 65535x65535"
            )));
        }
    };

    let delays = (0..seq.len())
        .map(|i| {
            let secs = seq.duration_secs(i)?;
            let ms = quantize_delay_ms(secs, opts.gif_min_delay_ms, opts.gif_grid_ms);
            Ok(ms_to_centis(ms))
        })
        .collect::<LoopcompResult<Vec<u16>>>()?;

    let indexed: Vec<IndexedFrame> = seq
        .frames
        .par_iter()
        .map(|f| quantize_frame(&f.image, opts.palette_size))
        .collect();

    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, w16, h16, &[]).map_err(gif_err)?;
        encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_err)?;
        for (frame, delay) in indexed.into_iter().zip(delays) {
            let out = gif::Frame {
                width: w16,
                height: h16,
                delay,
                dispose: gif::DisposalMethod::Background,
                transparent: frame.transparent,
                palette: Some(frame.palette),
                buffer: Cow::Owned(frame.indices),
                ..gif::Frame::default()
            };
            encoder.write_frame(&out).map_err(gif_err)?;
        }
    }

    let raw_len = bytes.len();
    let bytes = optimize_gif(bytes, &opts.optimizer());
    tracing::debug!(raw_len, final_len = bytes.len(), "gif encoded");

    Ok(EncodedAnimation {
        bytes,
        mime: MIME_GIF,
        frame_count: seq.len(),
    })
}

fn gif_err(e: gif::EncodingError) -> LoopcompError {
    LoopcompError::encode(format!("gif: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
