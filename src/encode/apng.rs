use crate::config::ComposeOpts;
use crate::encode::{EncodedAnimation, MIME_APNG, MIME_PNG, canvas_size};
use crate::foundation::core::Rational;
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::render::synth::CompositeSequence;

/// APNG delay `(numerator, denominator)` for a duration of `secs` seconds.
///
/// The bounded-denominator approximation is used when it is within `tolerance_ms`; otherwise the
/// delay falls back to whole milliseconds over `1000`.
pub fn rationalize_delay(secs: Rational, max_denominator: u64, tolerance_ms: f64) -> (u64, u64) {
    let approx = secs.limit_denominator(max_denominator);
    if approx.abs_diff_f64(secs) * 1000.0 <= tolerance_ms {
        (approx.num(), approx.den())
    } else {
        (secs.as_millis_f64().round() as u64, 1000)
    }
}

/// Squeeze a delay into the 16-bit APNG fields.
///
/// Pairs that do not fit are re-expressed in milliseconds, then centiseconds, then whole seconds
/// (saturating at `u16::MAX`).
pub fn fit_delay_u16(num: u64, den: u64) -> (u16, u16) {
    let den = den.max(1);
    if let (Ok(n), Ok(d)) = (u16::try_from(num), u16::try_from(den)) {
        return (n, d);
    }
    let secs = num as f64 / den as f64;
    for unit in [1000u16, 100] {
        let n = (secs * f64::from(unit)).round();
        if n <= f64::from(u16::MAX) {
            return (n as u16, unit);
        }
    }
    (secs.round().min(f64::from(u16::MAX)) as u16, 1)
}

/// Encode `seq` as an infinitely looping APNG (or a plain PNG for a single frame).
#[tracing::instrument(skip_all, fields(frames = seq.len()))]
pub fn encode_apng(seq: &CompositeSequence, opts: &ComposeOpts) -> LoopcompResult<EncodedAnimation> {
    let (width, height) = canvas_size(seq)?;
    let frame_count = seq.len();
    let animated = frame_count > 1;

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        if animated {
            let n = u32::try_from(frame_count)
                .map_err(|_| LoopcompError::validation("too many frames for APNG"))?;
            encoder.set_animated(n, 0).map_err(png_err)?;
        }

        let mut writer = encoder.write_header().map_err(png_err)?;
        for (i, frame) in seq.frames.iter().enumerate() {
            if animated {
                let secs = seq.duration_secs(i)?;
                let (num, den) =
                    rationalize_delay(secs, opts.max_denominator, opts.delay_tolerance_ms);
                let (num, den) = fit_delay_u16(num, den);
                writer.set_frame_delay(num, den).map_err(png_err)?;
            }
            writer
                .write_image_data(frame.image.as_raw())
                .map_err(png_err)?;
        }
        writer.finish().map_err(png_err)?;
    }

    Ok(EncodedAnimation {
        bytes,
        mime: if animated { MIME_APNG } else { MIME_PNG },
        frame_count,
    })
}

fn png_err(e: png::EncodingError) -> LoopcompError {
    LoopcompError::encode(format!("png: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/apng.rs"]
mod tests;
