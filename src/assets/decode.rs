use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frame, ImageFormat};

use crate::assets::source::SourceImage;
use crate::config::PrepareOpts;
use crate::foundation::core::Rational;
use crate::foundation::error::{LoopcompError, LoopcompResult};

/// Decode encoded image bytes into a still or animated source.
///
/// GIF, APNG and animated WebP are read frame by frame; every other format the `image` crate
/// understands is decoded as a still image. Animations with a single frame are reported as
/// [`SourceImage::Static`].
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub fn decode_source(bytes: &[u8], opts: &PrepareOpts) -> LoopcompResult<SourceImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| LoopcompError::decode(format!("unrecognized image format: {e}")))?;

    let frames = match format {
        ImageFormat::Gif => {
            let dec = GifDecoder::new(Cursor::new(bytes)).map_err(decode_err("gif"))?;
            Some(dec.into_frames().collect_frames().map_err(decode_err("gif"))?)
        }
        ImageFormat::Png => {
            let dec = PngDecoder::new(Cursor::new(bytes)).map_err(decode_err("png"))?;
            if dec.is_apng().map_err(decode_err("png"))? {
                let apng = dec.apng().map_err(decode_err("apng"))?;
                Some(apng.into_frames().collect_frames().map_err(decode_err("apng"))?)
            } else {
                None
            }
        }
        ImageFormat::WebP => {
            let dec = WebPDecoder::new(Cursor::new(bytes)).map_err(decode_err("webp"))?;
            if dec.has_animation() {
                Some(dec.into_frames().collect_frames().map_err(decode_err("webp"))?)
            } else {
                None
            }
        }
        _ => None,
    };

    match frames {
        Some(frames) if frames.len() > 1 => Ok(animated_from_frames(frames, opts)),
        Some(frames) => match frames.into_iter().next() {
            Some(first) => Ok(SourceImage::Static(first.into_buffer())),
            None => decode_still(bytes),
        },
        None => decode_still(bytes),
    }
}

fn decode_still(bytes: &[u8]) -> LoopcompResult<SourceImage> {
    let img = image::load_from_memory(bytes).map_err(decode_err("still image"))?;
    Ok(SourceImage::Static(img.to_rgba8()))
}

fn animated_from_frames(frames: Vec<Frame>, opts: &PrepareOpts) -> SourceImage {
    let mut buffers = Vec::with_capacity(frames.len());
    let mut durations = Vec::with_capacity(frames.len());
    for frame in frames {
        let (numer, denom) = frame.delay().numer_denom_ms();
        durations.push(normalize_delay(numer, denom, opts));
        buffers.push(frame.into_buffer());
    }
    tracing::debug!(frames = buffers.len(), "decoded animation");
    SourceImage::Animated {
        frames: buffers,
        durations,
    }
}

/// Convert a decoder delay (`numer/denom` ms) into a bounded, strictly positive duration.
///
/// Delays below the configured minimum, zero included, are raised to it; the result is reduced
/// to a denominator of at most `max_denominator`.
pub fn normalize_delay(numer: u32, denom: u32, opts: &PrepareOpts) -> Rational {
    let raw = Rational::from_delay_ms(numer, denom);
    let min = Rational::from_millis(opts.min_frame_delay_ms);
    let d = if raw < min { min } else { raw };

    let bounded = d.limit_denominator(opts.max_denominator);
    if bounded.is_zero() {
        // Only reachable with a sub-grid minimum; keep one grid step.
        Rational::new(1, opts.max_denominator.max(1)).unwrap_or(Rational::ONE)
    } else {
        bounded
    }
}

fn decode_err(what: &'static str) -> impl Fn(image::ImageError) -> LoopcompError {
    move |e| LoopcompError::decode(format!("decode {what}: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
