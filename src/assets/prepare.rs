use image::RgbaImage;
use image::imageops::{self, FilterType};
use rayon::prelude::*;

use crate::assets::mask::{MaskShape, apply_mask, coverage_mask};
use crate::assets::source::{AnimatedAsset, PreparedSource, SourceImage};
use crate::config::PrepareOpts;
use crate::foundation::error::{LoopcompError, LoopcompResult};

/// Uniformly scale `(width, height)` down to fit `max_width x max_height`.
///
/// Never scales up; both results are at least 1.
pub fn display_size(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let sx = if width > 0 {
        f64::from(max_width) / f64::from(width)
    } else {
        1.0
    };
    let sy = if height > 0 {
        f64::from(max_height) / f64::from(height)
    } else {
        1.0
    };
    let scale = sx.min(sy).min(1.0);
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

impl PrepareOpts {
    /// Mask used when a layout item does not name one.
    pub fn default_shape(&self) -> MaskShape {
        MaskShape::RoundedRect {
            radius: f64::from(self.border_radius_px),
        }
    }
}

/// Size and mask every frame of `source` for display under `placement_id`.
///
/// The display box comes from the first frame scaled into the configured maximum; all frames are
/// resized (Lanczos3) to that box and masked with `shape`.
#[tracing::instrument(skip(source, opts), fields(frames = source.frame_count()))]
pub fn prepare_source(
    placement_id: &str,
    source: SourceImage,
    shape: MaskShape,
    opts: &PrepareOpts,
) -> LoopcompResult<PreparedSource> {
    opts.validate()?;
    match source {
        SourceImage::Static(image) => {
            let (w, h) = checked_display_size(placement_id, &image, opts)?;
            let mask = coverage_mask(w, h, shape);
            Ok(PreparedSource::Static {
                placement_id: placement_id.to_owned(),
                image: fit_and_mask(image, w, h, &mask),
            })
        }
        SourceImage::Animated { frames, durations } => {
            let Some(first) = frames.first() else {
                return Err(LoopcompError::validation(format!(
                    "source for '{placement_id}' has no frames"
                )));
            };
            let (w, h) = checked_display_size(placement_id, first, opts)?;
            let mask = coverage_mask(w, h, shape);
            let frames: Vec<RgbaImage> = frames
                .into_par_iter()
                .map(|f| fit_and_mask(f, w, h, &mask))
                .collect();
            Ok(PreparedSource::Animated(AnimatedAsset::new(
                placement_id,
                frames,
                durations,
            )?))
        }
    }
}

fn checked_display_size(
    placement_id: &str,
    image: &RgbaImage,
    opts: &PrepareOpts,
) -> LoopcompResult<(u32, u32)> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(LoopcompError::validation(format!(
            "source for '{placement_id}' has zero size"
        )));
    }
    Ok(display_size(
        w,
        h,
        opts.max_render_width,
        opts.max_render_height,
    ))
}

fn fit_and_mask(frame: RgbaImage, width: u32, height: u32, mask: &[u8]) -> RgbaImage {
    let mut out = if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Lanczos3)
    };
    apply_mask(&mut out, mask);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/prepare.rs"]
mod tests;
