use image::RgbaImage;
use kurbo::{Ellipse, Point, Rect, RoundedRect, Shape};

use crate::foundation::math::{div_round_u32, mul_div255_u8};

const SUPERSAMPLE: u32 = 4;

/// Display shape applied to overlay frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskShape {
    /// Full rectangle, no masking.
    #[default]
    Rect,
    /// Rectangle with circular corners; the radius is clamped to half the short side.
    RoundedRect {
        /// Corner radius in pixels.
        radius: f64,
    },
    /// Ellipse inscribed in the box (a circle for square boxes).
    Ellipse,
}

/// Per-pixel coverage (0..=255) of `shape` over a `width x height` box.
///
/// Coverage is estimated with a 4x4 grid of samples per pixel.
pub(crate) fn coverage_mask(width: u32, height: u32, shape: MaskShape) -> Vec<u8> {
    let len = width as usize * height as usize;
    let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    match shape {
        MaskShape::Rect => vec![255; len],
        MaskShape::RoundedRect { radius } => {
            let radius = radius.clamp(0.0, bounds.width().min(bounds.height()) / 2.0);
            if radius <= 0.0 {
                return vec![255; len];
            }
            sample_coverage(width, height, &RoundedRect::from_rect(bounds, radius))
        }
        MaskShape::Ellipse => sample_coverage(width, height, &Ellipse::from_rect(bounds)),
    }
}

fn sample_coverage(width: u32, height: u32, shape: &impl Shape) -> Vec<u8> {
    let step = 1.0 / f64::from(SUPERSAMPLE);
    let samples = SUPERSAMPLE * SUPERSAMPLE;
    let mut out = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let mut hits = 0u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let p = Point::new(
                        f64::from(x) + (f64::from(sx) + 0.5) * step,
                        f64::from(y) + (f64::from(sy) + 0.5) * step,
                    );
                    if shape.contains(p) {
                        hits += 1;
                    }
                }
            }
            out.push(div_round_u32(hits * 255, samples));
        }
    }
    out
}

/// Multiply each pixel's alpha by the matching mask coverage.
///
/// The mask must hold one entry per pixel; extra entries are ignored.
pub(crate) fn apply_mask(img: &mut RgbaImage, mask: &[u8]) {
    for (px, &m) in img.pixels_mut().zip(mask) {
        if m == 255 {
            continue;
        }
        px.0[3] = mul_div255_u8(u16::from(px.0[3]), u16::from(m));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/mask.rs"]
mod tests;
