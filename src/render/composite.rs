use image::RgbaImage;

use crate::foundation::core::PlacementRect;
use crate::foundation::math::{div_round_u32, mul_div255_u16};

/// Straight-alpha RGBA8 pixel.
pub type StraightRgba8 = [u8; 4];

/// Porter-Duff source-over for straight (non-premultiplied) RGBA8.
pub fn over_straight(dst: StraightRgba8, src: StraightRgba8) -> StraightRgba8 {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = mul_div255_u16(u16::from(dst[3]), 255 - sa);
    let out_a = u32::from(sa + da);
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * u32::from(sa) + u32::from(dst[i]) * u32::from(da);
        out[i] = div_round_u32(num, out_a);
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Composite `src` over `dst` with its top-left corner at `(x, y)`, clipped to `dst`.
pub fn blit_over(dst: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));
    let (x, y) = (i64::from(x), i64::from(y));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let run = ((x1 - x0) * 4) as usize;
    let dst_stride = (dw * 4) as usize;
    let src_stride = (sw * 4) as usize;
    let src_x = ((x0 - x) * 4) as usize;
    let dst_buf: &mut [u8] = dst;
    let src_buf: &[u8] = src;

    for row in y0..y1 {
        let d_off = row as usize * dst_stride + x0 as usize * 4;
        let s_off = (row - y) as usize * src_stride + src_x;
        let d_row = &mut dst_buf[d_off..d_off + run];
        let s_row = &src_buf[s_off..s_off + run];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over_straight([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
}

/// Copy of `background` with a still `image` composited at `placement`.
///
/// The image is drawn at its own size; the placement supplies the origin.
pub fn paint_static(
    background: &RgbaImage,
    image: &RgbaImage,
    placement: PlacementRect,
) -> RgbaImage {
    let mut out = background.clone();
    blit_over(&mut out, image, placement.x, placement.y);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
