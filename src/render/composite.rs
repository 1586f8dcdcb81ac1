use crate::foundation::core::Canvas;
use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(w),
            y1: y.saturating_add(h),
        }
    }

    /// Intersect with the canvas bounds; `None` when nothing is left.
    pub fn clip(self, canvas: Canvas) -> Option<Self> {
        let out = Self {
            x0: self.x0.min(canvas.width),
            y0: self.y0.min(canvas.height),
            x1: self.x1.min(canvas.width),
            y1: self.y1.min(canvas.height),
        };
        (out.x0 < out.x1 && out.y0 < out.y1).then_some(out)
    }
}

/// Source-over of premultiplied `src` onto premultiplied `dst`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> PixelFrameResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PixelFrameError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Overwrite every pixel of `rect` (clipped) with `color`.
pub fn fill_rect(dst: &mut [u8], canvas: Canvas, rect: PixelRect, color: PremulRgba8) {
    for_each_pixel(dst, canvas, rect, |px| px.copy_from_slice(&color));
}

/// Source-over `color` onto every pixel of `rect` (clipped).
pub fn blend_rect(dst: &mut [u8], canvas: Canvas, rect: PixelRect, color: PremulRgba8) {
    for_each_pixel(dst, canvas, rect, |px| {
        let out = over([px[0], px[1], px[2], px[3]], color, 1.0);
        px.copy_from_slice(&out);
    });
}

fn for_each_pixel(dst: &mut [u8], canvas: Canvas, rect: PixelRect, mut f: impl FnMut(&mut [u8])) {
    let Some(r) = rect.clip(canvas) else {
        return;
    };
    let stride = canvas.width as usize * 4;
    for y in r.y0..r.y1 {
        let row = y as usize * stride;
        let span = &mut dst[row + r.x0 as usize * 4..row + r.x1 as usize * 4];
        span.chunks_exact_mut(4).for_each(&mut f);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
