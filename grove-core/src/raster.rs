//! RGBA pixel buffers and the paint seam every layer draws through.
//!
//! A [`Raster`] stores unmultiplied RGBA8 pixels row by row. Coverage is
//! decided per pixel center `(x + 0.5, y + 0.5)`; there is no
//! anti-aliasing, which keeps the gray-pixel test of the fade engine exact.

use crate::types::{Point, Rgba, to_kurbo};
use glam::Vec2;
use kurbo::{Line, ParamCurveNearest};

/// The operations the engine needs from a drawing surface.
///
/// The growth scheduler and the fade engine are written against this trait
/// so they can be driven with a recording surface in tests.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Resets every pixel to transparent black.
    fn clear(&mut self);

    /// Paints a straight stroke with round caps.
    fn stroke(&mut self, from: Point, to: Point, width: f32, color: Rgba);

    /// Raw RGBA bytes, row-major, 4 bytes per pixel.
    fn pixels(&self) -> &[u8];
    fn pixels_mut(&mut self) -> &mut [u8];
}

#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Creates a fully transparent raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    /// Byte offset of `(x, y)`, or `None` outside the raster.
    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) * 4)
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        let i = self.offset(x, y)?;
        self.data[i..i + 4].try_into().ok()
    }

    #[cfg(test)]
    pub(crate) fn put_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&color);
        }
    }

    /// Composites `color` over the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if let Some(dst) = self.pixel(x, y) {
            let i = (y * self.width + x) * 4;
            self.data[i..i + 4].copy_from_slice(&blend_over(dst, color));
        }
    }

    /// Fills every row of the raster with a solid color per row.
    pub fn fill_rows(&mut self, mut row_color: impl FnMut(usize) -> Rgba) {
        for y in 0..self.height {
            let c = row_color(y);
            let start = y * self.width * 4;
            for px in self.data[start..start + self.width * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&c);
            }
        }
    }

    /// Blends an axis-aligned rectangle whose top-left corner is `(x, y)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let Some((x0, x1)) = span(x, x + w, self.width) else {
            return;
        };
        let Some((y0, y1)) = span(y, y + h, self.height) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Blends a disc whose color is chosen per pixel.
    ///
    /// `color_at(x, y, distance)` returns the color for a covered pixel, or
    /// `None` to skip it. Pixels farther than `radius` from `center` are
    /// left untouched.
    pub fn fill_disc_with(
        &mut self,
        center: Point,
        radius: f32,
        mut color_at: impl FnMut(usize, usize, f32) -> Option<Rgba>,
    ) {
        let Some((x0, x1)) = span(center.x - radius, center.x + radius, self.width) else {
            return;
        };
        let Some((y0, y1)) = span(center.y - radius, center.y + radius, self.height) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let d = (pixel_center(px, py) - center).length();
                if d <= radius
                    && let Some(c) = color_at(px, py, d)
                {
                    self.blend_pixel(px, py, c);
                }
            }
        }
    }

    /// Composites `top` over `self`. Both rasters must have the same size.
    ///
    /// ### Panics
    /// Panics if the sizes differ.
    pub fn composite(&mut self, top: &Raster) {
        assert_eq!((self.width, self.height), (top.width, top.height));
        for (dst, src) in self
            .data
            .chunks_exact_mut(4)
            .zip(top.data.chunks_exact(4))
        {
            if src[3] == 0 {
                continue;
            }
            let out = blend_over([dst[0], dst[1], dst[2], dst[3]], [src[0], src[1], src[2], src[3]]);
            dst.copy_from_slice(&out);
        }
    }
}

impl Surface for Raster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn stroke(&mut self, from: Point, to: Point, width: f32, color: Rgba) {
        // Thin strokes still cover the pixel they pass through.
        let half = width.max(1.0) * 0.5;
        let reach = (half as f64) * (half as f64);
        let line = Line::new(to_kurbo(from), to_kurbo(to));
        let min = from.min(to) - Vec2::splat(half);
        let max = from.max(to) + Vec2::splat(half);
        let Some((x0, x1)) = span(min.x, max.x, self.width) else {
            return;
        };
        let Some((y0, y1)) = span(min.y, max.y, self.height) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let nearest = line.nearest(to_kurbo(pixel_center(px, py)), 1e-9);
                if nearest.distance_sq <= reach {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[inline]
fn pixel_center(x: usize, y: usize) -> Point {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// Pixel index range whose centers fall inside `[lo, hi]`, clipped to `len`.
fn span(lo: f32, hi: f32, len: usize) -> Option<(usize, usize)> {
    if !(lo.is_finite() && hi.is_finite()) || hi < 0.0 {
        return None;
    }
    let start = (lo - 0.5).ceil().max(0.0) as usize;
    let end = ((hi - 0.5).floor() + 1.0).max(0.0) as usize;
    let end = end.min(len);
    (start < end).then_some((start, end))
}

/// Unmultiplied source-over compositing.
fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}
