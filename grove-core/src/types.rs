use glam::Vec2;

/// A position in scene coordinates.
///
/// Scene coordinates are raster pixels: the origin is the top-left corner
/// and `y` grows downwards.
pub type Point = Vec2;

/// Milliseconds on the scene clock.
///
/// Every clock in the engine (growth steps, lock release, palette and
/// celestial cycles) is expressed in this unit.
pub type Millis = u64;

/// Widens a scene point for the curve math done in `kurbo`.
#[inline]
pub fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

#[inline]
pub fn from_kurbo(p: kurbo::Point) -> Point {
    Vec2::new(p.x as f32, p.y as f32)
}

/// An opaque RGB triple.
pub type Rgb = [u8; 3];

/// An unmultiplied RGBA pixel.
pub type Rgba = [u8; 4];

/// Extends an RGB triple with an alpha channel.
#[inline]
pub fn with_alpha(rgb: Rgb, alpha: u8) -> Rgba {
    [rgb[0], rgb[1], rgb[2], alpha]
}
