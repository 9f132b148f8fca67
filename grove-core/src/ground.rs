//! The ground band and its ambience tint.
//!
//! Terrain is generated once into the visible raster and then copied into a
//! reference buffer that represents the fully lit ground. Every sky tick
//! recomputes `visible = reference * ambience` from that reference; the
//! reference itself is never touched by tinting.

use glam::Vec2;
use kurbo::{ParamCurve, QuadBez};
use log::debug;
use rand::Rng;

use crate::{
    config::GroundConfig,
    raster::{Raster, Surface},
    types::{from_kurbo, to_kurbo, with_alpha},
};

/// Line segments used to approximate one blade curve.
const BLADE_SEGMENTS: usize = 6;

/// Ambience is quantized to this many steps before tinting.
pub const AMBIENCE_STEPS: u32 = 10_000;

/// Scales one channel by `ambience`, flooring the result.
///
/// `ambience` is first rounded to the nearest `1 / AMBIENCE_STEPS`, so the
/// result is the exact floor of `value * quantized`, e.g. `200 * 0.35 = 70`.
#[inline]
pub fn tint_channel(value: u8, ambience: f32) -> u8 {
    let steps = (ambience.clamp(0.0, 1.0) * AMBIENCE_STEPS as f32).round() as u32;
    (value as u32 * steps / AMBIENCE_STEPS) as u8
}

/// Writes `reference * ambience` into `visible`, channel by channel.
///
/// RGB are scaled and floored; alpha is copied unchanged. `ambience` is
/// clamped to `[0, 1]`.
///
/// ### Panics
/// Panics if the two buffers have different lengths.
pub fn retint(reference: &[u8], ambience: f32, visible: &mut [u8]) {
    assert_eq!(reference.len(), visible.len());
    let a = ambience.clamp(0.0, 1.0);
    for (dst, src) in visible.chunks_exact_mut(4).zip(reference.chunks_exact(4)) {
        dst[0] = tint_channel(src[0], a);
        dst[1] = tint_channel(src[1], a);
        dst[2] = tint_channel(src[2], a);
        dst[3] = src[3];
    }
}

pub struct Ground {
    cfg: GroundConfig,
    visible: Option<Raster>,
    reference: Vec<u8>,
    ambience: f32,
}

impl Ground {
    pub fn new(cfg: GroundConfig) -> Self {
        Self {
            cfg,
            visible: None,
            reference: Vec::new(),
            ambience: 1.0,
        }
    }

    /// Allocates the ground raster and generates fresh terrain.
    pub fn initialize(&mut self, width: usize, height: usize, rng: &mut impl Rng) {
        self.visible = Some(Raster::new(width, height));
        self.regenerate(rng);
    }

    /// Replaces the terrain and re-captures the reference at ambience 1.
    ///
    /// The current ambience is applied again afterwards. Does nothing
    /// before [`Ground::initialize`].
    pub fn regenerate(&mut self, rng: &mut impl Rng) {
        let Some(visible) = self.visible.as_mut() else {
            return;
        };
        visible.clear();
        paint_terrain(visible, &self.cfg, rng);
        self.reference = visible.pixels().to_vec();
        debug!(
            "ground terrain generated ({} blade rows)",
            self.cfg.blade_passes
        );
        self.retint();
    }

    /// Re-derives the reference from the visible buffer at the current
    /// ambience.
    ///
    /// Does nothing at ambience 0, where the lit colors cannot be recovered.
    pub fn capture_reference(&mut self) {
        let Some(visible) = self.visible.as_ref() else {
            return;
        };
        if self.ambience <= 0.0 {
            return;
        }
        let a = self.ambience;
        self.reference = visible
            .pixels()
            .chunks_exact(4)
            .flat_map(|px| {
                let lift = |c: u8| (c as f32 / a).round().clamp(0.0, 255.0) as u8;
                [lift(px[0]), lift(px[1]), lift(px[2]), px[3]]
            })
            .collect();
    }

    /// Stores the ambience the next [`Ground::retint`] applies.
    pub fn set_ambience(&mut self, ambience: f32) {
        self.ambience = ambience.clamp(0.0, 1.0);
    }

    pub fn ambience(&self) -> f32 {
        self.ambience
    }

    /// Recomputes the visible buffer from the reference.
    pub fn retint(&mut self) {
        if let Some(visible) = self.visible.as_mut() {
            retint(&self.reference, self.ambience, visible.pixels_mut());
        }
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.visible.as_ref()
    }
}

/// Multiplies the color of every visible pixel by `factor`.
fn darken(raster: &mut Raster, factor: f32) {
    for px in raster.pixels_mut().chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        for c in &mut px[..3] {
            *c = (*c as f32 * factor).floor() as u8;
        }
    }
}

/// Fills the ground band and layers rows of grass blades over it.
///
/// Each row sits lower (closer to the viewer) than the previous one; all
/// rows painted so far are darkened before the next is drawn.
fn paint_terrain(raster: &mut Raster, cfg: &GroundConfig, rng: &mut impl Rng) {
    let (w, h) = (raster.width() as f32, raster.height() as f32);
    let top = h - cfg.height;
    raster.fill_rect(0.0, top, w, cfg.height, with_alpha(cfg.base_color, 255));

    let blade = with_alpha(cfg.blade_color, 255);
    let rows = cfg.blade_passes;
    for pass in 0..rows {
        let base_y = top + cfg.height * (pass + 1) as f32 / (rows + 1) as f32;
        let mut x = 0.0;
        while x < w {
            let mid = cfg.blade_offsets[rng.random_range(0..cfg.blade_offsets.len())];
            let tip = cfg.blade_offsets[rng.random_range(0..cfg.blade_offsets.len())];

            let p0 = Vec2::new(x, base_y);
            let curve = QuadBez::new(
                to_kurbo(p0),
                to_kurbo(Vec2::new(x + mid, base_y - cfg.blade_height * 0.5)),
                to_kurbo(Vec2::new(x + tip, base_y - cfg.blade_height)),
            );

            let mut prev = p0;
            for i in 1..=BLADE_SEGMENTS {
                let next = from_kurbo(curve.eval(i as f64 / BLADE_SEGMENTS as f64));
                raster.stroke(prev, next, cfg.blade_width, blade);
                prev = next;
            }
            x += cfg.blade_spacing;
        }

        if pass + 1 < rows {
            darken(raster, cfg.darken_factor);
        }
    }
}
