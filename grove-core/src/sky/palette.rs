//! The cyclic day/night palette and its clock.
//!
//! Each period of the clock holds one key-frame for `hold` ms and then fades
//! it into the next one over `lerp` ms. After the fade the index advances,
//! wrapping around the palette.

use serde::Deserialize;

use crate::types::{Millis, Rgb};

/// Number of vertical gradient stops per key-frame.
pub const STOPS: usize = 4;

/// One entry of the palette ring.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct KeyFrame {
    /// Gradient colors from the top of the sky to the bottom.
    pub stops: [Rgb; STOPS],
    /// Scene light level while this key-frame is shown.
    pub ambient: f32,
}

/// Which pair of key-frames is active and how far the fade has progressed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteSample {
    pub from: usize,
    pub to: usize,
    /// Fade progress in `[0, 1)`; `0` during the hold phase.
    pub t: f32,
}

/// A fully blended sky state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyFrame {
    pub stops: [Rgb; STOPS],
    pub ambience: f32,
    pub sample: PaletteSample,
}

#[derive(Clone, Copy, Debug)]
pub struct PaletteClock {
    hold: Millis,
    lerp: Millis,
    len: usize,
}

impl PaletteClock {
    /// ### Panics
    /// Panics if `len < 2` or `lerp == 0`; [`crate::config::Config::validate`]
    /// rejects both.
    pub fn new(hold: Millis, lerp: Millis, len: usize) -> Self {
        assert!(len >= 2, "palette needs at least two key-frames");
        assert!(lerp > 0, "lerp time must be positive");
        Self { hold, lerp, len }
    }

    /// Length of one hold + fade period.
    pub fn period(&self) -> Millis {
        self.hold + self.lerp
    }

    /// Locates `elapsed` on the palette ring.
    pub fn sample(&self, elapsed: Millis) -> PaletteSample {
        let period = self.period();
        let cycle = elapsed / period;
        let within = elapsed % period;

        let from = (cycle % self.len as u64) as usize;
        let to = (from + 1) % self.len;
        let t = if within < self.hold {
            0.0
        } else {
            (within - self.hold) as f32 / self.lerp as f32
        };

        PaletteSample { from, to, t }
    }
}

/// Floors a linear blend of two channel values.
#[inline]
pub fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    ((b as f32 - a as f32) * t + a as f32)
        .floor()
        .clamp(0.0, 255.0) as u8
}

#[inline]
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        lerp_channel(a[0], b[0], t),
        lerp_channel(a[1], b[1], t),
        lerp_channel(a[2], b[2], t),
    ]
}

/// Blends the two key-frames named by `sample`.
pub fn blend(palette: &[KeyFrame], sample: PaletteSample) -> SkyFrame {
    let k0 = &palette[sample.from];
    let k1 = &palette[sample.to];

    let mut stops = [[0; 3]; STOPS];
    for (i, stop) in stops.iter_mut().enumerate() {
        *stop = lerp_rgb(k0.stops[i], k1.stops[i], sample.t);
    }

    let lo = k0.ambient.min(k1.ambient);
    let hi = k0.ambient.max(k1.ambient);
    let ambience = ((k1.ambient - k0.ambient) * sample.t + k0.ambient).clamp(lo, hi);

    SkyFrame {
        stops,
        ambience,
        sample,
    }
}

/// Color of a vertical gradient with evenly spaced stops.
///
/// `pos` runs from `0` (first stop) to `1` (last stop) and is clamped.
pub fn gradient_at(stops: &[Rgb; STOPS], pos: f32) -> Rgb {
    let scaled = pos.clamp(0.0, 1.0) * (STOPS - 1) as f32;
    let i = (scaled.floor() as usize).min(STOPS - 2);
    lerp_rgb(stops[i], stops[i + 1], scaled - i as f32)
}
