//! Sun and moon motion.
//!
//! The celestial clock loops through an ordered list of phases on its own,
//! independent of the palette clock. Within a phase, progress in `[0, 1)`
//! places the body along a fixed path.

use glam::Vec2;
use serde::Deserialize;

use crate::{
    config::CelestialPhase,
    types::{Millis, Point},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CelestialBody {
    /// Sunset: a soft glow descending from the top-left.
    Sun,
    /// Moonrise: a crescent climbing from the right edge.
    Moon,
    /// Nothing is drawn.
    #[serde(rename = "none")]
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelestialSample {
    pub body: CelestialBody,
    /// Index into the phase list.
    pub phase: usize,
    pub progress: f32,
}

/// Sun glow is opaque up to this radius.
pub const SUN_CORE_RADIUS: f32 = 35.0;
/// Sun glow is fully transparent from this radius on.
pub const SUN_GLOW_RADIUS: f32 = 50.0;

pub const MOON_RADIUS: f32 = 25.0;
/// Radius of the sky-colored disc that cuts the crescent.
pub const MOON_SHADOW_RADIUS: f32 = 30.0;
/// Offset of the lit disc from the shadow disc.
pub const MOON_OFFSET: f32 = 15.0;
pub const MOON_COLOR: [u8; 3] = [0xcc, 0xcc, 0xcc];

#[derive(Clone, Debug)]
pub struct CelestialClock {
    phases: Vec<CelestialPhase>,
    cycle: Millis,
}

impl CelestialClock {
    /// ### Panics
    /// Panics if every phase has zero duration; rejected by
    /// [`crate::config::Config::validate`].
    pub fn new(phases: Vec<CelestialPhase>) -> Self {
        let cycle: Millis = phases.iter().map(|p| p.duration).sum();
        assert!(cycle > 0, "celestial cycle must have a non-zero length");
        Self { phases, cycle }
    }

    /// Length of one full loop through all phases.
    pub fn cycle(&self) -> Millis {
        self.cycle
    }

    /// Finds the active phase at `elapsed` and the progress through it.
    pub fn sample(&self, elapsed: Millis) -> CelestialSample {
        let mut within = elapsed % self.cycle;
        for (i, p) in self.phases.iter().enumerate() {
            if within < p.duration {
                return CelestialSample {
                    body: p.body,
                    phase: i,
                    progress: within as f32 / p.duration as f32,
                };
            }
            within -= p.duration;
        }
        unreachable!("elapsed is reduced modulo the cycle length")
    }
}

/// Sun center: a straight descent from `(-60, 400)` to the bottom edge.
pub fn sun_position(progress: f32, height: f32) -> Point {
    Vec2::new(
        -60.0 + 400.0 * progress,
        400.0 + (height - 400.0) * progress,
    )
}

/// Moon center: a diagonal climb from just past the right edge.
pub fn moon_position(progress: f32, width: f32) -> Point {
    Vec2::new(width + 50.0 - 300.0 * progress, 300.0 - 350.0 * progress)
}

/// Opacity of the sun glow at `distance` from its center.
pub fn sun_alpha(distance: f32) -> f32 {
    if distance <= SUN_CORE_RADIUS {
        1.0
    } else if distance >= SUN_GLOW_RADIUS {
        0.0
    } else {
        (SUN_GLOW_RADIUS - distance) / (SUN_GLOW_RADIUS - SUN_CORE_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkyConfig;

    fn clock() -> CelestialClock {
        CelestialClock::new(SkyConfig::default().celestial)
    }

    #[test]
    fn default_cycle_is_sum_of_phases() {
        assert_eq!(clock().cycle(), 160_000);
    }

    #[test]
    fn phases_follow_each_other_and_wrap() {
        let c = clock();
        let s = c.sample(35_000);
        assert_eq!((s.body, s.phase), (CelestialBody::Sun, 0));
        assert_eq!(s.progress, 0.5);

        let s = c.sample(70_000);
        assert_eq!((s.body, s.phase, s.progress), (CelestialBody::Moon, 1, 0.0));

        let s = c.sample(130_000);
        assert_eq!((s.body, s.phase), (CelestialBody::Hidden, 2));
        assert_eq!(s.progress, 0.5);

        let s = c.sample(160_000 + 7_000);
        assert_eq!((s.body, s.phase), (CelestialBody::Sun, 0));
        assert!((s.progress - 0.1).abs() < 1e-6);
    }

    #[test]
    fn zero_length_phases_are_skipped() {
        let c = CelestialClock::new(vec![
            CelestialPhase {
                body: CelestialBody::Sun,
                duration: 0,
            },
            CelestialPhase {
                body: CelestialBody::Moon,
                duration: 10,
            },
        ]);
        assert_eq!(c.sample(0).body, CelestialBody::Moon);
        assert_eq!(c.sample(25).progress, 0.5);
    }

    #[test]
    fn body_paths_start_and_end_where_expected() {
        assert_eq!(sun_position(0.0, 600.0), Vec2::new(-60.0, 400.0));
        assert_eq!(sun_position(1.0, 600.0), Vec2::new(340.0, 600.0));
        assert_eq!(moon_position(0.0, 800.0), Vec2::new(850.0, 300.0));
        assert_eq!(moon_position(1.0, 800.0), Vec2::new(550.0, -50.0));
    }

    #[test]
    fn sun_glow_fades_between_core_and_edge() {
        assert_eq!(sun_alpha(0.0), 1.0);
        assert_eq!(sun_alpha(SUN_CORE_RADIUS), 1.0);
        assert!((sun_alpha(42.5) - 0.5).abs() < 1e-6);
        assert_eq!(sun_alpha(SUN_GLOW_RADIUS), 0.0);
        assert_eq!(sun_alpha(80.0), 0.0);
    }
}
