//! Caller-supplied configuration for every part of the scene.
//!
//! All sections deserialize with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides. [`Config::validate`] is the single
//! boundary check; the engine assumes a validated config afterwards.

use serde::Deserialize;

use crate::{
    error::ConfigError,
    fade::FadePolicy,
    geometry::MAX_TRUNK_WIDTH,
    sky::{celestial::CelestialBody, palette::KeyFrame},
    types::{Millis, Rgb, Rgba},
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tree: TreeConfig,
    pub fade: FadeConfig,
    pub sky: SkyConfig,
    pub ground: GroundConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Length of the trunk segment; scales the whole tree.
    pub trunk_height: f32,
    /// Line width of the trunk; every level subtracts 2, so this sets depth.
    pub trunk_width: f32,
    /// Angle in degrees between a branch and its parent.
    pub spread_angle: f32,
    /// Pixels revealed per growth step.
    pub draw_speed: f32,
    /// Milliseconds between growth steps.
    pub draw_interval: Millis,
    pub min_trunk_height: f32,
    pub max_trunk_height: f32,
    /// Trunk height change per scale notch.
    pub scale_step: f32,
    /// Distance between the trunk base and the bottom edge of the surface.
    pub ground_offset: f32,
    pub stroke_color: Rgb,
    pub preview_color: Rgba,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            trunk_height: 200.0,
            trunk_width: 20.0,
            spread_angle: 30.0,
            draw_speed: 10.0,
            draw_interval: 15,
            min_trunk_height: 100.0,
            max_trunk_height: 300.0,
            scale_step: 10.0,
            ground_offset: 50.0,
            stroke_color: [0, 0, 0],
            preview_color: [0, 0, 0, 255],
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    pub policy: FadePolicy,
    /// Channel (or alpha) change applied to each gray pixel per fade.
    pub step: u8,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            policy: FadePolicy::AlphaDecay,
            step: 48,
        }
    }
}

/// One entry of the looping celestial cycle.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CelestialPhase {
    pub body: CelestialBody,
    pub duration: Millis,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub palette: Vec<KeyFrame>,
    /// Time a key-frame is held before fading to the next one.
    pub hold_time: Millis,
    /// Time taken to fade between two key-frames.
    pub lerp_time: Millis,
    pub celestial: Vec<CelestialPhase>,
    /// Stars per 400 square pixels of sky.
    pub star_density: f32,
    /// Pixels a base-speed star drifts per sky tick.
    pub star_speed: f32,
    /// Stars are drawn only while ambience is below this value.
    pub darkness_threshold: f32,
    /// Interval between sky (and ground retint) updates.
    pub tick_interval: Millis,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            palette: vec![
                // day
                KeyFrame {
                    stops: [[0x00, 0x00, 0x3f], [0x00, 0x3f, 0x7f], [0x1f, 0x5f, 0xc0], [0x3f, 0xa0, 0xff]],
                    ambient: 1.0,
                },
                // dusk
                KeyFrame {
                    stops: [[0x00, 0x3f, 0x7f], [0x50, 0x4f, 0x7f], [0xb2, 0x74, 0x82], [0xff, 0x90, 0x00]],
                    ambient: 0.35,
                },
                // night
                KeyFrame {
                    stops: [[0x00, 0x00, 0x00], [0x00, 0x0f, 0x3f], [0x00, 0x28, 0x50], [0x00, 0x1f, 0x3f]],
                    ambient: 0.05,
                },
                // dawn
                KeyFrame {
                    stops: [[0x1f, 0x00, 0x5f], [0x1f, 0x0f, 0x60], [0xa0, 0x1f, 0x1f], [0xff, 0x7f, 0x00]],
                    ambient: 0.5,
                },
            ],
            hold_time: 20_000,
            lerp_time: 20_000,
            celestial: vec![
                CelestialPhase { body: CelestialBody::Sun, duration: 70_000 },
                CelestialPhase { body: CelestialBody::Moon, duration: 30_000 },
                CelestialPhase { body: CelestialBody::Hidden, duration: 60_000 },
            ],
            star_density: 0.2,
            star_speed: 0.1,
            darkness_threshold: 0.3,
            tick_interval: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Height of the solid ground band at the bottom of the surface.
    pub height: f32,
    pub base_color: Rgb,
    pub blade_color: Rgb,
    /// Number of blade rows; earlier rows are darkened once per later row.
    pub blade_passes: u32,
    pub blade_spacing: f32,
    pub blade_height: f32,
    pub blade_width: f32,
    /// Discrete set the blade control-point offsets are drawn from.
    pub blade_offsets: Vec<f32>,
    /// Multiplier applied to the whole band between passes.
    pub darken_factor: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            height: 50.0,
            base_color: [0x00, 0x64, 0x00],
            blade_color: [0x22, 0x8b, 0x22],
            blade_passes: 3,
            blade_spacing: 3.0,
            blade_height: 14.0,
            blade_width: 1.5,
            blade_offsets: vec![-6.0, -3.0, -1.0, 1.0, 3.0, 6.0],
            darken_factor: 0.8,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

impl Config {
    /// Checks every constraint the engine relies on.
    ///
    /// ### Returns
    /// - `Ok(())` if the config can be handed to [`crate::scene::Scene::new`].
    /// - `Err(ConfigError)` naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (t, s, g) = (&self.tree, &self.sky, &self.ground);
        for (field, v) in [
            ("tree.trunk_width", t.trunk_width),
            ("tree.draw_speed", t.draw_speed),
            ("tree.scale_step", t.scale_step),
            ("tree.min_trunk_height", t.min_trunk_height),
            ("ground.blade_spacing", g.blade_spacing),
            ("ground.blade_width", g.blade_width),
        ] {
            positive(field, v as f64)?;
        }
        for (field, v) in [
            ("tree.draw_interval", t.draw_interval),
            ("sky.lerp_time", s.lerp_time),
            ("sky.tick_interval", s.tick_interval),
        ] {
            positive(field, v as f64)?;
        }

        let unbounded = f32::MAX as f64;
        for (field, v, max) in [
            ("tree.trunk_width", t.trunk_width, MAX_TRUNK_WIDTH as f64),
            ("tree.spread_angle", t.spread_angle, 180.0),
            ("tree.ground_offset", t.ground_offset, unbounded),
            ("sky.star_density", s.star_density, 1.0),
            ("sky.star_speed", s.star_speed, unbounded),
            ("sky.darkness_threshold", s.darkness_threshold, 1.0),
            ("ground.height", g.height, unbounded),
            ("ground.blade_height", g.blade_height, unbounded),
            ("ground.darken_factor", g.darken_factor, 1.0),
        ] {
            in_range(field, v as f64, 0.0, max)?;
        }
        for k in &s.palette {
            in_range("sky.palette.ambient", k.ambient as f64, 0.0, 1.0)?;
        }

        if t.min_trunk_height > t.max_trunk_height {
            return Err(ConfigError::EmptyHeightRange {
                min: t.min_trunk_height,
                max: t.max_trunk_height,
            });
        }
        in_range(
            "tree.trunk_height",
            t.trunk_height as f64,
            t.min_trunk_height as f64,
            t.max_trunk_height as f64,
        )?;
        if s.palette.len() < 2 {
            return Err(ConfigError::PaletteTooShort(s.palette.len()));
        }
        if s.celestial.iter().all(|p| p.duration == 0) {
            return Err(ConfigError::EmptyCelestialCycle);
        }
        if g.blade_passes > 0 && g.blade_offsets.is_empty() {
            return Err(ConfigError::NoBladeOffsets);
        }
        Ok(())
    }
}
