//! The sky layer and the ambience it produces.
//!
//! Every tick the sky:
//! 1. samples the [`palette`] clock and blends the active key-frames,
//! 2. paints the 4-stop vertical gradient,
//! 3. paints the sun or moon from the [`celestial`] clock,
//! 4. drifts and paints the [`stars`] while it is dark enough.
//!
//! The resulting ambience scalar is the only value other layers read.

pub mod celestial;
pub mod palette;
pub mod stars;

use log::{debug, info};
use rand::Rng;

use crate::{
    config::SkyConfig,
    raster::{Raster, Surface},
    types::{Millis, with_alpha},
};
use celestial::{CelestialBody, CelestialClock, CelestialSample};
use palette::{PaletteClock, SkyFrame};
use stars::StarField;

pub struct Sky {
    cfg: SkyConfig,
    palette: PaletteClock,
    celestial: CelestialClock,
    /// Darkest ambience the palette can reach.
    night_floor: f32,
    stars: StarField,
    raster: Option<Raster>,
    started_at: Millis,
    frame: SkyFrame,
    body: Option<CelestialSample>,
}

impl Sky {
    /// Creates an uninitialized sky showing the first key-frame.
    ///
    /// `cfg` must have passed [`crate::config::Config::validate`].
    pub fn new(cfg: SkyConfig) -> Self {
        let palette = PaletteClock::new(cfg.hold_time, cfg.lerp_time, cfg.palette.len());
        let celestial = CelestialClock::new(cfg.celestial.clone());
        let night_floor = cfg
            .palette
            .iter()
            .map(|k| k.ambient)
            .fold(f32::INFINITY, f32::min);
        let frame = palette::blend(&cfg.palette, palette.sample(0));

        Self {
            cfg,
            palette,
            celestial,
            night_floor,
            stars: StarField::default(),
            raster: None,
            started_at: 0,
            frame,
            body: None,
        }
    }

    /// Allocates the sky raster, scatters the stars and starts both clocks
    /// at `now`.
    pub fn initialize(&mut self, width: usize, height: usize, now: Millis, rng: &mut impl Rng) {
        self.raster = Some(Raster::new(width, height));
        self.stars = StarField::scatter(width, height, self.cfg.star_density, rng);
        self.started_at = now;
        self.frame = palette::blend(&self.cfg.palette, self.palette.sample(0));
        debug!(
            "sky initialized at {width}x{height} with {} stars",
            self.stars.stars().len()
        );
    }

    /// Advances the sky to `now` and repaints it.
    ///
    /// Does nothing before [`Sky::initialize`].
    ///
    /// ### Returns
    /// The ambience after this tick.
    pub fn tick(&mut self, now: Millis) -> f32 {
        let Some(raster) = self.raster.as_mut() else {
            return self.frame.ambience;
        };
        let elapsed = now.saturating_sub(self.started_at);

        let frame = palette::blend(&self.cfg.palette, self.palette.sample(elapsed));
        if frame.sample.from != self.frame.sample.from {
            info!(
                "sky key-frame {} -> {} (ambience {:.2})",
                frame.sample.from, frame.sample.to, frame.ambience
            );
        }
        self.frame = frame;

        paint_gradient(raster, &frame);

        let body = self.celestial.sample(elapsed);
        if self.body.map(|b| b.phase) != Some(body.phase) {
            debug!("celestial phase {} ({:?})", body.phase, body.body);
        }
        self.body = Some(body);
        paint_body(raster, &frame, &body);

        if let Some(look) = stars::star_look(
            frame.ambience,
            self.cfg.darkness_threshold,
            self.night_floor,
        ) {
            self.stars.drift(self.cfg.star_speed);
            let c = with_alpha([look.level; 3], (look.alpha * 255.0).round() as u8);
            for s in self.stars.stars() {
                raster.blend_pixel(s.pos.x as usize, s.pos.y as usize, c);
            }
        }

        frame.ambience
    }

    pub fn ambience(&self) -> f32 {
        self.frame.ambience
    }

    pub fn frame(&self) -> &SkyFrame {
        &self.frame
    }

    pub fn celestial(&self) -> Option<&CelestialSample> {
        self.body.as_ref()
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }
}

fn row_position(y: usize, height: usize) -> f32 {
    y as f32 / height.saturating_sub(1).max(1) as f32
}

fn paint_gradient(raster: &mut Raster, frame: &SkyFrame) {
    let h = raster.height();
    raster.fill_rows(|y| with_alpha(palette::gradient_at(&frame.stops, row_position(y, h)), 255));
}

fn paint_body(raster: &mut Raster, frame: &SkyFrame, body: &CelestialSample) {
    let (w, h) = (raster.width() as f32, raster.height() as f32);
    match body.body {
        CelestialBody::Sun => {
            let center = celestial::sun_position(body.progress, h);
            raster.fill_disc_with(center, celestial::SUN_GLOW_RADIUS, |_, _, d| {
                let a = celestial::sun_alpha(d);
                (a > 0.0).then(|| [255, 255, 255, (a * 255.0).round() as u8])
            });
        }
        CelestialBody::Moon => {
            let center = celestial::moon_position(body.progress, w);
            let lit = center + glam::Vec2::splat(celestial::MOON_OFFSET);
            let moon = with_alpha(celestial::MOON_COLOR, 255);
            raster.fill_disc_with(lit, celestial::MOON_RADIUS, |_, _, _| Some(moon));

            let rows = raster.height();
            let stops = frame.stops;
            raster.fill_disc_with(center, celestial::MOON_SHADOW_RADIUS, |_, y, _| {
                Some(with_alpha(
                    palette::gradient_at(&stops, row_position(y, rows)),
                    255,
                ))
            });
        }
        CelestialBody::Hidden => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CelestialPhase, SkyConfig};
    use rand::{SeedableRng, rngs::StdRng};

    fn sky_with(cfg: SkyConfig) -> Sky {
        let mut sky = Sky::new(cfg);
        let mut rng = StdRng::seed_from_u64(1);
        sky.initialize(120, 90, 1_000, &mut rng);
        sky
    }

    fn hidden_body(cfg: &mut SkyConfig) {
        cfg.celestial = vec![CelestialPhase {
            body: CelestialBody::Hidden,
            duration: 1_000,
        }];
    }

    #[test]
    fn tick_before_initialize_is_a_no_op() {
        let mut sky = Sky::new(SkyConfig::default());
        assert_eq!(sky.tick(50_000), 1.0);
        assert!(sky.raster().is_none());
        assert!(sky.celestial().is_none());
    }

    #[test]
    fn tick_reports_ambience_relative_to_start() {
        let mut sky = sky_with(SkyConfig::default());
        // Started at 1_000, so 31_000 is 30 s into the cycle.
        let a = sky.tick(31_000);
        assert!((a - 0.675).abs() < 1e-6);
        assert_eq!(sky.ambience(), a);
        assert_eq!(sky.frame().sample.t, 0.5);
    }

    #[test]
    fn gradient_top_and_bottom_rows_match_end_stops() {
        let mut cfg = SkyConfig::default();
        hidden_body(&mut cfg);
        let mut sky = sky_with(cfg);
        sky.tick(1_000);

        let stops = sky.frame().stops;
        let r = sky.raster().unwrap();
        assert_eq!(r.pixel(60, 0), Some(with_alpha(stops[0], 255)));
        assert_eq!(r.pixel(60, 89), Some(with_alpha(stops[3], 255)));
    }

    #[test]
    fn stars_only_drift_when_dark() {
        let mut cfg = SkyConfig::default();
        hidden_body(&mut cfg);
        cfg.star_density = 1.0;
        let mut sky = sky_with(cfg);
        let before = sky.stars().stars().to_vec();

        // Day key-frame: too bright for stars.
        sky.tick(1_000);
        assert_eq!(sky.stars().stars(), &before[..]);

        // Night key-frame (index 2) is held from 80 s to 100 s.
        sky.tick(1_000 + 85_000);
        assert!(sky.ambience() < 0.3);
        assert_ne!(sky.stars().stars(), &before[..]);
    }

    #[test]
    fn sun_glow_is_opaque_at_its_center() {
        let mut sky = Sky::new(SkyConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        sky.initialize(400, 600, 0, &mut rng);

        // Half way through the sunset the sun sits at (140, 500).
        sky.tick(35_000);
        assert_eq!(sky.celestial().unwrap().body, CelestialBody::Sun);
        let r = sky.raster().unwrap();
        assert_eq!(r.pixel(140, 500), Some([255, 255, 255, 255]));
        assert_ne!(r.pixel(140, 400), Some([255, 255, 255, 255]));
    }

    #[test]
    fn moon_paints_its_lit_disc() {
        let mut cfg = SkyConfig::default();
        cfg.celestial = vec![CelestialPhase {
            body: CelestialBody::Moon,
            duration: 10_000,
        }];
        let mut sky = Sky::new(cfg);
        let mut rng = StdRng::seed_from_u64(1);
        sky.initialize(400, 400, 0, &mut rng);

        // progress 0.5: shadow disc at (300, 125), lit disc at (315, 140).
        sky.tick(5_000);
        let lit_only = sky.raster().unwrap().pixel(330, 155).unwrap();
        assert_eq!(lit_only, with_alpha(celestial::MOON_COLOR, 255));

        // The shadow disc repaints the sky gradient at its center.
        let stops = sky.frame().stops;
        let shadow = sky.raster().unwrap().pixel(300, 125).unwrap();
        assert_eq!(
            shadow,
            with_alpha(palette::gradient_at(&stops, row_position(125, 400)), 255)
        );
    }
}
