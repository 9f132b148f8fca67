//! The whole scene: layers, input handlers and the driving clock.
//!
//! [`Scene`] is what a hosting shell talks to. The shell calls
//! [`Scene::initialize`] once the drawing surface exists. It forwards
//! already-mapped pointer input to `on_trigger`, `on_hover` and
//! `on_scale_adjust`, calls [`Scene::tick`] with a monotonic clock, and
//! shows the result of [`Scene::compose`].
//!
//! Layers, back to front: sky, forest, ground, hover preview.

use glam::Vec2;
use log::{debug, info};
use rand::Rng;

use crate::{
    config::{Config, FadeConfig, TreeConfig},
    error::ConfigError,
    forest::Forest,
    geometry,
    ground::Ground,
    growth,
    lock::BuilderLock,
    raster::{Raster, Surface},
    sky::{Sky, palette::SkyFrame},
    types::{Millis, Point, with_alpha},
};

/// Rectangle outlining where the next trunk would grow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverPreview {
    /// Top-left corner.
    pub min: Point,
    pub size: Vec2,
}

/// What one call to [`Scene::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Partial strokes painted by the growth run.
    pub strokes: usize,
    /// Whether the builder lock was released.
    pub released: bool,
    /// Whether the sky and ground were updated.
    pub sky_updated: bool,
}

pub struct Scene {
    cfg: Config,
    size: Option<(usize, usize)>,
    trunk_height: f32,
    lock: BuilderLock,
    forest: Forest,
    sky: Sky,
    ground: Ground,
    hover: Option<HoverPreview>,
    last_sky_tick: Option<Millis>,
}

impl Scene {
    /// Creates an uninitialized scene.
    ///
    /// ### Returns
    /// - `Ok(Scene)` if `cfg` passes [`Config::validate`].
    /// - `Err(ConfigError)` otherwise.
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            trunk_height: cfg.tree.trunk_height,
            lock: BuilderLock::default(),
            forest: Forest::new(cfg.fade),
            sky: Sky::new(cfg.sky.clone()),
            ground: Ground::new(cfg.ground.clone()),
            hover: None,
            last_sky_tick: None,
            size: None,
            cfg,
        })
    }

    /// Allocates every layer at `width` x `height` and starts the clocks.
    ///
    /// Generates the terrain, scatters the stars and paints the first sky
    /// frame. Calling it again rebuilds the scene from scratch.
    pub fn initialize(&mut self, width: usize, height: usize, now: Millis, rng: &mut impl Rng) {
        self.size = Some((width, height));
        self.lock = BuilderLock::default();
        self.hover = None;
        self.forest.initialize(width, height);
        self.sky.initialize(width, height, now, rng);
        self.ground.initialize(width, height, rng);
        self.last_sky_tick = None;
        self.update_sky(now);
        info!("scene initialized at {width}x{height}");
    }

    pub fn is_ready(&self) -> bool {
        self.size.is_some()
    }

    pub fn size(&self) -> Option<(usize, usize)> {
        self.size
    }

    /// Trunk endpoints for a tree planted at horizontal position `x`.
    ///
    /// The trunk is vertical. Its base (`end`) sits `ground_offset` above
    /// the bottom edge and its top (`start`) is `trunk_height` higher.
    pub fn trunk_at(&self, x: f32) -> Option<(Point, Point)> {
        let (_, h) = self.size?;
        let base = h as f32 - self.cfg.tree.ground_offset;
        Some((
            Vec2::new(x, base - self.trunk_height),
            Vec2::new(x, base),
        ))
    }

    /// Starts growing a tree below `point`.
    ///
    /// Earlier trees are faded first. Ignored while another tree is growing
    /// or before [`Scene::initialize`].
    ///
    /// ### Returns
    /// `true` if a growth cycle started.
    pub fn on_trigger(&mut self, point: Point, now: Millis) -> bool {
        let Some((start, end)) = self.trunk_at(point.x) else {
            debug!("trigger ignored: scene not initialized");
            return false;
        };
        if !self.lock.try_acquire() {
            debug!("trigger ignored: a tree is still growing");
            return false;
        }

        self.forest.fade();

        let t = &self.cfg.tree;
        let segments = geometry::generate(
            start,
            end,
            self.trunk_height,
            t.trunk_width,
            0.0,
            t.spread_angle,
        );
        let timeline = growth::schedule(&segments, t.draw_speed, t.draw_interval);
        let total = timeline.total_duration();

        self.forest
            .plant(timeline, now, with_alpha(t.stroke_color, 255));
        self.lock.release_at(now + total);

        info!(
            "planting tree at x = {:.1}: {} segments over {} ms",
            point.x,
            segments.len(),
            total
        );
        true
    }

    /// Moves the hover preview under `point`.
    ///
    /// ### Returns
    /// `false` (and leaves the preview alone) while a tree is growing or
    /// before [`Scene::initialize`].
    pub fn on_hover(&mut self, point: Point) -> bool {
        if self.lock.is_held() {
            return false;
        }
        let Some((start, _)) = self.trunk_at(point.x) else {
            return false;
        };
        let w = self.cfg.tree.trunk_width;
        self.hover = Some(HoverPreview {
            min: Vec2::new(point.x - w / 2.0, start.y),
            size: Vec2::new(w, self.trunk_height),
        });
        true
    }

    /// Grows (`delta > 0`) or shrinks the trunk by `delta` scale steps.
    ///
    /// The height stays within the configured range. An existing hover
    /// preview is resized in place.
    ///
    /// ### Returns
    /// `false` while a tree is growing.
    pub fn on_scale_adjust(&mut self, delta: f32) -> bool {
        if self.lock.is_held() {
            return false;
        }
        let t = &self.cfg.tree;
        self.trunk_height = (self.trunk_height + delta * t.scale_step)
            .clamp(t.min_trunk_height, t.max_trunk_height);

        if let Some(prev) = self.hover {
            self.on_hover(Vec2::new(prev.min.x + prev.size.x / 2.0, 0.0));
        }
        true
    }

    /// Advances the scene clock to `now`.
    ///
    /// Growth steps are painted on every call. The builder lock is released
    /// once its deadline passes. Sky and ground update at most once per
    /// `sky.tick_interval`.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        if !self.is_ready() {
            return TickReport::default();
        }

        let strokes = self.forest.advance(now);
        let released = self.lock.release_if_due(now);

        let due = self
            .last_sky_tick
            .is_none_or(|last| now.saturating_sub(last) >= self.cfg.sky.tick_interval);
        if due {
            self.update_sky(now);
        }

        TickReport {
            strokes,
            released,
            sky_updated: due,
        }
    }

    fn update_sky(&mut self, now: Millis) {
        let ambience = self.sky.tick(now);
        self.ground.set_ambience(ambience);
        self.ground.retint();
        self.last_sky_tick = Some(now);
    }

    /// Composites all layers into `out`, resizing it if needed.
    ///
    /// ### Returns
    /// `false` (leaving `out` untouched) before [`Scene::initialize`].
    pub fn compose(&self, out: &mut Raster) -> bool {
        let Some((w, h)) = self.size else {
            return false;
        };
        if (out.width(), out.height()) != (w, h) {
            *out = Raster::new(w, h);
        }

        match self.sky.raster() {
            Some(sky) => out.pixels_mut().copy_from_slice(sky.pixels()),
            None => out.clear(),
        }
        if let Some(forest) = self.forest.raster() {
            out.composite(forest);
        }
        if let Some(ground) = self.ground.raster() {
            out.composite(ground);
        }
        if let Some(h) = self.hover {
            out.fill_rect(h.min.x, h.min.y, h.size.x, h.size.y, self.cfg.tree.preview_color);
        }
        true
    }

    /// Replaces the tree parameters used by the next trigger.
    ///
    /// The trunk height is re-clamped into the new range.
    pub fn set_tree_config(&mut self, tree: TreeConfig) -> Result<(), ConfigError> {
        let mut cfg = self.cfg.clone();
        cfg.tree = tree;
        cfg.tree.trunk_height = self
            .trunk_height
            .clamp(cfg.tree.min_trunk_height, cfg.tree.max_trunk_height.max(cfg.tree.min_trunk_height));
        cfg.validate()?;
        self.trunk_height = cfg.tree.trunk_height;
        self.cfg = cfg;
        Ok(())
    }

    pub fn set_fade_config(&mut self, fade: FadeConfig) {
        self.cfg.fade = fade;
        self.forest.set_fade(fade);
    }

    /// Wipes every tree. Ignored while one is growing.
    pub fn clear_forest(&mut self) -> bool {
        if self.lock.is_held() {
            return false;
        }
        self.forest.clear();
        true
    }

    /// Generates new terrain at the current size.
    pub fn regenerate_ground(&mut self, rng: &mut impl Rng) {
        self.ground.regenerate(rng);
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn trunk_height(&self) -> f32 {
        self.trunk_height
    }

    pub fn is_building(&self) -> bool {
        self.lock.is_held()
    }

    /// Clock time at which the current growth cycle ends, if one is active.
    pub fn building_until(&self) -> Option<Millis> {
        self.lock.deadline()
    }

    pub fn hover(&self) -> Option<&HoverPreview> {
        self.hover.as_ref()
    }

    pub fn ambience(&self) -> f32 {
        self.sky.ambience()
    }

    pub fn sky_frame(&self) -> &SkyFrame {
        self.sky.frame()
    }

    pub fn sky(&self) -> &Sky {
        &self.sky
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }
}
