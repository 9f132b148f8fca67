//! Interactive grove viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the [`Scene`] and implements
//! [`eframe::App`]. Each frame it forwards pointer input to the scene,
//! advances the scene clock, and uploads the composed raster as a texture.

use eframe::App;
use glam::Vec2;
use grove_core::{
    config::{Config, FadeConfig, TreeConfig},
    error::ConfigError,
    fade::FadePolicy,
    geometry::MAX_TRUNK_WIDTH,
    raster::{Raster, Surface},
    scene::{Scene, TickReport},
    types::Millis,
};
use log::{info, warn};
use rand::{SeedableRng, rngs::StdRng};

/// Converts egui time (seconds) to the scene clock.
fn now_ms(time: f64) -> Millis {
    (time.max(0.0) * 1000.0) as Millis
}

/// Scene size, in pixels, for a drawing area.
fn scene_size(rect: egui::Rect) -> (usize, usize) {
    (
        rect.width().max(0.0).floor() as usize,
        rect.height().max(0.0).floor() as usize,
    )
}

/// Maps a screen position into scene pixels (origin at the top-left of
/// `rect`, y down).
fn screen_to_scene(p: egui::Pos2, rect: egui::Rect) -> Vec2 {
    Vec2::new(p.x - rect.min.x, p.y - rect.min.y)
}

/// Inverse of [`screen_to_scene`].
fn scene_to_screen(p: Vec2, rect: egui::Rect) -> egui::Pos2 {
    egui::pos2(rect.min.x + p.x, rect.min.y + p.y)
}

/// Main application state for the interactive viewer.
///
/// ### Fields
/// - `scene` - Sky, forest and ground layers plus their clocks.
/// - `rng` - Source for star and terrain placement.
/// - `frame` - Composed scene, reused between frames.
/// - `texture` - GPU copy of `frame`.
///
/// - `tree_edit` - Tree parameters being edited in the config panel.
/// - `config_error` - Why the last edit was rejected, if it was.
/// - `last_tick` - What the most recent scene tick did.
pub struct Viewer {
    scene: Scene,
    rng: StdRng,
    frame: Raster,
    texture: Option<egui::TextureHandle>,

    tree_edit: TreeConfig,
    config_error: Option<String>,
    last_tick: TickReport,
}

impl Viewer {
    /// Creates a viewer around an uninitialized scene.
    ///
    /// The scene is sized on the first frame, once the drawing area is
    /// known.
    pub fn new(cfg: Config, seed: Option<u64>) -> Result<Self, ConfigError> {
        let tree_edit = cfg.tree.clone();
        let scene = Scene::new(cfg)?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            scene,
            rng,
            frame: Raster::new(0, 0),
            texture: None,
            tree_edit,
            config_error: None,
            last_tick: TickReport::default(),
        })
    }

    /// (Re)initializes the scene when the drawing area changes size.
    fn fit_scene(&mut self, size: (usize, usize), now: Millis) {
        if size.0 == 0 || size.1 == 0 || self.scene.size() == Some(size) {
            return;
        }
        if self.scene.is_ready() {
            info!("drawing area resized to {}x{}; rebuilding scene", size.0, size.1);
        }
        self.scene.initialize(size.0, size.1, now, &mut self.rng);
    }

    /// Pushes the edited tree parameters into the scene.
    fn apply_tree_edits(&mut self) {
        match self.scene.set_tree_config(self.tree_edit.clone()) {
            Ok(()) => {
                self.config_error = None;
                self.tree_edit.trunk_height = self.scene.trunk_height();
            }
            Err(e) => {
                warn!("rejected tree settings: {e}");
                self.config_error = Some(e.to_string());
            }
        }
    }

    fn set_fade_policy(&mut self, policy: FadePolicy) {
        let fade = FadeConfig {
            policy,
            ..self.scene.config().fade
        };
        self.scene.set_fade_config(fade);
    }

    /// Copies the composed scene into the texture, creating it on first use.
    fn upload(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        if !self.scene.compose(&mut self.frame) {
            return None;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [self.frame.width(), self.frame.height()],
            self.frame.pixels(),
        );
        let options = egui::TextureOptions::NEAREST;
        if let Some(texture) = self.texture.as_mut() {
            texture.set(image, options);
        } else {
            self.texture = Some(ctx.load_texture("scene", image, options));
        }
        self.texture.as_ref().map(|t| t.id())
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Helper to draw a labeled millisecond [`egui::DragValue`].
    fn labeled_drag_ms(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut Millis,
        range: std::ops::RangeInclusive<Millis>,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).suffix(" ms"))
                .changed()
        })
        .inner
    }

    /// Builds the top panel UI (ground, forest and fade controls).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("New ground").clicked() {
                    self.scene.regenerate_ground(&mut self.rng);
                }

                if ui
                    .add_enabled(!self.scene.is_building(), egui::Button::new("Clear trees"))
                    .clicked()
                {
                    self.scene.clear_forest();
                }

                ui.separator();
                ui.label("Fade:");
                let policy = self.scene.config().fade.policy;
                for (p, label) in [
                    (FadePolicy::AlphaDecay, "Transparent"),
                    (FadePolicy::Brighten, "Pale"),
                ] {
                    if ui.selectable_label(policy == p, label).clicked() {
                        self.set_fade_policy(p);
                    }
                }
            });
        });
    }

    /// Builds the bottom status bar (ambience, trunk height, growth state).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let sample = self.scene.sky_frame().sample;
                ui.label(format!(
                    "key-frame {} -> {} ({:.0}%)",
                    sample.from,
                    sample.to,
                    sample.t * 100.0
                ));
                if let Some(body) = self.scene.sky().celestial() {
                    ui.label(format!("{:?}", body.body));
                }
                ui.label(format!("ambience = {:.2}", self.scene.ambience()));
                ui.separator();
                match self.scene.building_until() {
                    Some(until) => ui.label(format!(
                        "growing until {:.1} s ({} strokes)",
                        until as f64 / 1000.0,
                        self.last_tick.strokes
                    )),
                    None => ui.label("ready"),
                };
                ui.label(format!("trunk = {:.0}", self.scene.trunk_height()));
            });
        });
    }

    /// Builds the right-hand configuration panel for tree parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Tree");

                let t = &mut self.tree_edit;
                let mut changed = false;

                ui.separator();
                ui.label("Shape");
                changed |= Self::labeled_drag_f32(ui, "trunk_width:", &mut t.trunk_width, 3.0..=MAX_TRUNK_WIDTH, 0.5);
                changed |= Self::labeled_drag_f32(ui, "spread_angle:", &mut t.spread_angle, 0.0..=90.0, 0.5);
                changed |= Self::labeled_drag_f32(
                    ui,
                    "min_trunk_height:",
                    &mut t.min_trunk_height,
                    10.0..=1000.0,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "max_trunk_height:",
                    &mut t.max_trunk_height,
                    10.0..=1000.0,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(ui, "scale_step:", &mut t.scale_step, 1.0..=100.0, 0.5);

                ui.separator();
                ui.label("Drawing");
                changed |= Self::labeled_drag_f32(ui, "draw_speed:", &mut t.draw_speed, 0.5..=100.0, 0.1);
                changed |= Self::labeled_drag_ms(ui, "draw_interval:", &mut t.draw_interval, 1..=500);

                if changed {
                    self.apply_tree_edits();
                }
                if let Some(err) = &self.config_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                if ui.button("Reset tree to default").clicked() {
                    self.tree_edit = TreeConfig::default();
                    self.apply_tree_edits();
                }
            });
    }

    /// Builds the central panel where the scene is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::click());
                let rect = response.rect;
                let now = now_ms(ctx.input(|i| i.time));

                self.fit_scene(scene_size(rect), now);

                if let Some(p) = response.hover_pos() {
                    self.scene.on_hover(screen_to_scene(p, rect));
                }

                if response.clicked()
                    && let Some(p) = response.interact_pointer_pos()
                {
                    self.scene.on_trigger(screen_to_scene(p, rect), now);
                }

                let scroll = ctx.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 && response.hovered() {
                    self.scene.on_scale_adjust(scroll.signum());
                }

                self.last_tick = self.scene.tick(now);

                if let Some(id) = self.upload(ctx) {
                    let (w, h) = (self.frame.width() as f32, self.frame.height() as f32);
                    let target = egui::Rect::from_min_max(
                        scene_to_screen(Vec2::ZERO, rect),
                        scene_to_screen(Vec2::new(w, h), rect),
                    );
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    ui.painter_at(rect)
                        .image(id, target, uv, egui::Color32::WHITE);
                }

                ctx.request_repaint();
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(12.0, 40.0), egui::vec2(800.5, 600.0))
    }

    #[test]
    fn screen_to_scene_and_back_is_roundtrip() {
        let rect = test_rect();
        for p in [Vec2::ZERO, Vec2::new(10.0, 5.0), Vec2::new(799.5, 599.25)] {
            let back = screen_to_scene(scene_to_screen(p, rect), rect);
            assert!((back - p).length() < 1e-4, "p={p:?}, back={back:?}");
        }
        assert_eq!(screen_to_scene(rect.min, rect), Vec2::ZERO);
    }

    #[test]
    fn scene_size_floors_the_drawing_area() {
        assert_eq!(scene_size(test_rect()), (800, 600));
    }

    #[test]
    fn clock_converts_seconds_to_millis() {
        assert_eq!(now_ms(0.0), 0);
        assert_eq!(now_ms(1.2345), 1234);
        assert_eq!(now_ms(-3.0), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = Config::default();
        cfg.sky.palette.truncate(1);
        assert!(Viewer::new(cfg, Some(1)).is_err());
    }

    #[test]
    fn fit_scene_initializes_once_per_size() {
        let mut viewer = Viewer::new(Config::default(), Some(3)).unwrap();
        viewer.fit_scene((0, 100), 0);
        assert!(!viewer.scene.is_ready());

        viewer.fit_scene((320, 240), 0);
        assert_eq!(viewer.scene.size(), Some((320, 240)));

        viewer.scene.on_trigger(Vec2::new(100.0, 0.0), 0);
        viewer.fit_scene((320, 240), 10);
        assert!(viewer.scene.is_building());
    }

    #[test]
    fn rejected_tree_edit_keeps_previous_settings() {
        let mut viewer = Viewer::new(Config::default(), Some(3)).unwrap();
        viewer.tree_edit.min_trunk_height = 500.0;
        viewer.apply_tree_edits();
        assert!(viewer.config_error.is_some());
        assert_eq!(viewer.scene.config().tree.min_trunk_height, 100.0);

        viewer.tree_edit = TreeConfig::default();
        viewer.tree_edit.spread_angle = 45.0;
        viewer.apply_tree_edits();
        assert!(viewer.config_error.is_none());
        assert_eq!(viewer.scene.config().tree.spread_angle, 45.0);
    }

    #[test]
    fn fade_policy_switch_keeps_step() {
        let mut viewer = Viewer::new(Config::default(), Some(3)).unwrap();
        viewer.set_fade_policy(FadePolicy::Brighten);
        let fade = viewer.scene.config().fade;
        assert_eq!(fade.policy, FadePolicy::Brighten);
        assert_eq!(fade.step, FadeConfig::default().step);
    }
}
