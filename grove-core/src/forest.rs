//! The layer trees are grown on.

use log::debug;

use crate::{
    config::FadeConfig,
    fade,
    growth::{GrowthRun, Timeline},
    raster::{Raster, Surface},
    types::{Millis, Rgba},
};

pub struct Forest {
    fade: FadeConfig,
    raster: Option<Raster>,
    run: Option<GrowthRun>,
}

impl Forest {
    pub fn new(fade: FadeConfig) -> Self {
        Self {
            fade,
            raster: None,
            run: None,
        }
    }

    pub fn initialize(&mut self, width: usize, height: usize) {
        self.raster = Some(Raster::new(width, height));
        self.run = None;
    }

    pub fn set_fade(&mut self, fade: FadeConfig) {
        self.fade = fade;
    }

    /// Ages all previously drawn trees by one fade step.
    ///
    /// ### Returns
    /// The number of pixels that changed; `0` before initialization.
    pub fn fade(&mut self) -> usize {
        let Some(raster) = self.raster.as_mut() else {
            return 0;
        };
        let changed = fade::age(raster, self.fade.policy, self.fade.step);
        debug!("faded {changed} pixels ({:?})", self.fade.policy);
        changed
    }

    /// Starts revealing `timeline` at `now`, replacing any finished run.
    pub fn plant(&mut self, timeline: Timeline, now: Millis, color: Rgba) {
        if self.raster.is_none() {
            return;
        }
        self.run = Some(GrowthRun::new(timeline, now, color));
    }

    /// Paints every growth step due by `now`.
    pub fn advance(&mut self, now: Millis) -> usize {
        match (self.run.as_mut(), self.raster.as_mut()) {
            (Some(run), Some(raster)) => run.advance(now, raster),
            _ => 0,
        }
    }

    /// The most recent growth run, finished or not.
    pub fn run(&self) -> Option<&GrowthRun> {
        self.run.as_ref()
    }

    pub fn clear(&mut self) {
        if let Some(raster) = self.raster.as_mut() {
            raster.clear();
        }
        self.run = None;
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }
}
