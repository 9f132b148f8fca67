use glam::Vec2;
use rand::Rng;

/// Square pixels of sky per star at density `1.0`.
pub const AREA_PER_STAR: f32 = 400.0;

/// Stars keep this far from the right and bottom edges when scattered.
pub const EDGE_MARGIN: f32 = 10.0;

/// Gray level of a star at full intensity.
pub const MAX_LEVEL: f32 = 192.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub pos: Vec2,
    /// Multiplier on the base drift speed.
    pub speed: f32,
}

/// Drifting stars that wrap around the horizontal extent of the sky.
#[derive(Clone, Debug, Default)]
pub struct StarField {
    stars: Vec<Star>,
    width: f32,
}

/// How stars look at a given ambience.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarLook {
    pub alpha: f32,
    pub level: u8,
}

/// Speed multiplier of the star at `index`.
///
/// Every 3rd star moves at 2.5x, every 23rd (not already a 3rd) at 5x.
pub fn speed_multiplier(index: usize) -> f32 {
    if index % 3 == 0 {
        2.5
    } else if index % 23 == 0 {
        5.0
    } else {
        1.0
    }
}

impl StarField {
    /// Scatters `floor(width * height / 400 * density)` stars at random.
    pub fn scatter(width: usize, height: usize, density: f32, rng: &mut impl Rng) -> Self {
        let (w, h) = (width as f32, height as f32);
        let count = (w * h / AREA_PER_STAR * density).floor().max(0.0) as usize;
        let max_x = (w - EDGE_MARGIN).max(1.0);
        let max_y = (h - EDGE_MARGIN).max(1.0);

        let stars = (0..count)
            .map(|i| Star {
                pos: Vec2::new(
                    rng.random_range(0.0..max_x).floor(),
                    rng.random_range(0.0..max_y).floor(),
                ),
                speed: speed_multiplier(i),
            })
            .collect();

        Self { stars, width: w }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Moves every star right by `base_speed * speed`, wrapping at the edge.
    pub fn drift(&mut self, base_speed: f32) {
        if self.width <= 0.0 {
            return;
        }
        for s in &mut self.stars {
            s.pos.x = (s.pos.x + base_speed * s.speed).rem_euclid(self.width);
        }
    }
}

/// Star appearance for `ambience`, or `None` while it is too bright.
///
/// Both opacity and gray level fall linearly as ambience rises from
/// `night_floor` (the darkest key-frame) towards `threshold`.
pub fn star_look(ambience: f32, threshold: f32, night_floor: f32) -> Option<StarLook> {
    if ambience >= threshold {
        return None;
    }
    let span = threshold - night_floor;
    if span <= 0.0 {
        return None;
    }
    let alpha = (1.0 - (ambience - night_floor) / span).clamp(0.0, 1.0);
    let intensity = (1.0 - (ambience / 2.0 - night_floor) / span).clamp(0.0, 1.0);
    Some(StarLook {
        alpha,
        level: (MAX_LEVEL * intensity).floor() as u8,
    })
}
