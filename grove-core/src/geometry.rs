//! Recursive fractal branch geometry.
//!
//! [`generate`] is pure: it only computes segments and never paints or
//! schedules anything. Drawing them over time is the job of
//! [`crate::growth`].

use crate::types::Point;
use glam::Vec2;

/// Each level shortens branches by this factor.
pub const LENGTH_RATIO: f32 = 1.5;

/// Each level thins branches by this many pixels.
pub const WIDTH_DECREMENT: f32 = 2.0;

/// Branches at or below this width are not emitted.
pub const MIN_WIDTH: f32 = 2.0;

/// Widest trunk a validated config may ask for (19 levels).
pub const MAX_TRUNK_WIDTH: f32 = 40.0;

/// One straight stroke of a tree.
///
/// `end` is the base of the branch (where it meets its parent) and `start`
/// is its tip, except for the trunk whose orientation is chosen by the
/// caller. Growth always reveals a segment from `end` towards `start`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub width: f32,
    /// Length the segment was generated with (`|end - start|` for branches).
    pub height: f32,
    /// Rotation from vertical, in degrees.
    pub angle: f32,
    /// Recursion level; the trunk is `0`.
    pub depth: u32,
}

impl Segment {
    /// Euclidean length of the stroke.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Generates every segment of a tree in pre-order.
///
/// The segment `(start, end)` is emitted first, then the whole left
/// subtree (rotated by `+spread`), then the whole right subtree
/// (`-spread`). Children start at the parent's `start`, are
/// `height / 1.5` long and `width - 2` wide. Nothing is emitted once
/// `width <= 2`.
///
/// ### Parameters
/// - `start`, `end` - Endpoints of the root segment.
/// - `height` - Length used to place the children of the root.
/// - `width` - Line width of the root segment.
/// - `current_angle` - Rotation of the root from vertical, in degrees.
/// - `spread` - Angle between a branch and its parent, in degrees.
///
/// ### Returns
/// All segments, parent before children.
pub fn generate(
    start: Point,
    end: Point,
    height: f32,
    width: f32,
    current_angle: f32,
    spread: f32,
) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segment_count(width.min(MAX_TRUNK_WIDTH)));
    grow(&mut out, start, end, height, width, current_angle, spread, 0);
    out
}

#[allow(clippy::too_many_arguments)]
fn grow(
    out: &mut Vec<Segment>,
    start: Point,
    end: Point,
    height: f32,
    width: f32,
    angle: f32,
    spread: f32,
    depth: u32,
) {
    if width <= MIN_WIDTH {
        return;
    }
    out.push(Segment {
        start,
        end,
        width,
        height,
        angle,
        depth,
    });

    let child_height = height / LENGTH_RATIO;
    let child_width = width - WIDTH_DECREMENT;

    for child_angle in [angle + spread, angle - spread] {
        let tip = child_tip(start, child_angle, child_height);
        grow(
            out,
            tip,
            start,
            child_height,
            child_width,
            child_angle,
            spread,
            depth + 1,
        );
    }
}

/// Endpoint of a branch of length `height` leaving `base` at `angle`
/// degrees from vertical (positive angles lean left, as y points down).
pub fn child_tip(base: Point, angle: f32, height: f32) -> Point {
    let rad = angle.to_radians();
    base - Vec2::new(rad.sin() * height, rad.cos() * height)
}

/// Number of recursion levels that emit segments for a trunk of `width`.
pub fn max_depth(width: f32) -> u32 {
    if width <= MIN_WIDTH {
        0
    } else {
        ((width - MIN_WIDTH) / WIDTH_DECREMENT).ceil() as u32
    }
}

/// Number of segments [`generate`] emits for a trunk of `width`.
///
/// Saturates at `usize::MAX` for trunks too wide to count.
pub fn segment_count(width: f32) -> usize {
    1usize
        .checked_shl(max_depth(width))
        .map_or(usize::MAX, |n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: Point, b: Point) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn width_at_or_below_minimum_emits_nothing() {
        for w in [-4.0, 0.0, 1.0, 1.999, 2.0] {
            let segs = generate(Vec2::ZERO, Vec2::new(0.0, 10.0), 100.0, w, 0.0, 30.0);
            assert!(segs.is_empty(), "width {w} emitted {} segments", segs.len());
        }
    }

    #[test]
    fn single_level_when_children_would_be_too_thin() {
        let segs = generate(Vec2::ZERO, Vec2::new(0.0, 10.0), 100.0, 4.0, 0.0, 30.0);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].width, 4.0);
        assert_eq!(segs[0].depth, 0);
    }

    #[test]
    fn children_are_shorter_thinner_and_rotated() {
        let start = Vec2::new(100.0, 350.0);
        let end = Vec2::new(100.0, 550.0);
        let segs = generate(start, end, 200.0, 20.0, 0.0, 30.0);

        assert_eq!(segs[0].start, start);
        assert_eq!(segs[0].end, end);
        assert_eq!(segs[0].width, 20.0);

        // Pre-order: the first child follows the trunk directly, the second
        // child starts after the whole left subtree.
        let left = segs[1];
        let right = segs[segment_count(18.0) + 1];

        for (child, angle) in [(left, 30.0), (right, -30.0)] {
            assert_eq!(child.width, 18.0);
            assert!((child.height - 133.333).abs() < EPS);
            assert_eq!(child.angle, angle);
            assert_eq!(child.depth, 1);
            assert_eq!(child.end, start);
            assert!((child.length() - child.height).abs() < EPS);
        }

        let half = 30f32.to_radians();
        assert!(close(
            left.start,
            Vec2::new(100.0 - half.sin() * 133.333, 350.0 - half.cos() * 133.333)
        ));
        assert!(close(
            right.start,
            Vec2::new(100.0 + half.sin() * 133.333, 350.0 - half.cos() * 133.333)
        ));
    }

    #[test]
    fn segment_count_matches_generated_tree() {
        for w in [3.0, 4.0, 5.0, 10.0, 20.0] {
            let segs = generate(Vec2::ZERO, Vec2::new(0.0, 1.0), 50.0, w, 0.0, 25.0);
            assert_eq!(segs.len(), segment_count(w), "width {w}");
        }
    }

    #[test]
    fn segment_count_saturates_for_huge_widths() {
        assert_eq!(segment_count(MAX_TRUNK_WIDTH), (1 << 19) - 1);
        assert_eq!(segment_count(140.0), usize::MAX);
        assert_eq!(segment_count(f32::INFINITY), usize::MAX);
    }

    #[test]
    fn depth_is_bounded_by_half_the_width() {
        for w in [3.0, 4.0, 7.5, 20.0, 24.0] {
            let segs = generate(Vec2::ZERO, Vec2::new(0.0, 1.0), 50.0, w, 0.0, 25.0);
            let deepest = segs.iter().map(|s| s.depth).max().unwrap();
            assert_eq!(deepest + 1, max_depth(w));
            assert!((max_depth(w) as f32) <= w / 2.0);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(Vec2::new(1.0, 2.0), Vec2::new(1.0, 9.0), 80.0, 12.0, 5.0, 17.0);
        let b = generate(Vec2::new(1.0, 2.0), Vec2::new(1.0, 9.0), 80.0, 12.0, 5.0, 17.0);
        assert_eq!(a, b);
    }

    #[test]
    fn widths_decrease_by_two_per_level() {
        let segs = generate(Vec2::ZERO, Vec2::new(0.0, 1.0), 50.0, 10.0, 0.0, 30.0);
        for s in &segs {
            assert_eq!(s.width, 10.0 - 2.0 * s.depth as f32);
        }
    }
}
