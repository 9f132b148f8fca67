//! Stroke-by-stroke growth of a generated tree.
//!
//! [`schedule`] turns the segments of one tree into a [`Timeline`] of
//! [`GrowthTask`]s. Segments start one after another, each after the sum of
//! the durations of the segments before it. A [`GrowthRun`] then drives the
//! timeline from a single clock. Pending stroke events sit in a min-heap and
//! [`GrowthRun::advance`] paints everything that is due.
//!
//! Timing law: every stroke event of a run is due no later than
//! `started_at + Timeline::total_duration()`. That is the moment the
//! builder lock may be released.

use std::{cmp::Reverse, collections::BinaryHeap};

use log::{debug, trace};

use crate::{
    geometry::Segment,
    raster::Surface,
    types::{Millis, Rgba},
};

/// A segment takes at most this many steps to appear.
pub const MAX_STEPS: u32 = 20;

/// Fraction revealed per step for segments longer than
/// `MAX_STEPS * draw_speed`.
pub const LONG_SEGMENT_INCREMENT: f32 = 1.0 / MAX_STEPS as f32;

/// When and how one segment is revealed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthTask {
    pub segment: Segment,
    /// Offset of the first step from the start of the run.
    pub delay: Millis,
    /// Share of the run's total duration reserved for this segment.
    pub duration: Millis,
    /// Fraction of the segment added per step.
    pub increment: f32,
    /// Number of partial strokes painted for this segment.
    pub steps: u32,
}

impl GrowthTask {
    /// Computes the step plan of `segment`, starting `delay` into the run.
    ///
    /// A zero-length segment is treated as already complete: one step at
    /// fraction 1 and no duration.
    pub fn new(segment: Segment, delay: Millis, draw_speed: f32, draw_interval: Millis) -> Self {
        let distance = segment.length();
        if distance <= 0.0 || !distance.is_finite() {
            return Self {
                segment,
                delay,
                duration: 0,
                increment: 1.0,
                steps: 1,
            };
        }

        let ratio = distance / draw_speed;
        let (increment, steps) = if ratio > MAX_STEPS as f32 {
            (LONG_SEGMENT_INCREMENT, MAX_STEPS)
        } else {
            (draw_speed / distance, (ratio.ceil() as u32).max(1))
        };
        let duration = draw_interval * (ratio.floor() as u64).min(MAX_STEPS as u64);

        Self {
            segment,
            delay,
            duration,
            increment,
            steps,
        }
    }

    /// Fraction of the segment drawn by `step` (0-based).
    ///
    /// The final step always reports exactly `1.0`.
    pub fn fraction(&self, step: u32) -> f32 {
        if step + 1 >= self.steps {
            1.0
        } else {
            ((step + 1) as f32 * self.increment).min(1.0)
        }
    }

    /// Offset from the start of the run at which `step` is painted.
    pub fn step_offset(&self, step: u32, draw_interval: Millis) -> Millis {
        self.delay + step as u64 * draw_interval
    }

    /// Paints the partial stroke of `step`, from `end` towards `start`.
    pub fn paint<S: Surface>(&self, step: u32, surface: &mut S, color: Rgba) {
        let seg = &self.segment;
        let tip = seg.end + (seg.start - seg.end) * self.fraction(step);
        surface.stroke(seg.end, tip, seg.width, color);
    }
}

/// The ordered step plan of one tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    tasks: Vec<GrowthTask>,
    draw_interval: Millis,
    total: Millis,
}

impl Timeline {
    pub fn tasks(&self) -> &[GrowthTask] {
        &self.tasks
    }

    /// Sum of all task durations; the builder lock is held this long.
    pub fn total_duration(&self) -> Millis {
        self.total
    }
}

/// Schedules `segments` one after another in the given order.
///
/// The first segment starts at offset `0`. After each segment the running
/// delay grows by `draw_interval * min(20, floor(distance / draw_speed))`.
///
/// ### Parameters
/// - `segments` - Segments in generation order (parent before children).
/// - `draw_speed` - Pixels revealed per step; must be positive.
/// - `draw_interval` - Milliseconds between two steps of one segment.
///
/// ### Returns
/// A [`Timeline`] whose total duration is the sum of all task durations.
pub fn schedule(segments: &[Segment], draw_speed: f32, draw_interval: Millis) -> Timeline {
    let mut delay: Millis = 0;
    let tasks: Vec<GrowthTask> = segments
        .iter()
        .map(|&segment| {
            let task = GrowthTask::new(segment, delay, draw_speed, draw_interval);
            delay += task.duration;
            task
        })
        .collect();

    debug!(
        "scheduled {} segments over {} ms",
        tasks.len(),
        delay
    );

    Timeline {
        tasks,
        draw_interval,
        total: delay,
    }
}

/// A pending partial stroke.
///
/// Field order makes the derived ordering `(due, task, step)`, so events
/// due at the same time run parent-first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct StrokeEvent {
    due: Millis,
    task: usize,
    step: u32,
}

/// A timeline being played back against a clock.
#[derive(Debug)]
pub struct GrowthRun {
    timeline: Timeline,
    started_at: Millis,
    color: Rgba,
    queue: BinaryHeap<Reverse<StrokeEvent>>,
    painted: usize,
}

impl GrowthRun {
    /// Starts playing `timeline` at clock time `started_at`.
    pub fn new(timeline: Timeline, started_at: Millis, color: Rgba) -> Self {
        let queue = timeline
            .tasks
            .iter()
            .enumerate()
            .map(|(task, t)| {
                Reverse(StrokeEvent {
                    due: started_at + t.delay,
                    task,
                    step: 0,
                })
            })
            .collect();

        Self {
            timeline,
            started_at,
            color,
            queue,
            painted: 0,
        }
    }

    /// Paints every stroke due at or before `now`, in due order.
    ///
    /// ### Returns
    /// The number of partial strokes painted by this call.
    pub fn advance<S: Surface>(&mut self, now: Millis, surface: &mut S) -> usize {
        let interval = self.timeline.draw_interval;
        let mut painted = 0;

        while let Some(Reverse(ev)) = self.queue.peek().copied() {
            if ev.due > now {
                break;
            }
            self.queue.pop();

            let task = &self.timeline.tasks[ev.task];
            trace!(
                "segment {} step {}/{} at {} ms",
                ev.task,
                ev.step + 1,
                task.steps,
                ev.due
            );
            task.paint(ev.step, surface, self.color);
            painted += 1;

            let next = ev.step + 1;
            if next < task.steps {
                self.queue.push(Reverse(StrokeEvent {
                    due: self.started_at + task.step_offset(next, interval),
                    task: ev.task,
                    step: next,
                }));
            }
        }

        self.painted += painted;
        painted
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn started_at(&self) -> Millis {
        self.started_at
    }

    /// Partial strokes painted so far.
    pub fn painted(&self) -> usize {
        self.painted
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry, types::Point};
    use glam::Vec2;

    /// Surface that only records stroke commands.
    #[derive(Default)]
    struct RecordingSurface {
        pub strokes: Vec<(Point, Point, f32)>,
        buf: Vec<u8>,
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> usize {
            0
        }
        fn height(&self) -> usize {
            0
        }
        fn clear(&mut self) {
            self.strokes.clear();
        }
        fn stroke(&mut self, from: Point, to: Point, width: f32, _color: Rgba) {
            self.strokes.push((from, to, width));
        }
        fn pixels(&self) -> &[u8] {
            &self.buf
        }
        fn pixels_mut(&mut self) -> &mut [u8] {
            &mut self.buf
        }
    }

    fn vertical(len: f32) -> Segment {
        Segment {
            start: Vec2::new(0.0, 0.0),
            end: Vec2::new(0.0, len),
            width: 6.0,
            height: len,
            angle: 0.0,
            depth: 0,
        }
    }

    const BLACK: Rgba = [0, 0, 0, 255];

    #[test]
    fn long_segment_uses_fixed_increment_and_caps_duration() {
        let t = GrowthTask::new(vertical(500.0), 0, 10.0, 15);
        assert_eq!(t.increment, LONG_SEGMENT_INCREMENT);
        assert_eq!(t.steps, 20);
        assert_eq!(t.duration, 20 * 15);
    }

    #[test]
    fn ratio_of_exactly_twenty_uses_speed_over_distance() {
        let t = GrowthTask::new(vertical(200.0), 0, 10.0, 15);
        assert!((t.increment - 10.0 / 200.0).abs() < 1e-9);
        assert_eq!(t.steps, 20);
        assert_eq!(t.duration, 20 * 15);

        let under = GrowthTask::new(vertical(199.5), 0, 10.0, 15);
        assert!((under.increment - 10.0 / 199.5).abs() < 1e-9);
        assert_eq!(under.steps, 20);
        assert_eq!(under.duration, 19 * 15);

        // Past the boundary the step count stops following the ratio.
        let over = GrowthTask::new(vertical(200.5), 0, 10.0, 15);
        assert_eq!(over.increment, LONG_SEGMENT_INCREMENT);
        assert_eq!(over.steps, MAX_STEPS);
    }

    #[test]
    fn short_segment_uses_speed_over_distance() {
        let t = GrowthTask::new(vertical(35.0), 0, 10.0, 15);
        assert!((t.increment - 10.0 / 35.0).abs() < 1e-6);
        assert_eq!(t.steps, 4);
        assert_eq!(t.duration, 3 * 15);
        assert!(t.step_offset(t.steps - 1, 15) <= t.delay + t.duration);
    }

    #[test]
    fn segment_shorter_than_one_step_has_no_duration() {
        let t = GrowthTask::new(vertical(4.0), 7, 10.0, 15);
        assert_eq!(t.steps, 1);
        assert_eq!(t.duration, 0);
        assert_eq!(t.fraction(0), 1.0);
    }

    #[test]
    fn zero_length_segment_is_already_complete() {
        let t = GrowthTask::new(vertical(0.0), 0, 10.0, 15);
        assert_eq!(t.steps, 1);
        assert_eq!(t.increment, 1.0);
        assert_eq!(t.duration, 0);
        assert_eq!(t.fraction(0), 1.0);
    }

    #[test]
    fn last_step_of_every_task_fits_in_its_duration() {
        for len in [0.5, 9.9, 10.0, 20.0, 35.0, 199.0, 200.0, 201.0, 1000.0] {
            let t = GrowthTask::new(vertical(len), 100, 10.0, 15);
            assert!(
                t.step_offset(t.steps - 1, 15) <= t.delay + t.duration,
                "len {len}: steps {} duration {}",
                t.steps,
                t.duration
            );
            assert_eq!(t.fraction(t.steps - 1), 1.0);
        }
    }

    #[test]
    fn delays_accumulate_and_total_is_sum_of_durations() {
        let segs = [vertical(200.0), vertical(35.0), vertical(4.0), vertical(90.0)];
        let tl = schedule(&segs, 10.0, 15);

        let delays: Vec<Millis> = tl.tasks().iter().map(|t| t.delay).collect();
        assert_eq!(delays, vec![0, 300, 345, 345]);

        let sum: Millis = tl.tasks().iter().map(|t| t.duration).sum();
        assert_eq!(tl.total_duration(), sum);
        assert_eq!(tl.total_duration(), 300 + 45 + 0 + 135);
    }

    #[test]
    fn run_finishes_exactly_by_total_duration() {
        let segs = geometry::generate(
            Vec2::new(100.0, 350.0),
            Vec2::new(100.0, 550.0),
            200.0,
            12.0,
            0.0,
            30.0,
        );
        let tl = schedule(&segs, 10.0, 15);
        let total = tl.total_duration();
        let expected_strokes: usize = tl.tasks().iter().map(|t| t.steps as usize).sum();

        let mut run = GrowthRun::new(tl, 1_000, BLACK);
        let mut surface = RecordingSurface::default();

        assert_eq!(run.started_at() + run.timeline().total_duration(), 1_000 + total);
        run.advance(1_000 + total - 1, &mut surface);
        run.advance(1_000 + total, &mut surface);

        assert!(run.is_finished());
        assert_eq!(run.painted(), expected_strokes);
        assert_eq!(surface.strokes.len(), expected_strokes);
    }

    #[test]
    fn nothing_is_painted_before_the_run_starts() {
        let tl = schedule(&[vertical(100.0)], 10.0, 15);
        let mut run = GrowthRun::new(tl, 500, BLACK);
        let mut surface = RecordingSurface::default();

        assert_eq!(run.advance(499, &mut surface), 0);
        assert!(surface.strokes.is_empty());
        assert_eq!(run.advance(500, &mut surface), 1);
    }

    #[test]
    fn strokes_grow_from_end_towards_start() {
        let tl = schedule(&[vertical(100.0)], 10.0, 10);
        let mut run = GrowthRun::new(tl, 0, BLACK);
        let mut surface = RecordingSurface::default();

        run.advance(1_000, &mut surface);

        assert_eq!(surface.strokes.len(), 10);
        let mut last_len = 0.0;
        for &(from, to, width) in &surface.strokes {
            assert_eq!(from, Vec2::new(0.0, 100.0));
            assert_eq!(width, 6.0);
            let len = from.distance(to);
            assert!(len > last_len);
            last_len = len;
        }
        assert_eq!(surface.strokes.last().unwrap().1, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn parent_paints_before_children_sharing_its_start_time() {
        let segs = [vertical(4.0), vertical(3.0), vertical(2.0)];
        let tl = schedule(&segs, 10.0, 15);
        assert!(tl.tasks().iter().all(|t| t.delay == 0));

        let mut run = GrowthRun::new(tl, 0, BLACK);
        let mut surface = RecordingSurface::default();
        run.advance(0, &mut surface);

        let lens: Vec<f32> = surface
            .strokes
            .iter()
            .map(|(a, b, _)| a.distance(*b))
            .collect();
        assert_eq!(lens, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn each_task_steps_are_spaced_by_draw_interval() {
        let tl = schedule(&[vertical(50.0)], 10.0, 20);
        let mut run = GrowthRun::new(tl, 0, BLACK);
        let mut surface = RecordingSurface::default();

        let mut per_tick = Vec::new();
        for now in (0..=100).step_by(10) {
            per_tick.push(run.advance(now, &mut surface));
        }
        // Steps due at 0, 20, 40, 60, 80.
        assert_eq!(per_tick, vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0]);
        assert!(run.is_finished());
    }
}
