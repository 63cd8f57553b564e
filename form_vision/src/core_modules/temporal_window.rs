// THEORY:
// The `TemporalWindow` is the memory of a session. Activities are only
// recognizable over time (a single frame of a squat looks like a single frame of
// a burpee), so the window keeps the most recent few seconds of feature records and
// lets the statistics layer look at them as a whole.
//
// Key architectural principles:
// 1.  **Fixed-duration, fixed-capacity**: The capacity is decided once, from the
//     frame rate and the window duration, and never changes. Once full, the oldest
//     record is evicted for every new one (FIFO).
// 2.  **Parallel numeric channels**: Alongside the records the window keeps flat
//     `f64` series for the signals that need sequence math (hip x/y, both ankles,
//     shoulder width). These are only appended for valid frames, so they can be
//     shorter than the record history, and each one is bounded by the same capacity.
// 3.  **Standing baseline**: While the person is presumed upright (near-straight
//     knees) the window tracks a smoothed standing hip height and latches it once
//     enough upright frames have been seen. Nothing downstream reads it yet; it is
//     kept so the measurement is available for height-normalized scoring.

use crate::core_modules::feature_extractor::{FrameFeatures, PoseFeatures};
use std::collections::VecDeque;
use tracing::debug;

/// Smallest window the engine will run with, regardless of frame rate.
pub const MIN_WINDOW_FRAMES: usize = 8;

/// Knee angle above which a leg is considered straight.
const STANDING_KNEE_ANGLE: f64 = 150.0;
/// Weight of the previous estimate in the standing hip-height moving average.
const BASELINE_RETENTION: f64 = 0.95;
/// Seconds of upright frames needed before the baseline is latched.
const BASELINE_LATCH_SECONDS: f64 = 1.0;

/// Window capacity in frames: `max(8, round(fps × seconds))`. Saturates at `usize::MAX`.
pub fn window_capacity(fps: f64, window_seconds: f64) -> usize {
    let frames = (fps * window_seconds).round_ties_even();
    if frames.is_finite() && frames > MIN_WINDOW_FRAMES as f64 {
        frames as usize
    } else {
        MIN_WINDOW_FRAMES
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, capacity: usize, value: T) {
    history.push_back(value);
    if history.len() > capacity {
        history.pop_front();
    }
}

/// Flat numeric histories of the valid frames, one per tracked channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelSeries {
    pub hip_x: VecDeque<f64>,
    pub hip_y: VecDeque<f64>,
    pub left_ankle_x: VecDeque<f64>,
    pub left_ankle_y: VecDeque<f64>,
    pub right_ankle_x: VecDeque<f64>,
    pub right_ankle_y: VecDeque<f64>,
    pub shoulder_width: VecDeque<f64>,
}

impl ChannelSeries {
    fn record(&mut self, capacity: usize, features: &PoseFeatures) {
        push_bounded(&mut self.hip_x, capacity, features.hip_mid.x);
        push_bounded(&mut self.hip_y, capacity, features.hip_mid.y);
        push_bounded(&mut self.left_ankle_x, capacity, features.left_ankle.x);
        push_bounded(&mut self.left_ankle_y, capacity, features.left_ankle.y);
        push_bounded(&mut self.right_ankle_x, capacity, features.right_ankle.x);
        push_bounded(&mut self.right_ankle_y, capacity, features.right_ankle.y);
        push_bounded(&mut self.shoulder_width, capacity, features.shoulder_width);
    }
}

/// Smoothed hip height observed while the legs were straight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandingBaseline {
    /// Exponential moving average of hip y over upright frames.
    pub hip_y: Option<f64>,
    /// Set once more than one second of upright frames sits in the window. Never cleared.
    pub initialized: bool,
}

/// Bounded, insertion-ordered history of one session's frames.
#[derive(Debug, Clone)]
pub struct TemporalWindow {
    fps: f64,
    capacity: usize,
    records: VecDeque<FrameFeatures>,
    series: ChannelSeries,
    baseline: StandingBaseline,
}

impl TemporalWindow {
    /// Creates an empty window. `fps` is expected to be already floored at 1.0.
    ///
    /// Nothing is allocated up front: the capacity is only a bound, and it can be
    /// far larger than any stream will ever fill.
    pub fn new(fps: f64, window_seconds: f64) -> Self {
        Self {
            fps,
            capacity: window_capacity(fps, window_seconds),
            records: VecDeque::new(),
            series: ChannelSeries::default(),
            baseline: StandingBaseline::default(),
        }
    }

    /// Appends one frame's record, evicting the oldest once the window is full.
    pub fn push(&mut self, record: FrameFeatures) {
        let upright = match &record {
            FrameFeatures::Valid(features) => {
                self.series.record(self.capacity, features);
                (features.avg_knee_angle > STANDING_KNEE_ANGLE).then_some(features.hip_mid.y)
            }
            FrameFeatures::Invalid => None,
        };
        push_bounded(&mut self.records, self.capacity, record);

        if let Some(hip_y) = upright {
            self.update_baseline(hip_y);
        }
    }

    fn update_baseline(&mut self, hip_y: f64) {
        if self.baseline.initialized {
            return;
        }

        self.baseline.hip_y = Some(match self.baseline.hip_y {
            Some(previous) => BASELINE_RETENTION * previous + (1.0 - BASELINE_RETENTION) * hip_y,
            None => hip_y,
        });

        let upright_frames = self
            .valid_records()
            .filter(|f| f.avg_knee_angle > STANDING_KNEE_ANGLE)
            .count();
        if upright_frames as f64 > self.fps * BASELINE_LATCH_SECONDS {
            self.baseline.initialized = true;
            debug!(hip_y = ?self.baseline.hip_y, upright_frames, "standing baseline latched");
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records (valid or not) currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &FrameFeatures> {
        self.records.iter()
    }

    pub fn valid_records(&self) -> impl Iterator<Item = &PoseFeatures> {
        self.records.iter().filter_map(FrameFeatures::as_valid)
    }

    pub fn series(&self) -> &ChannelSeries {
        &self.series
    }

    pub fn baseline(&self) -> StandingBaseline {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::geometry::Point;

    fn pose(hip_y: f64, knee: f64) -> FrameFeatures {
        FrameFeatures::Valid(PoseFeatures {
            shoulder_width: 100.0,
            hip_mid: Point::new(300.0, hip_y),
            hip_mid_normalized: Point::new(3.0, hip_y / 100.0),
            foot_distance: 0.6,
            wrist_distance: 1.0,
            left_knee_angle: knee,
            right_knee_angle: knee,
            avg_knee_angle: knee,
            knee_asymmetry: 0.0,
            avg_hip_angle: 175.0,
            avg_elbow_angle: 160.0,
            torso_angle: 90.0,
            left_ankle: Point::new(330.0, 550.0),
            right_ankle: Point::new(270.0, 550.0),
        })
    }

    #[test]
    fn capacity_follows_fps_with_a_floor() {
        assert_eq!(window_capacity(30.0, 3.0), 90);
        assert_eq!(window_capacity(1.0, 3.0), 8);
        assert_eq!(window_capacity(2.5, 3.0), 8);
        // 12.5 frames rounds half to even.
        assert_eq!(window_capacity(25.0, 0.5), 12);
        assert_eq!(window_capacity(29.97, 3.0), 90);
    }

    #[test]
    fn huge_windows_are_bounds_not_allocations() {
        assert_eq!(window_capacity(30.0, 1e30), usize::MAX);
        assert_eq!(window_capacity(1e12, 3.0), 3_000_000_000_000);
        assert_eq!(window_capacity(f64::MAX, f64::MAX), MIN_WINDOW_FRAMES);

        for (fps, seconds) in [(30.0, 1e30), (1e12, 3.0)] {
            let mut window = TemporalWindow::new(fps, seconds);
            for i in 0..20 {
                window.push(pose(i as f64, 170.0));
            }
            window.push(FrameFeatures::Invalid);
            assert_eq!(window.len(), 21);
            assert_eq!(window.series().hip_y.len(), 20);
            assert_eq!(window.series().hip_y.front(), Some(&0.0));
        }
    }

    #[test]
    fn fifo_eviction_keeps_most_recent() {
        let mut window = TemporalWindow::new(1.0, 3.0);
        assert_eq!(window.capacity(), 8);
        for i in 0..20 {
            window.push(pose(i as f64, 170.0));
        }
        assert_eq!(window.len(), 8);
        let kept: Vec<f64> = window.valid_records().map(|f| f.hip_mid.y).collect();
        assert_eq!(kept, (12..20).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(window.series().hip_y.len(), 8);
        assert_eq!(window.series().hip_y.front(), Some(&12.0));
    }

    #[test]
    fn invalid_frames_occupy_the_window_but_not_the_series() {
        let mut window = TemporalWindow::new(1.0, 3.0);
        window.push(pose(10.0, 170.0));
        window.push(FrameFeatures::Invalid);
        window.push(pose(11.0, 170.0));
        assert_eq!(window.len(), 3);
        assert_eq!(window.valid_records().count(), 2);
        assert_eq!(window.series().hip_y.len(), 2);
        assert_eq!(window.series().shoulder_width.len(), 2);
    }

    #[test]
    fn series_outlive_records_evicted_by_invalid_frames() {
        let mut window = TemporalWindow::new(1.0, 3.0);
        for i in 0..8 {
            window.push(pose(i as f64, 170.0));
        }
        for _ in 0..8 {
            window.push(FrameFeatures::Invalid);
        }
        assert_eq!(window.valid_records().count(), 0);
        assert_eq!(window.series().hip_y.len(), 8);
    }

    #[test]
    fn baseline_tracks_upright_frames_and_latches() {
        let mut window = TemporalWindow::new(4.0, 3.0);
        window.push(pose(300.0, 100.0));
        assert_eq!(window.baseline().hip_y, None);

        window.push(pose(200.0, 170.0));
        assert_eq!(window.baseline().hip_y, Some(200.0));
        window.push(pose(220.0, 170.0));
        let expected = 0.95 * 200.0 + 0.05 * 220.0;
        assert!((window.baseline().hip_y.unwrap() - expected).abs() < 1e-9);
        assert!(!window.baseline().initialized);

        // Latches once more than fps × 1s upright frames are in the window.
        window.push(pose(220.0, 170.0));
        window.push(pose(220.0, 170.0));
        assert!(!window.baseline().initialized);
        window.push(pose(220.0, 170.0));
        assert!(window.baseline().initialized);

        let latched = window.baseline().hip_y;
        window.push(pose(500.0, 170.0));
        assert_eq!(window.baseline().hip_y, latched);
    }
}
