// THEORY:
// The statistics aggregator condenses everything the temporal window remembers
// into one flat snapshot of descriptors. It is the only input the classifier and
// the form scorer ever see, which keeps both of them free of any sequence logic.
//
// Key principles:
// 1.  **Robust centers**: Posture descriptors are medians over the valid frames, so a
//     few badly tracked frames cannot drag them.
// 2.  **Body-relative motion**: Spreads and speeds are divided by the median shoulder
//     width, making them comparable across camera distances.
// 3.  **Recomputed, never patched**: A snapshot is rebuilt from the window on every
//     request. Cost is linear in the window size, and two requests without a push in
//     between always agree.

use crate::core_modules::feature_extractor::PoseFeatures;
use crate::core_modules::spectrum::periodicity;
use crate::core_modules::temporal_window::TemporalWindow;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Guards the shoulder-width divisor.
const SCALE_EPSILON: f64 = 1e-6;
/// Minimum hip-height samples before a spectrum is attempted.
const MIN_SPECTRUM_SAMPLES: usize = 8;
/// Seconds of hip-height samples before a spectrum is attempted, if longer than the minimum.
const MIN_SPECTRUM_SECONDS: f64 = 0.5;

/// Median of a slice. Returns NaN for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// A snapshot of descriptors computed from the current window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStatistics {
    pub median_knee_angle: f64,
    pub median_torso_angle: f64,
    pub median_wrist_distance: f64,
    pub median_foot_distance: f64,
    pub median_knee_asymmetry: f64,
    pub median_hip_angle: f64,
    pub median_elbow_angle: f64,
    pub median_shoulder_width: f64,
    /// Standard deviation of hip y, in shoulder widths.
    pub hip_y_std_norm: f64,
    /// Peak-to-peak hip y, in shoulder widths.
    pub hip_y_range_norm: f64,
    /// Standard deviation of hip x, in shoulder widths.
    pub hip_x_std_norm: f64,
    /// Dominant hip-height oscillation in Hz, 0 when the window is too short.
    pub dominant_frequency: f64,
    /// How far the dominant peak rises above the spectral background, 0 when too short.
    pub periodicity_strength: f64,
    /// Mean ankle speed in shoulder widths per second, averaged over both sides.
    pub ankle_speed_norm: f64,
    /// Mean ankle-to-ankle separation in pixels.
    pub motion_energy: f64,
}

/// Selects one descriptor from a [`WindowStatistics`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    MedianKneeAngle,
    MedianTorsoAngle,
    MedianWristDistance,
    MedianFootDistance,
    MedianKneeAsymmetry,
    MedianHipAngle,
    MedianElbowAngle,
    MedianShoulderWidth,
    HipYStdNorm,
    HipYRangeNorm,
    HipXStdNorm,
    DominantFrequency,
    PeriodicityStrength,
    AnkleSpeedNorm,
    MotionEnergy,
}

impl WindowStatistics {
    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::MedianKneeAngle => self.median_knee_angle,
            Statistic::MedianTorsoAngle => self.median_torso_angle,
            Statistic::MedianWristDistance => self.median_wrist_distance,
            Statistic::MedianFootDistance => self.median_foot_distance,
            Statistic::MedianKneeAsymmetry => self.median_knee_asymmetry,
            Statistic::MedianHipAngle => self.median_hip_angle,
            Statistic::MedianElbowAngle => self.median_elbow_angle,
            Statistic::MedianShoulderWidth => self.median_shoulder_width,
            Statistic::HipYStdNorm => self.hip_y_std_norm,
            Statistic::HipYRangeNorm => self.hip_y_range_norm,
            Statistic::HipXStdNorm => self.hip_x_std_norm,
            Statistic::DominantFrequency => self.dominant_frequency,
            Statistic::PeriodicityStrength => self.periodicity_strength,
            Statistic::AnkleSpeedNorm => self.ankle_speed_norm,
            Statistic::MotionEnergy => self.motion_energy,
        }
    }
}

fn to_vec(series: &VecDeque<f64>) -> Vec<f64> {
    series.iter().copied().collect()
}

/// Mean per-second displacement of one ankle, in shoulder widths.
fn ankle_speed(xs: &VecDeque<f64>, ys: &VecDeque<f64>, shoulder_width: f64, fps: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let steps: Vec<f64> = xs
        .iter()
        .zip(ys)
        .zip(xs.iter().zip(ys).skip(1))
        .map(|((x0, y0), (x1, y1))| (x1 - x0).hypot(y1 - y0))
        .collect();
    mean(&steps) / (shoulder_width + SCALE_EPSILON) * fps
}

/// Builds a snapshot from the window, or `None` when it holds no valid frame.
pub fn aggregate(window: &TemporalWindow) -> Option<WindowStatistics> {
    let valid: Vec<_> = window.valid_records().collect();
    if valid.is_empty() {
        return None;
    }
    let fps = window.fps();
    let series = window.series();

    let median_of = |pick: fn(&PoseFeatures) -> f64| -> f64 {
        median(&valid.iter().map(|f| pick(f)).collect::<Vec<_>>())
    };

    let median_shoulder_width = if series.shoulder_width.is_empty() {
        1.0
    } else {
        median(&to_vec(&series.shoulder_width))
    };
    let scale = median_shoulder_width + SCALE_EPSILON;

    // --- Hip spread ---
    let hip_y = if series.hip_y.is_empty() { vec![0.0] } else { to_vec(&series.hip_y) };
    let hip_x = if series.hip_x.is_empty() { vec![0.0] } else { to_vec(&series.hip_x) };
    let hip_y_range_norm = if hip_y.len() > 1 {
        let max = hip_y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = hip_y.iter().copied().fold(f64::INFINITY, f64::min);
        (max - min) / scale
    } else {
        0.0
    };

    // --- Rhythm ---
    let min_samples = MIN_SPECTRUM_SAMPLES.max((fps * MIN_SPECTRUM_SECONDS) as usize);
    let rhythm = if hip_y.len() >= min_samples {
        periodicity(&hip_y, fps)
    } else {
        Default::default()
    };

    // --- Ankle speed ---
    let ankle_speed_norm = if series.shoulder_width.is_empty() {
        0.0
    } else {
        let left = ankle_speed(&series.left_ankle_x, &series.left_ankle_y, median_shoulder_width, fps);
        let right = ankle_speed(&series.right_ankle_x, &series.right_ankle_y, median_shoulder_width, fps);
        (left + right) / 2.0
    };

    let separations: Vec<f64> = valid
        .iter()
        .map(|f| (f.left_ankle.x - f.right_ankle.x).hypot(f.left_ankle.y - f.right_ankle.y))
        .collect();

    Some(WindowStatistics {
        median_knee_angle: median_of(|f| f.avg_knee_angle),
        median_torso_angle: median_of(|f| f.torso_angle),
        median_wrist_distance: median_of(|f| f.wrist_distance),
        median_foot_distance: median_of(|f| f.foot_distance),
        median_knee_asymmetry: median_of(|f| f.knee_asymmetry),
        median_hip_angle: median_of(|f| f.avg_hip_angle),
        median_elbow_angle: median_of(|f| f.avg_elbow_angle),
        median_shoulder_width,
        hip_y_std_norm: population_std(&hip_y) / scale,
        hip_y_range_norm,
        hip_x_std_norm: population_std(&hip_x) / scale,
        dominant_frequency: rhythm.dominant_frequency,
        periodicity_strength: rhythm.strength,
        ankle_speed_norm,
        motion_energy: mean(&separations),
    })
}
