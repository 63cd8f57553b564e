// THEORY:
// Both the activity classifier and the form scorer are hand-calibrated weighted
// sums: each reads a few window statistics, bends every one of them into [0, 1]
// with a ramp, a tent or a logistic curve, and adds them up. This module holds the
// vocabulary for writing such a sum down as data (`Term`) and the single function
// that evaluates it.
//
// Keeping the calibration in tables means a class can be retuned or tested on its
// own without touching any control flow.

use crate::core_modules::statistics::{Statistic, WindowStatistics};

/// Standard logistic curve `1 / (1 + e^(-k (x - x0)))`.
pub fn logistic(x: f64, k: f64, x0: f64) -> f64 {
    1.0 / (1.0 + (-k * (x - x0)).exp())
}

/// The value a term reads from the statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// The statistic as it is.
    Stat(Statistic),
    /// `limit - statistic`.
    Below(Statistic, f64),
    /// `base - |target - statistic|`: large when the statistic is near `target`.
    Closeness { stat: Statistic, target: f64, base: f64 },
}

impl Input {
    fn read(&self, stats: &WindowStatistics) -> f64 {
        match *self {
            Input::Stat(stat) => stats.get(stat),
            Input::Below(stat, limit) => limit - stats.get(stat),
            Input::Closeness { stat, target, base } => base - (target - stats.get(stat)).abs(),
        }
    }
}

/// How a term maps its input into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Linear from 0 at `zero_at` to 1 at `one_at`, clipped. Either end may be the larger.
    Ramp { zero_at: f64, one_at: f64 },
    /// 1 at `center`, falling linearly to 0 at `center ± width`.
    Tent { center: f64, width: f64 },
    /// [`logistic`] with steepness `k` centered on `x0`.
    Sigmoid { k: f64, x0: f64 },
    /// `1 - logistic`.
    InverseSigmoid { k: f64, x0: f64 },
}

impl Transform {
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Transform::Ramp { zero_at, one_at } => ((x - zero_at) / (one_at - zero_at)).clamp(0.0, 1.0),
            Transform::Tent { center, width } => (1.0 - (center - x).abs() / width).clamp(0.0, 1.0),
            Transform::Sigmoid { k, x0 } => logistic(x, k, x0),
            Transform::InverseSigmoid { k, x0 } => 1.0 - logistic(x, k, x0),
        }
    }
}

/// One weighted contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub input: Input,
    pub transform: Transform,
    pub weight: f64,
}

impl Term {
    pub const fn new(input: Input, transform: Transform, weight: f64) -> Self {
        Self { input, transform, weight }
    }

    pub fn value(&self, stats: &WindowStatistics) -> f64 {
        self.weight * self.transform.apply(self.input.read(stats))
    }
}

/// Sums every term of a formula.
pub fn evaluate(terms: &[Term], stats: &WindowStatistics) -> f64 {
    terms.iter().map(|term| term.value(stats)).sum()
}
