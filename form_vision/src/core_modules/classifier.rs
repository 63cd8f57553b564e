// THEORY:
// The classifier turns one statistics snapshot into a best guess at what the person
// is doing. It is deliberately simple and explainable: every activity has a short
// weighted formula over the window statistics (its "signature"), the formulas are
// evaluated side by side, and a sharpened softmax turns the raw scores into a
// confidence distribution.
//
// Key architectural principles:
// 1.  **Calibration is data**: The signatures live in `CLASSIFICATION_TABLE` and are
//     evaluated by the generic scorer in `scoring`. The weights and centers are frozen
//     calibration values and are not derived from anything else.
// 2.  **Per-frame and stateless**: This module only answers "what does this window look
//     like right now". Smoothing the answer over time is the stabilizer's job.
// 3.  **Override without blindness**: A fixed activity mode overrides the label but the
//     confidence still comes from the computed distribution, raised to a floor.

use crate::core_modules::activity::{ActivityClass, ActivityMode};
use crate::core_modules::scoring::{Input, Term, Transform, evaluate};
use crate::core_modules::statistics::{Statistic, WindowStatistics};

/// Multiplies score differences before exponentiation.
const SOFTMAX_SHARPNESS: f64 = 6.0;
const SOFTMAX_EPSILON: f64 = 1e-12;
/// Confidence floor when the mode names the reported class.
const FIXED_MODE_MIN_CONFIDENCE: f64 = 0.6;
/// Confidence floor when the mode names no known class.
const UNRECOGNIZED_MODE_MIN_CONFIDENCE: f64 = 0.55;

use Statistic::*;
use Transform::{InverseSigmoid, Ramp, Sigmoid, Tent};

const RUNNING: &[Term] = &[
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.8, x0: 2.0 }, 0.45),
    Term::new(Input::Stat(AnkleSpeedNorm), Sigmoid { k: 1.2, x0: 0.8 }, 0.3),
    Term::new(Input::Stat(HipXStdNorm), Sigmoid { k: 2.0, x0: 0.2 }, 0.15),
    Term::new(Input::Stat(DominantFrequency), Tent { center: 2.2, width: 1.4 }, 0.1),
];

const WALKING: &[Term] = &[
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.6, x0: 1.2 }, 0.5),
    Term::new(Input::Stat(DominantFrequency), Tent { center: 1.2, width: 0.9 }, 0.35),
    Term::new(Input::Stat(AnkleSpeedNorm), Sigmoid { k: 1.0, x0: 0.35 }, 0.15),
];

const SQUAT: &[Term] = &[
    Term::new(Input::Stat(MedianKneeAngle), Ramp { zero_at: 160.0, one_at: 80.0 }, 0.55),
    Term::new(Input::Stat(PeriodicityStrength), InverseSigmoid { k: 0.6, x0: 1.0 }, 0.3),
    Term::new(
        Input::Closeness { stat: MedianHipAngle, target: 90.0, base: 100.0 },
        Sigmoid { k: 0.05, x0: 40.0 },
        0.15,
    ),
];

const LUNGE: &[Term] = &[
    Term::new(Input::Stat(MedianKneeAsymmetry), Sigmoid { k: 0.15, x0: 20.0 }, 0.6),
    Term::new(Input::Stat(HipXStdNorm), Sigmoid { k: 2.0, x0: 0.12 }, 0.4),
];

const PUSHUP: &[Term] = &[
    Term::new(Input::Below(MedianTorsoAngle, 40.0), Sigmoid { k: 0.2, x0: 8.0 }, 0.6),
    Term::new(Input::Stat(MedianKneeAngle), Sigmoid { k: 0.03, x0: 120.0 }, 0.25),
    Term::new(Input::Stat(HipYRangeNorm), InverseSigmoid { k: 2.0, x0: 0.2 }, 0.15),
];

const PLANK: &[Term] = &[
    Term::new(Input::Below(MedianTorsoAngle, 40.0), Sigmoid { k: 0.2, x0: 8.0 }, 0.7),
    Term::new(Input::Stat(HipYStdNorm), InverseSigmoid { k: 3.0, x0: 0.05 }, 0.3),
];

// Arm and leg spread share 0.45 equally.
const JUMPING_JACK: &[Term] = &[
    Term::new(Input::Stat(MedianWristDistance), Sigmoid { k: 2.0, x0: 1.2 }, 0.225),
    Term::new(Input::Stat(MedianFootDistance), Sigmoid { k: 2.0, x0: 1.2 }, 0.225),
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.6, x0: 1.3 }, 0.55),
];

const SITUP: &[Term] = &[
    Term::new(Input::Stat(HipYStdNorm), Sigmoid { k: 6.0, x0: 0.06 }, 0.5),
    Term::new(Input::Stat(DominantFrequency), Tent { center: 1.0, width: 0.8 }, 0.5),
];

const BURPEE: &[Term] = &[
    Term::new(Input::Stat(HipYRangeNorm), Ramp { zero_at: 0.0, one_at: 0.6 }, 0.6),
    Term::new(Input::Stat(MedianTorsoAngle), InverseSigmoid { k: 0.08, x0: 50.0 }, 0.4),
];

const STANDING: &[Term] = &[
    Term::new(Input::Stat(AnkleSpeedNorm), InverseSigmoid { k: 1.5, x0: 0.15 }, 0.6),
    Term::new(Input::Stat(HipYStdNorm), InverseSigmoid { k: 4.0, x0: 0.03 }, 0.4),
];

/// Signature of every class, in [`ActivityClass::ALL`] order.
pub const CLASSIFICATION_TABLE: [&[Term]; ActivityClass::COUNT] = [
    RUNNING,
    WALKING,
    SQUAT,
    LUNGE,
    PUSHUP,
    PLANK,
    JUMPING_JACK,
    SITUP,
    BURPEE,
    STANDING,
];

/// The classifier's answer for a single window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: ActivityClass,
    pub confidence: f64,
}

/// Raw signature score of every class, indexed like [`ActivityClass::ALL`].
pub fn raw_scores(stats: &WindowStatistics) -> [f64; ActivityClass::COUNT] {
    CLASSIFICATION_TABLE.map(|terms| evaluate(terms, stats))
}

/// Sharpened softmax over raw scores. The result sums to 1.
pub fn confidence_distribution(raw: &[f64; ActivityClass::COUNT]) -> [f64; ActivityClass::COUNT] {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights = raw.map(|score| ((score - max) * SOFTMAX_SHARPNESS).exp());
    let total: f64 = weights.iter().sum::<f64>() + SOFTMAX_EPSILON;
    weights.map(|w| w / total)
}

/// Classifies one window, honoring the activity mode.
pub fn predict(stats: &WindowStatistics, mode: &ActivityMode) -> Prediction {
    let confidences = confidence_distribution(&raw_scores(stats));

    let mut best = 0;
    for (i, confidence) in confidences.iter().enumerate() {
        if *confidence > confidences[best] {
            best = i;
        }
    }
    let computed = Prediction {
        label: ActivityClass::ALL[best],
        confidence: confidences[best],
    };

    match mode {
        ActivityMode::Auto => computed,
        ActivityMode::Fixed(class) => Prediction {
            label: *class,
            confidence: computed.confidence.max(FIXED_MODE_MIN_CONFIDENCE),
        },
        ActivityMode::Unrecognized(_) => Prediction {
            confidence: computed.confidence.max(UNRECOGNIZED_MODE_MIN_CONFIDENCE),
            ..computed
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn standing_still() -> WindowStatistics {
        WindowStatistics {
            median_knee_angle: 180.0,
            median_torso_angle: 90.0,
            median_wrist_distance: 2.0,
            median_foot_distance: 0.6,
            median_knee_asymmetry: 0.0,
            median_hip_angle: 180.0,
            median_elbow_angle: 90.0,
            median_shoulder_width: 100.0,
            hip_y_std_norm: 0.0,
            hip_y_range_norm: 0.0,
            hip_x_std_norm: 0.0,
            dominant_frequency: 0.0,
            periodicity_strength: 0.0,
            ankle_speed_norm: 0.0,
            motion_energy: 60.0,
        }
    }

    #[test]
    fn table_weights_sum_to_one() {
        for (class, terms) in ActivityClass::ALL.iter().zip(CLASSIFICATION_TABLE) {
            let total: f64 = terms.iter().map(|t| t.weight).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
            assert!(!terms.is_empty(), "{class} has no terms");
        }
    }

    #[test]
    fn raw_scores_stay_in_unit_interval() {
        let scores = raw_scores(&standing_still());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn distribution_sums_to_one() {
        let samples = [
            [0.0; ActivityClass::COUNT],
            [0.9, 0.1, 0.3, 0.5, 0.2, 0.8, 0.4, 0.6, 0.7, 0.0],
            [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.31, 0.32, 0.33, 0.34, 0.35, 0.36, 0.37, 0.38, 0.39, 0.4],
        ];
        for raw in samples {
            let distribution = confidence_distribution(&raw);
            assert_relative_eq!(distribution.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            assert!(distribution.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn distribution_is_uniform_for_equal_scores() {
        let distribution = confidence_distribution(&[0.5; ActivityClass::COUNT]);
        for p in distribution {
            assert_relative_eq!(p, 0.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn still_upright_body_reads_as_standing() {
        let prediction = predict(&standing_still(), &ActivityMode::Auto);
        assert_eq!(prediction.label, ActivityClass::Standing);
        assert!(prediction.confidence > 0.1);
    }

    #[test]
    fn ties_go_to_the_earliest_class() {
        let distribution = confidence_distribution(&[0.5; ActivityClass::COUNT]);
        let mut best = 0;
        for (i, p) in distribution.iter().enumerate() {
            if *p > distribution[best] {
                best = i;
            }
        }
        assert_eq!(ActivityClass::ALL[best], ActivityClass::Running);
    }

    #[test]
    fn fixed_mode_forces_label_and_floor() {
        let prediction = predict(&standing_still(), &ActivityMode::Fixed(ActivityClass::Squat));
        assert_eq!(prediction.label, ActivityClass::Squat);
        assert!(prediction.confidence >= 0.6);
    }

    #[test]
    fn unrecognized_mode_keeps_label_and_raises_floor() {
        let auto = predict(&standing_still(), &ActivityMode::Auto);
        let prediction = predict(&standing_still(), &ActivityMode::Unrecognized("yoga".into()));
        assert_eq!(prediction.label, auto.label);
        assert_eq!(prediction.confidence, auto.confidence.max(0.55));
    }
}
