// THEORY:
// Once the engine knows what the person is doing, the form scorer rates how well
// they are doing it. Each activity has its own 0-100 rubric built from the same
// window statistics the classifier uses (depth and symmetry for a squat, a flat
// torso for a plank, cadence for running) and evaluated by the shared term scorer.

use crate::core_modules::activity::ActivityClass;
use crate::core_modules::scoring::{Input, Term, Transform, evaluate};
use crate::core_modules::statistics::{Statistic, WindowStatistics};

use Statistic::*;
use Transform::{Ramp, Sigmoid, Tent};

const RUNNING: &[Term] = &[
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.8, x0: 2.0 }, 0.5),
    Term::new(Input::Stat(AnkleSpeedNorm), Ramp { zero_at: 0.0, one_at: 2.2 }, 0.35),
    Term::new(Input::Stat(DominantFrequency), Tent { center: 2.2, width: 1.6 }, 0.15),
];

const WALKING: &[Term] = &[
    Term::new(Input::Stat(DominantFrequency), Tent { center: 1.2, width: 1.0 }, 0.5),
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.6, x0: 1.2 }, 0.35),
    Term::new(Input::Stat(AnkleSpeedNorm), Ramp { zero_at: 0.0, one_at: 1.0 }, 0.15),
];

// Depth below 160 degrees, left/right symmetry, hip hinge near 90 degrees.
const SQUAT: &[Term] = &[
    Term::new(Input::Stat(MedianKneeAngle), Ramp { zero_at: 160.0, one_at: 80.0 }, 0.6),
    Term::new(Input::Stat(MedianKneeAsymmetry), Ramp { zero_at: 70.0, one_at: 0.0 }, 0.25),
    Term::new(Input::Stat(MedianHipAngle), Tent { center: 90.0, width: 50.0 }, 0.15),
];

const LUNGE: &[Term] = &[
    Term::new(Input::Stat(MedianKneeAsymmetry), Ramp { zero_at: 0.0, one_at: 60.0 }, 0.6),
    Term::new(Input::Stat(HipXStdNorm), Ramp { zero_at: 0.0, one_at: 0.5 }, 0.4),
];

const PUSHUP: &[Term] = &[
    Term::new(Input::Stat(MedianTorsoAngle), Ramp { zero_at: 40.0, one_at: 0.0 }, 0.6),
    Term::new(Input::Stat(MedianElbowAngle), Tent { center: 80.0, width: 60.0 }, 0.3),
    Term::new(Input::Stat(HipYRangeNorm), Ramp { zero_at: 0.3, one_at: 0.0 }, 0.1),
];

const PLANK: &[Term] = &[
    Term::new(Input::Stat(MedianTorsoAngle), Ramp { zero_at: 25.0, one_at: 0.0 }, 0.75),
    Term::new(Input::Stat(HipYStdNorm), Ramp { zero_at: 0.05, one_at: 0.0 }, 0.25),
];

const JUMPING_JACK: &[Term] = &[
    Term::new(Input::Stat(MedianWristDistance), Ramp { zero_at: 1.2, one_at: 2.0 }, 0.2),
    Term::new(Input::Stat(MedianFootDistance), Ramp { zero_at: 1.2, one_at: 2.0 }, 0.2),
    Term::new(Input::Stat(PeriodicityStrength), Sigmoid { k: 0.6, x0: 1.3 }, 0.6),
];

const SITUP: &[Term] = &[
    Term::new(Input::Stat(DominantFrequency), Tent { center: 1.0, width: 0.8 }, 0.5),
    Term::new(Input::Stat(HipYStdNorm), Ramp { zero_at: 0.0, one_at: 0.12 }, 0.5),
];

const BURPEE: &[Term] = &[
    Term::new(Input::Stat(HipYRangeNorm), Ramp { zero_at: 0.0, one_at: 0.6 }, 0.6),
    Term::new(Input::Stat(MedianTorsoAngle), Ramp { zero_at: 60.0, one_at: 0.0 }, 0.4),
];

const STANDING: &[Term] = &[
    Term::new(Input::Stat(AnkleSpeedNorm), Ramp { zero_at: 0.25, one_at: 0.0 }, 0.6),
    Term::new(Input::Stat(HipYStdNorm), Ramp { zero_at: 0.02, one_at: 0.0 }, 0.4),
];

/// Rubric of every class, in [`ActivityClass::ALL`] order.
pub const FORM_TABLE: [&[Term]; ActivityClass::COUNT] = [
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

/// Unrounded form quality in [0, 100]. No label or no statistics scores 0.
pub fn form_quality(label: Option<ActivityClass>, stats: Option<&WindowStatistics>) -> f64 {
    match (label, stats) {
        (Some(class), Some(stats)) => 100.0 * evaluate(FORM_TABLE[class.index()], stats),
        _ => 0.0,
    }
}

/// Form quality rounded half-to-even to a whole score.
pub fn form_score(label: Option<ActivityClass>, stats: Option<&WindowStatistics>) -> u8 {
    form_quality(label, stats).round_ties_even().clamp(0.0, 100.0) as u8
}
