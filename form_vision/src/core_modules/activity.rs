// THEORY:
// The closed set of activities the engine can recognize, and the way a caller can
// pin the engine to one of them. The order of `ActivityClass::ALL` is significant:
// it is the order raw scores are laid out in, and the earliest class wins a tie.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Label reported when no statistics are available.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Mode string that lets the classifier choose freely.
pub const AUTO_MODE: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityClass {
    Running,
    Walking,
    Squat,
    Lunge,
    Pushup,
    Plank,
    JumpingJack,
    Situp,
    Burpee,
    Standing,
}

impl ActivityClass {
    pub const COUNT: usize = 10;

    pub const ALL: [ActivityClass; Self::COUNT] = [
        ActivityClass::Running,
        ActivityClass::Walking,
        ActivityClass::Squat,
        ActivityClass::Lunge,
        ActivityClass::Pushup,
        ActivityClass::Plank,
        ActivityClass::JumpingJack,
        ActivityClass::Situp,
        ActivityClass::Burpee,
        ActivityClass::Standing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityClass::Running => "running",
            ActivityClass::Walking => "walking",
            ActivityClass::Squat => "squat",
            ActivityClass::Lunge => "lunge",
            ActivityClass::Pushup => "pushup",
            ActivityClass::Plank => "plank",
            ActivityClass::JumpingJack => "jumping_jack",
            ActivityClass::Situp => "situp",
            ActivityClass::Burpee => "burpee",
            ActivityClass::Standing => "standing",
        }
    }

    /// Looks a class up by its exact lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.as_str() == name)
    }

    /// Position of this class in [`ActivityClass::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ActivityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the classifier chooses the label or is told what it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActivityMode {
    #[default]
    Auto,
    /// The caller named a known class; it is always the best label.
    Fixed(ActivityClass),
    /// The caller asked for something that is not a class. The classifier still
    /// chooses, with a raised confidence floor.
    Unrecognized(String),
}

impl ActivityMode {
    /// Interprets a mode string. Only the exact string `"auto"` selects automatic
    /// mode; anything else is matched case-insensitively against the class names.
    pub fn parse(mode: &str) -> Self {
        if mode == AUTO_MODE {
            return ActivityMode::Auto;
        }
        match ActivityClass::from_name(&mode.to_lowercase()) {
            Some(class) => ActivityMode::Fixed(class),
            None => {
                warn!(mode, "activity mode does not name a known class, classifying automatically");
                ActivityMode::Unrecognized(mode.to_string())
            }
        }
    }
}
