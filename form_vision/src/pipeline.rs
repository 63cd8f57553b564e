// THEORY:
// The `pipeline` module is the top-level API of the form engine. An
// `ActivitySession` owns everything one analyzed stream needs (the temporal window,
// the label stabilizer and the activity mode) and exposes the per-frame contract:
// push a feature record, then ask for the (label, score, confidence) assessment.
//
// Data flows strictly forward: features -> window -> statistics -> classifier ->
// stabilizer -> form scorer. The only state carried between frames is the window
// contents and the stabilizer. Sessions never share state, so any number of them can
// run side by side (see `parallel_pipeline`).

use crate::core_modules::activity::UNKNOWN_LABEL;
use crate::core_modules::classifier::predict;
use crate::core_modules::feature_extractor::extract_features;
use crate::core_modules::form_scorer::form_score;
use crate::core_modules::stabilizer::LabelStabilizer;
use crate::core_modules::statistics::aggregate;
use crate::core_modules::temporal_window::TemporalWindow;
use serde::{Deserialize, Serialize, Serializer};

// Re-export key data structures for the public API.
pub use crate::core_modules::activity::{ActivityClass, ActivityMode};
pub use crate::core_modules::feature_extractor::{FrameFeatures, PoseFeatures};
pub use crate::core_modules::keypoint::{FrameSize, Keypoint, KeypointSet, NormalizedLandmark};
pub use crate::core_modules::statistics::WindowStatistics;

const MIN_FPS: f64 = 1.0;
const MIN_STABILITY_THRESHOLD: u32 = 1;

/// Configuration for an `ActivitySession`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame rate of the analyzed stream. Floored at 1.0.
    pub fps: f64,
    /// Duration of the temporal window. The window never holds fewer than 8 frames.
    pub window_seconds: f64,
    /// Consecutive frames a new label must win before it is displayed.
    pub stability_threshold: u32,
    /// `"auto"`, or the name of an activity to force.
    pub mode: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            window_seconds: 3.0,
            stability_threshold: 3,
            mode: "auto".to_string(),
        }
    }
}

impl SessionConfig {
    /// Returns a copy with out-of-range values pulled back into range.
    pub fn clamped(&self) -> Self {
        Self {
            fps: if self.fps.is_finite() { self.fps.max(MIN_FPS) } else { MIN_FPS },
            window_seconds: self.window_seconds,
            stability_threshold: self.stability_threshold.max(MIN_STABILITY_THRESHOLD),
            mode: self.mode.clone(),
        }
    }
}

fn serialize_label<S: Serializer>(label: &Option<ActivityClass>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(label.map_or(UNKNOWN_LABEL, |class| class.as_str()))
}

/// The per-frame output of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    /// The displayed activity; `None` while the window holds no valid frame.
    #[serde(serialize_with = "serialize_label")]
    pub label: Option<ActivityClass>,
    /// Form quality in [0, 100].
    pub score: u8,
    /// Confidence of the classifier's best label, in [0, 1].
    pub confidence: f64,
}

impl Assessment {
    pub const UNKNOWN: Assessment = Assessment {
        label: None,
        score: 0,
        confidence: 0.0,
    };

    /// The label as reported to collaborators, `"unknown"` when there is none.
    pub fn label_name(&self) -> &'static str {
        self.label.map_or(UNKNOWN_LABEL, |class| class.as_str())
    }
}

/// One analyzed stream: its window, its hysteresis state and its mode.
#[derive(Debug, Clone)]
pub struct ActivitySession {
    config: SessionConfig,
    mode: ActivityMode,
    window: TemporalWindow,
    stabilizer: LabelStabilizer<ActivityClass>,
}

impl ActivitySession {
    pub fn new(config: SessionConfig) -> Self {
        let config = config.clamped();
        Self {
            mode: ActivityMode::parse(&config.mode),
            window: TemporalWindow::new(config.fps, config.window_seconds),
            stabilizer: LabelStabilizer::new(config.stability_threshold),
            config,
        }
    }

    /// Appends one frame's feature record to the window.
    pub fn push(&mut self, record: FrameFeatures) {
        self.window.push(record);
    }

    /// Classifies the current window and scores the displayed activity.
    ///
    /// With no valid frame in the window this returns [`Assessment::UNKNOWN`] and
    /// leaves the hysteresis state untouched.
    pub fn classify_and_score(&mut self) -> Assessment {
        self.assess().0
    }

    fn assess(&mut self) -> (Assessment, Option<WindowStatistics>) {
        let Some(stats) = aggregate(&self.window) else {
            return (Assessment::UNKNOWN, None);
        };

        let prediction = predict(&stats, &self.mode);
        let displayed = self.stabilizer.update(prediction.label);

        let assessment = Assessment {
            label: Some(displayed),
            score: form_score(Some(displayed), Some(&stats)),
            confidence: prediction.confidence,
        };
        (assessment, Some(stats))
    }

    /// Current window statistics, or `None` when the window holds no valid frame.
    pub fn current_statistics(&self) -> Option<WindowStatistics> {
        aggregate(&self.window)
    }

    /// Extracts, pushes and assesses one frame of keypoints.
    pub fn process_frame(&mut self, keypoints: &KeypointSet, frame: FrameSize) -> Assessment {
        self.process_frame_with_statistics(keypoints, frame).0
    }

    /// Like [`process_frame`](Self::process_frame), but also hands back the window
    /// statistics the assessment was computed from.
    pub fn process_frame_with_statistics(
        &mut self,
        keypoints: &KeypointSet,
        frame: FrameSize,
    ) -> (Assessment, Option<WindowStatistics>) {
        self.push(extract_features(keypoints, frame));
        self.assess()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> &ActivityMode {
        &self.mode
    }

    pub fn window(&self) -> &TemporalWindow {
        &self.window
    }

    pub fn displayed_label(&self) -> Option<ActivityClass> {
        self.stabilizer.displayed()
    }
}
