// THEORY:
// The `keypoint` module is the input contract of the form engine. The pose
// estimator is an external collaborator; all it hands us per frame is an ordered
// list of 33 body landmarks, each a 2D position plus a visibility score. This module
// gives that list a shape the rest of the engine can rely on.
//
// Key principles:
// 1.  **Always 33 entries**: A `KeypointSet` is a fixed-size array. Short detections
//     are right-padded with zero-visibility placeholders so that index arithmetic
//     downstream never has to check bounds.
// 2.  **One coordinate space for analysis**: Estimators usually report normalized
//     [0, 1] coordinates. Distances and angles are computed in pixels, so a
//     normalized set is projected onto the frame before feature extraction.
// 3.  **Per-frame ownership**: A keypoint set lives for exactly one frame. It is
//     consumed by the feature extractor and then dropped.

use crate::core_modules::geometry::geometry::Point;
use serde::{Deserialize, Serialize};

/// Number of landmarks the pose estimator reports per person.
pub const LANDMARK_COUNT: usize = 33;

/// The landmarks the engine reads, by their index in the estimator's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Joint {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

/// The twelve landmarks whose mean visibility decides whether a frame is usable.
pub const CORE_JOINTS: [Joint; 12] = [
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::LeftHip,
    Joint::RightHip,
    Joint::LeftKnee,
    Joint::RightKnee,
    Joint::LeftAnkle,
    Joint::RightAnkle,
    Joint::LeftWrist,
    Joint::RightWrist,
    Joint::LeftElbow,
    Joint::RightElbow,
];

/// Pixel dimensions of the frame the keypoints were detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which coordinate space a keypoint set's positions are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Fractions of the frame width and height, nominally in [0, 1].
    Normalized,
    /// Pixel coordinates of the analyzed frame.
    Pixel,
}

/// A single tracked landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in [0, 1].
    pub visibility: f64,
}

impl Keypoint {
    pub const fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Placeholder used to pad short detections.
    pub const fn missing() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A landmark as reported by the pose estimator, before visibility is resolved.
///
/// Some estimator builds report `visibility`, some only `presence`. When neither is
/// present the landmark is trusted fully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub presence: Option<f64>,
}

impl NormalizedLandmark {
    pub fn resolved_visibility(&self) -> f64 {
        self.visibility.or(self.presence).unwrap_or(1.0)
    }
}

impl From<&NormalizedLandmark> for Keypoint {
    fn from(landmark: &NormalizedLandmark) -> Self {
        Keypoint::new(landmark.x, landmark.y, landmark.resolved_visibility())
    }
}

/// The full, fixed-size landmark list for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSet {
    points: [Keypoint; LANDMARK_COUNT],
    space: CoordinateSpace,
}

impl KeypointSet {
    /// Builds a set from raw detections, padding or truncating to 33 entries.
    pub fn new(detections: &[Keypoint], space: CoordinateSpace) -> Self {
        let mut points = [Keypoint::missing(); LANDMARK_COUNT];
        for (slot, detection) in points.iter_mut().zip(detections) {
            *slot = *detection;
        }
        Self { points, space }
    }

    pub fn from_pixels(detections: &[Keypoint]) -> Self {
        Self::new(detections, CoordinateSpace::Pixel)
    }

    pub fn from_normalized(detections: &[Keypoint]) -> Self {
        Self::new(detections, CoordinateSpace::Normalized)
    }

    /// Builds a normalized set straight from estimator landmarks.
    pub fn from_landmarks(landmarks: &[NormalizedLandmark]) -> Self {
        let detections: Vec<Keypoint> = landmarks.iter().map(Keypoint::from).collect();
        Self::from_normalized(&detections)
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn points(&self) -> &[Keypoint; LANDMARK_COUNT] {
        &self.points
    }

    pub fn joint(&self, joint: Joint) -> &Keypoint {
        &self.points[joint as usize]
    }

    pub fn position(&self, joint: Joint) -> Point {
        self.joint(joint).position()
    }

    /// Mean visibility over the twelve core joints.
    pub fn core_visibility(&self) -> f64 {
        let total: f64 = CORE_JOINTS.iter().map(|j| self.joint(*j).visibility).sum();
        total / CORE_JOINTS.len() as f64
    }

    /// Returns this set expressed in pixel coordinates of `frame`.
    ///
    /// Normalized positions are scaled, rounded half-to-even, and clamped into the
    /// frame. Pixel sets are returned unchanged.
    pub fn to_pixel_space(&self, frame: FrameSize) -> KeypointSet {
        if self.space == CoordinateSpace::Pixel {
            return self.clone();
        }

        let max_x = frame.width.saturating_sub(1) as f64;
        let max_y = frame.height.saturating_sub(1) as f64;
        let mut points = self.points;
        for point in points.iter_mut() {
            point.x = (point.x * frame.width as f64).round_ties_even().clamp(0.0, max_x);
            point.y = (point.y * frame.height as f64).round_ties_even().clamp(0.0, max_y);
        }
        KeypointSet {
            points,
            space: CoordinateSpace::Pixel,
        }
    }
}
