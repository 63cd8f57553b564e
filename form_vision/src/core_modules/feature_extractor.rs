// THEORY:
// The feature extractor is the bridge between raw landmarks and biomechanics. It
// turns one frame's 33 keypoints into a compact record of the measurements the
// temporal layers care about: joint angles, limb separations and where the hips are.
//
// Key principles:
// 1.  **Gate first**: If the estimator is not confident about the core body
//     (mean visibility of the twelve shoulder/elbow/wrist/hip/knee/ankle landmarks
//     below 0.12), the frame is marked `Invalid` and nothing else is computed. An
//     invalid frame is "no information", never an error.
// 2.  **Scale invariance**: Shoulder width is the body's own ruler. Separations and
//     the hip position are divided by it so a person near the camera and a person far
//     away produce comparable numbers.
// 3.  **Stateless**: The extractor is a pure function of one frame. All memory lives
//     in the temporal window.

use crate::core_modules::geometry::geometry::{Degrees, Pixels, Point, angle_at, distance, torso_angle};
use crate::core_modules::keypoint::{FrameSize, Joint, KeypointSet};
use tracing::trace;

/// Frames whose core landmarks average below this visibility are unusable.
pub const MIN_CORE_VISIBILITY: f64 = 0.12;

/// Floor applied to the shoulder width before it is used as a divisor.
const MIN_SHOULDER_WIDTH: Pixels = 1e-6;

/// Biomechanical measurements for one usable frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFeatures {
    /// Distance between the shoulders in pixels. The normalization scale for everything else.
    pub shoulder_width: Pixels,
    /// Midpoint of the hips in pixels.
    pub hip_mid: Point,
    /// Midpoint of the hips divided by shoulder width.
    pub hip_mid_normalized: Point,
    /// Ankle separation in shoulder widths.
    pub foot_distance: f64,
    /// Wrist separation in shoulder widths.
    pub wrist_distance: f64,
    /// Hip-knee-ankle angle, left leg.
    pub left_knee_angle: Degrees,
    /// Hip-knee-ankle angle, right leg.
    pub right_knee_angle: Degrees,
    pub avg_knee_angle: Degrees,
    /// Absolute difference between the two knee angles.
    pub knee_asymmetry: Degrees,
    /// Mean shoulder-hip-knee angle.
    pub avg_hip_angle: Degrees,
    /// Mean shoulder-elbow-wrist angle.
    pub avg_elbow_angle: Degrees,
    /// Shoulder-to-hip inclination from horizontal, in [0, 90].
    pub torso_angle: Degrees,
    pub left_ankle: Point,
    pub right_ankle: Point,
}

/// The per-frame record handed to the temporal window.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameFeatures {
    /// The core landmarks were not visible enough to measure anything.
    Invalid,
    Valid(PoseFeatures),
}

impl FrameFeatures {
    pub fn is_valid(&self) -> bool {
        matches!(self, FrameFeatures::Valid(_))
    }

    pub fn as_valid(&self) -> Option<&PoseFeatures> {
        match self {
            FrameFeatures::Valid(features) => Some(features),
            FrameFeatures::Invalid => None,
        }
    }
}

/// Computes the feature record for one frame.
///
/// `frame` is used to project normalized keypoints into pixels; pixel-space
/// keypoints are measured as they are.
pub fn extract_features(keypoints: &KeypointSet, frame: FrameSize) -> FrameFeatures {
    let visibility = keypoints.core_visibility();
    if visibility < MIN_CORE_VISIBILITY {
        trace!(visibility, "core landmarks not visible, frame skipped");
        return FrameFeatures::Invalid;
    }

    let kp = keypoints.to_pixel_space(frame);

    let left_shoulder = kp.position(Joint::LeftShoulder);
    let right_shoulder = kp.position(Joint::RightShoulder);
    let left_hip = kp.position(Joint::LeftHip);
    let right_hip = kp.position(Joint::RightHip);
    let left_knee = kp.position(Joint::LeftKnee);
    let right_knee = kp.position(Joint::RightKnee);
    let left_ankle = kp.position(Joint::LeftAnkle);
    let right_ankle = kp.position(Joint::RightAnkle);
    let left_wrist = kp.position(Joint::LeftWrist);
    let right_wrist = kp.position(Joint::RightWrist);
    let left_elbow = kp.position(Joint::LeftElbow);
    let right_elbow = kp.position(Joint::RightElbow);

    let shoulder_mid = left_shoulder.midpoint(&right_shoulder);
    let hip_mid = left_hip.midpoint(&right_hip);
    let shoulder_width = distance(&left_shoulder, &right_shoulder).max(MIN_SHOULDER_WIDTH);

    // --- Joint angles ---
    let left_knee_angle = angle_at(&left_hip, &left_knee, &left_ankle);
    let right_knee_angle = angle_at(&right_hip, &right_knee, &right_ankle);
    let left_hip_angle = angle_at(&left_shoulder, &left_hip, &left_knee);
    let right_hip_angle = angle_at(&right_shoulder, &right_hip, &right_knee);
    let left_elbow_angle = angle_at(&left_shoulder, &left_elbow, &left_wrist);
    let right_elbow_angle = angle_at(&right_shoulder, &right_elbow, &right_wrist);

    let hip_scale = shoulder_width + 1e-6;

    FrameFeatures::Valid(PoseFeatures {
        shoulder_width,
        hip_mid,
        hip_mid_normalized: Point::new(hip_mid.x / hip_scale, hip_mid.y / hip_scale),
        foot_distance: distance(&left_ankle, &right_ankle) / shoulder_width,
        wrist_distance: distance(&left_wrist, &right_wrist) / shoulder_width,
        left_knee_angle,
        right_knee_angle,
        avg_knee_angle: (left_knee_angle + right_knee_angle) / 2.0,
        knee_asymmetry: (left_knee_angle - right_knee_angle).abs(),
        avg_hip_angle: (left_hip_angle + right_hip_angle) / 2.0,
        avg_elbow_angle: (left_elbow_angle + right_elbow_angle) / 2.0,
        torso_angle: torso_angle(&shoulder_mid, &hip_mid),
        left_ankle,
        right_ankle,
    })
}
