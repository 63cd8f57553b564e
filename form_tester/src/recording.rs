// Keypoint recordings are JSON lines, one frame per line:
// {"width": 640, "height": 480, "landmarks": [{"x": 0.5, "y": 0.4, "visibility": 0.9}, ...]}
// `landmarks` is null (or absent) on frames where the estimator found nobody.

use anyhow::{Context, Result};
use form_vision::pipeline::{FrameSize, KeypointSet, NormalizedLandmark};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedFrame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Option<Vec<NormalizedLandmark>>,
}

impl RecordedFrame {
    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// The detection as a keypoint set, or `None` when nobody was found.
    pub fn keypoints(&self) -> Option<KeypointSet> {
        self.landmarks.as_deref().map(KeypointSet::from_landmarks)
    }
}

/// Parses a whole recording. Blank lines are skipped.
pub fn parse_recording(contents: &str) -> Result<Vec<RecordedFrame>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid frame on line {}", index + 1))
        })
        .collect()
}

pub async fn load_recording(path: &Path) -> Result<Vec<RecordedFrame>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    parse_recording(&contents).with_context(|| format!("failed to parse recording {}", path.display()))
}
