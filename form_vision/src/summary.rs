// THEORY:
// A session summary is what a reporting collaborator shows once a whole stream has
// been analyzed: how many frames there were, how the form scores went, what the
// engine settled on last, and the temporal descriptors of the last window that had
// any. The `SummaryAccumulator` collects these incrementally, one frame at a time,
// so the summary is available without keeping per-frame history around.

use crate::pipeline::{Assessment, SessionConfig, WindowStatistics};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Temporal descriptors of the last window that held valid frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalStats {
    #[serde(rename = "dom_freq")]
    pub dominant_frequency: f64,
    #[serde(rename = "periodic_strength")]
    pub periodicity_strength: f64,
    pub ankle_speed_norm: f64,
    pub hip_y_std_norm: f64,
}

impl From<&WindowStatistics> for TemporalStats {
    fn from(stats: &WindowStatistics) -> Self {
        Self {
            dominant_frequency: stats.dominant_frequency,
            periodicity_strength: stats.periodicity_strength,
            ankle_speed_norm: stats.ankle_speed_norm,
            hip_y_std_norm: stats.hip_y_std_norm,
        }
    }
}

/// Whole-stream report for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Every frame handed to the session, including frames with no detected person.
    pub frames_processed: u64,
    /// Frame rate as requested, before the session floored it.
    pub input_fps: f64,
    /// `frames_processed / input_fps`, or 0 when that rate is not positive.
    pub duration_seconds: f64,
    pub mode: String,
    /// Mean score over assessed frames.
    pub avg_score: Option<f64>,
    pub max_score: Option<u8>,
    pub last_label: Option<String>,
    pub last_score: Option<u8>,
    #[serde(rename = "last_conf")]
    pub last_confidence: Option<f64>,
    pub temporal_stats: Option<TemporalStats>,
    pub processing_time_seconds: f64,
}

/// Running totals from which a [`SessionSummary`] is produced.
#[derive(Debug, Clone, Default)]
pub struct SummaryAccumulator {
    frames_processed: u64,
    assessed_frames: u64,
    score_total: u64,
    max_score: Option<u8>,
    last_assessment: Option<Assessment>,
    last_statistics: Option<WindowStatistics>,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame. `assessment` is `None` when no person was detected.
    pub fn record(&mut self, assessment: Option<&Assessment>, statistics: Option<&WindowStatistics>) {
        self.frames_processed += 1;

        if let Some(assessment) = assessment {
            self.assessed_frames += 1;
            self.score_total += u64::from(assessment.score);
            self.max_score = Some(self.max_score.map_or(assessment.score, |max| max.max(assessment.score)));
            self.last_assessment = Some(*assessment);
        }
        if let Some(statistics) = statistics {
            self.last_statistics = Some(*statistics);
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Builds the summary. `config` should be the configuration the session was opened
    /// with, not its clamped copy, so the reported rate is the caller's.
    pub fn finish(&self, config: &SessionConfig, processing_time: Duration) -> SessionSummary {
        let duration_seconds = if config.fps > 0.0 {
            self.frames_processed as f64 / config.fps
        } else {
            0.0
        };
        let avg_score =
            (self.assessed_frames > 0).then(|| self.score_total as f64 / self.assessed_frames as f64);

        SessionSummary {
            frames_processed: self.frames_processed,
            input_fps: config.fps,
            duration_seconds,
            mode: config.mode.clone(),
            avg_score,
            max_score: self.max_score,
            last_label: self.last_assessment.map(|a| a.label_name().to_string()),
            last_score: self.last_assessment.map(|a| a.score),
            last_confidence: self.last_assessment.map(|a| a.confidence),
            temporal_stats: self.last_statistics.as_ref().map(TemporalStats::from),
            processing_time_seconds: processing_time.as_secs_f64(),
        }
    }
}
