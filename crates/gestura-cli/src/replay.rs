//! Offline replay of recorded detection sessions.
//!
//! A session file is JSON Lines, one object per captured frame:
//!
//! ```text
//! {"landmarks":[{"x":0.41,"y":0.70,"z":0.0}, ...], "rotation":90, "mirrored":true,
//!  "handedness":"Right", "score":0.97, "probabilities":[0.05,0.05,0.05,0.85]}
//! {"rotation":90, "mirrored":true}
//! ```
//!
//! Omitting `landmarks` records a frame without a hand.  `probabilities` is
//! the classifier output captured for that frame; it is only consumed when
//! the recognizer actually classifies, and a missing value there replays as
//! a failed prediction.  Replaying a session under a different
//! [`RecognizerConfig`] shows how hysteresis and smoothing settings change
//! the emitted labels.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use gestura_runtime::{HandDetector, Recognizer, RecognizerConfig, SequenceClassifier};
use gestura_types::{
    FeatureVector, GestureError, GestureResult, HandDetection, ImageFrame, Landmark,
    RecognitionStatus,
};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Session format
// ─────────────────────────────────────────────────────────────────────────────

/// One recorded frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f32>>,
}

/// Parse a JSON Lines session.  Blank lines and `#` comments are skipped.
pub fn parse_session<R: BufRead>(reader: R) -> Result<Vec<SessionFrame>, String> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read line {}: {}", i + 1, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: SessionFrame = serde_json::from_str(trimmed)
            .map_err(|e| format!("Invalid frame on line {}: {}", i + 1, e))?;
        frames.push(frame);
    }
    Ok(frames)
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// The recorded frame currently being replayed, shared by both collaborators.
#[derive(Default)]
struct Stage {
    detection: Option<HandDetection>,
    probabilities: Option<Vec<f32>>,
}

type SharedStage = Arc<Mutex<Stage>>;

struct ReplayDetector {
    stage: SharedStage,
}

impl HandDetector for ReplayDetector {
    fn detect(&mut self, _image: &ImageFrame) -> Result<Option<HandDetection>, GestureError> {
        let mut stage = self
            .stage
            .lock()
            .map_err(|_| GestureError::DetectorUnavailable("replay stage poisoned".into()))?;
        Ok(stage.detection.take())
    }
}

struct ReplayClassifier {
    stage: SharedStage,
}

impl SequenceClassifier for ReplayClassifier {
    fn predict(&mut self, _sequence: &[FeatureVector]) -> Result<Vec<f32>, GestureError> {
        let mut stage = self
            .stage
            .lock()
            .map_err(|_| GestureError::ClassifierUnavailable("replay stage poisoned".into()))?;
        stage.probabilities.take().ok_or_else(|| {
            GestureError::ClassifierUnavailable("no probabilities recorded for this frame".into())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay
// ─────────────────────────────────────────────────────────────────────────────

/// Counts per result status, plus the last label emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub no_hand: usize,
    pub collecting: usize,
    pub predicted: usize,
    pub failed: usize,
    pub rejected: usize,
    pub stable: usize,
    pub last_label: Option<String>,
}

impl ReplaySummary {
    fn record(&mut self, result: &GestureResult) {
        self.frames += 1;
        match result.status {
            RecognitionStatus::NoHand => self.no_hand += 1,
            RecognitionStatus::Collecting => self.collecting += 1,
            RecognitionStatus::Predicted => self.predicted += 1,
            RecognitionStatus::PredictionFailed => self.failed += 1,
            RecognitionStatus::Rejected => self.rejected += 1,
        }
        if result.is_stable {
            self.stable += 1;
        }
        if result.label.is_some() {
            self.last_label = result.label.clone();
        }
    }
}

/// Feed `frames` through a fresh recognizer, writing one JSON result per line.
///
/// # Errors
///
/// Fails if `config` is rejected by the recognizer, or on write errors.
pub fn replay<W: Write>(
    frames: &[SessionFrame],
    config: RecognizerConfig,
    out: &mut W,
) -> Result<ReplaySummary, String> {
    let stage: SharedStage = Arc::new(Mutex::new(Stage::default()));
    let mut recognizer = Recognizer::new(
        config,
        Box::new(ReplayDetector {
            stage: Arc::clone(&stage),
        }),
        Box::new(ReplayClassifier {
            stage: Arc::clone(&stage),
        }),
    )
    .map_err(|e| e.to_string())?;

    let mut summary = ReplaySummary::default();
    for frame in frames {
        {
            let mut s = stage
                .lock()
                .map_err(|_| "replay stage poisoned".to_string())?;
            s.detection = frame.landmarks.clone().map(|landmarks| HandDetection {
                landmarks,
                handedness: frame.handedness.clone(),
                score: frame.score,
            });
            s.probabilities = frame.probabilities.clone();
        }

        let image = ImageFrame {
            rotation_degrees: frame.rotation,
            mirrored: frame.mirrored,
            ..ImageFrame::default()
        };
        let result = recognizer.process_frame(&image);

        let line = serde_json::to_string(&result)
            .map_err(|e| format!("Failed to serialize result: {}", e))?;
        writeln!(out, "{line}").map_err(|e| format!("Failed to write result: {}", e))?;
        summary.record(&result);
    }
    Ok(summary)
}
