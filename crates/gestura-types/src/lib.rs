use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of keypoints the hand-landmark detector reports per hand.
pub const NUM_LANDMARKS: usize = 21;

/// Coordinates per landmark (x, y, z).
pub const COORDS_PER_LANDMARK: usize = 3;

/// Length of one flattened frame (21 × [x, y, z]).
pub const FEATURE_COUNT: usize = NUM_LANDMARKS * COORDS_PER_LANDMARK;

/// One normalized frame as consumed by the sequence classifier.
pub type FeatureVector = [f32; FEATURE_COUNT];

/// A single hand keypoint.
///
/// `x` and `y` are normalized image coordinates (0..1); `z` is the detector's
/// relative depth and carries no fixed unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Flatten landmarks into `[x0, y0, z0, x1, y1, z1, ...]`.
pub fn flatten_landmarks(landmarks: &[Landmark]) -> Vec<f32> {
    landmarks.iter().flat_map(|l| [l.x, l.y, l.z]).collect()
}

/// The first hand reported by the detector for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    /// Sensor-space landmarks.  A well-formed detection has exactly
    /// [`NUM_LANDMARKS`] entries.
    pub landmarks: Vec<Landmark>,
    /// "Left" / "Right" as reported by the detector, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
    /// Detector confidence for this hand, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// A decoded image handed to the recognizer by the capture layer.
#[derive(Debug, Clone, Default)]
pub struct ImageFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data (RGB24).
    pub data: Vec<u8>,
    /// Sensor rotation in degrees.  `None` is treated as 0°.
    pub rotation_degrees: Option<i32>,
    /// `true` for front-facing capture that must be mirrored horizontally.
    pub mirrored: bool,
}

/// Which branch of the per-frame state machine produced a [`GestureResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStatus {
    /// No hand this frame (a miss, within or beyond the hysteresis window).
    NoHand,
    /// Hand present, sequence buffer still filling.
    Collecting,
    /// Classifier ran and a smoothed label is available.
    Predicted,
    /// Buffer was full but the classifier produced no usable output.
    PredictionFailed,
    /// The detection was malformed and the frame was discarded.
    Rejected,
}

/// Per-frame output of the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureResult {
    pub status: RecognitionStatus,
    /// Temporally smoothed label; `None` until a prediction has been made.
    pub label: Option<String>,
    /// Class index behind `label`.
    pub class_index: Option<usize>,
    /// Instantaneous classifier confidence of this frame's top class.
    pub confidence: f32,
    /// Full probability vector from the classifier (empty when not run).
    pub probabilities: Vec<f32>,
    pub hand_detected: bool,
    /// Fill level of the sequence buffer in `[0, 1]`.
    pub buffer_progress: f32,
    pub is_stable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_score: Option<f32>,
}

impl GestureResult {
    /// A frame with no hand.
    pub fn no_hand(buffer_progress: f32) -> Self {
        Self::empty(RecognitionStatus::NoHand, false, buffer_progress)
    }

    /// A frame with a hand while the sequence buffer is still filling.
    pub fn collecting(buffer_progress: f32) -> Self {
        Self::empty(RecognitionStatus::Collecting, true, buffer_progress)
    }

    /// A full-buffer frame whose classifier call failed.
    pub fn prediction_failed() -> Self {
        Self::empty(RecognitionStatus::PredictionFailed, true, 1.0)
    }

    /// A frame discarded because the detection was malformed.
    pub fn rejected(buffer_progress: f32) -> Self {
        Self::empty(RecognitionStatus::Rejected, true, buffer_progress)
    }

    fn empty(status: RecognitionStatus, hand_detected: bool, buffer_progress: f32) -> Self {
        Self {
            status,
            label: None,
            class_index: None,
            confidence: 0.0,
            probabilities: Vec::new(),
            hand_detected,
            buffer_progress: buffer_progress.clamp(0.0, 1.0),
            is_stable: false,
            handedness: None,
            detector_score: None,
        }
    }

    /// Attach the detector's handedness and score.
    pub fn with_detection_meta(mut self, handedness: Option<String>, score: Option<f32>) -> Self {
        self.handedness = handedness;
        self.detector_score = score;
        self
    }
}

/// Errors raised anywhere in the recognition pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GestureError {
    #[error("Invalid input shape: expected {expected} values, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    #[error("Non-finite input value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("Unsupported rotation: {0} degrees")]
    UnsupportedRotation(i32),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
