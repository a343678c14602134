//! [`Recognizer`] – the per-frame gesture state machine.
//!
//! Wires the detector, the coordinate transform, the normalizer, the
//! [`SequenceBuffer`] and the [`PredictionSmoother`] together.  Every call to
//! [`Recognizer::process_frame`] advances the machine by exactly one frame and
//! returns exactly one [`GestureResult`]:
//!
//! 1. **Detect** – run the [`HandDetector`].  A detector error counts as a
//!    miss.
//! 2. **Miss** – bump the missed-frame counter.  Once it exceeds
//!    `missed_frame_threshold` the hand is considered lost and both buffers
//!    are cleared; shorter dropouts keep the collected context.
//! 3. **Hit** – reset the counter, map landmarks into display space,
//!    normalize, and append to the sequence buffer.
//! 4. **Collecting** – buffer not yet full: report fill progress only.
//! 5. **Predicting** – buffer full: classify, vote, and report the smoothed
//!    label together with the instantaneous confidence of the raw top class.
//!
//! # Phases
//!
//! | Phase | Condition |
//! |---|---|
//! | [`Phase::NoHand`] | no hand in the latest frame |
//! | [`Phase::Collecting`] | hand present, buffer filling |
//! | [`Phase::Predicting`] | hand present, buffer full, classifier invoked |
//!
//! # Buffering policy
//!
//! [`BufferingPolicy::Continuous`] slides the window and classifies on every
//! frame once full.  [`BufferingPolicy::SingleShot`] classifies once when the
//! window fills, then empties it and collects a fresh window.
//!
//! # Concurrency
//!
//! All mutable state lives in [`RecognizerState`] and is reachable only
//! through `&mut self`, so frames are processed one at a time in the order
//! they are handed in.  See [`worker`][crate::worker] for running a
//! recognizer on its own task.

use gestura_perception::{DisplayTransform, LandmarkNormalizer, NormalizerConfig};
use gestura_types::{
    GestureError, GestureResult, HandDetection, ImageFrame, Landmark, RecognitionStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::collaborator::{HandDetector, SequenceClassifier, argmax};
use crate::sequence_buffer::SequenceBuffer;
use crate::smoother::{
    DEFAULT_HISTORY_SIZE, DEFAULT_MIN_SAMPLES, DEFAULT_STABILITY_THRESHOLD, PredictionSmoother,
    SmootherConfig,
};

/// Default number of frames per classifier call (N).
pub const DEFAULT_SEQUENCE_LENGTH: usize = 15;

/// Default number of consecutive misses tolerated before the hand is lost.
pub const DEFAULT_MISSED_FRAME_THRESHOLD: u32 = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// When the classifier runs once the sequence buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferingPolicy {
    /// Classify on every frame over a sliding window.
    #[default]
    Continuous,
    /// Classify once per full window, then start a fresh window.
    SingleShot,
}

impl std::fmt::Display for BufferingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferingPolicy::Continuous => write!(f, "continuous"),
            BufferingPolicy::SingleShot => write!(f, "single_shot"),
        }
    }
}

impl std::str::FromStr for BufferingPolicy {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "single_shot" | "single-shot" | "singleshot" => Ok(Self::SingleShot),
            other => Err(GestureError::InvalidConfig(format!(
                "unknown buffering policy: {other}"
            ))),
        }
    }
}

/// Configuration bundle for [`Recognizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Frames per classifier call (N).
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
    /// Consecutive misses tolerated before both buffers are cleared.
    #[serde(default = "default_missed_frame_threshold")]
    pub missed_frame_threshold: u32,
    /// Prediction history window (M).
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Fraction of the history the voted class must occupy to be stable.
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: f32,
    /// History fill below which a label is never reported stable.
    #[serde(default = "default_min_stable_samples")]
    pub min_stable_samples: usize,
    #[serde(default)]
    pub policy: BufferingPolicy,
    /// Class index → label.  When empty, labels are rendered as `class_<i>`
    /// and the classifier's output length is not checked.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

fn default_sequence_length() -> usize {
    DEFAULT_SEQUENCE_LENGTH
}
fn default_missed_frame_threshold() -> u32 {
    DEFAULT_MISSED_FRAME_THRESHOLD
}
fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}
fn default_stability_threshold() -> f32 {
    DEFAULT_STABILITY_THRESHOLD
}
fn default_min_stable_samples() -> usize {
    DEFAULT_MIN_SAMPLES
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            sequence_length: default_sequence_length(),
            missed_frame_threshold: default_missed_frame_threshold(),
            history_size: default_history_size(),
            stability_threshold: default_stability_threshold(),
            min_stable_samples: default_min_stable_samples(),
            policy: BufferingPolicy::default(),
            labels: Vec::new(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl RecognizerConfig {
    /// # Errors
    ///
    /// [`GestureError::InvalidConfig`] for a zero sequence length or history
    /// size, more required stable samples than the history can hold, a
    /// stability threshold outside `(0, 1]`, or invalid normalizer settings.
    pub fn validate(&self) -> Result<(), GestureError> {
        if self.sequence_length == 0 {
            return Err(GestureError::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.history_size == 0 {
            return Err(GestureError::InvalidConfig(
                "history_size must be at least 1".to_string(),
            ));
        }
        if self.min_stable_samples > self.history_size {
            return Err(GestureError::InvalidConfig(format!(
                "min_stable_samples ({}) exceeds history_size ({})",
                self.min_stable_samples, self.history_size
            )));
        }
        let t = self.stability_threshold;
        if !(t.is_finite() && t > 0.0 && t <= 1.0) {
            return Err(GestureError::InvalidConfig(format!(
                "stability_threshold must be in (0, 1], got {t}"
            )));
        }
        if self.labels.iter().any(|l| l.trim().is_empty()) {
            return Err(GestureError::InvalidConfig(
                "labels must not contain empty entries".to_string(),
            ));
        }
        self.normalizer.validate()
    }

    pub fn smoother_config(&self) -> SmootherConfig {
        SmootherConfig {
            history_size: self.history_size,
            stability_threshold: self.stability_threshold,
            min_samples: self.min_stable_samples,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Which branch the latest frame took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NoHand,
    Collecting,
    Predicting,
}

/// Everything the recognizer mutates between frames.
#[derive(Debug, Clone)]
pub struct RecognizerState {
    buffer: SequenceBuffer,
    history: PredictionSmoother,
    missed_frames: u32,
    last_landmarks: Option<Vec<Landmark>>,
    phase: Phase,
}

impl RecognizerState {
    fn new(config: &RecognizerConfig) -> Self {
        Self {
            buffer: SequenceBuffer::new(config.sequence_length),
            history: PredictionSmoother::new(config.smoother_config()),
            missed_frames: 0,
            last_landmarks: None,
            phase: Phase::NoHand,
        }
    }

    /// Drop all collected context (buffers and overlay landmarks).
    fn clear_context(&mut self) {
        self.buffer.clear();
        self.history.clear();
        self.last_landmarks = None;
    }

    pub fn buffer(&self) -> &SequenceBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &PredictionSmoother {
        &self.history
    }

    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    pub fn last_landmarks(&self) -> Option<&[Landmark]> {
        self.last_landmarks.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recognizer
// ─────────────────────────────────────────────────────────────────────────────

/// The temporal gesture-classification pipeline.
///
/// Owns its collaborators; dropping the recognizer releases them.
pub struct Recognizer {
    config: RecognizerConfig,
    normalizer: LandmarkNormalizer,
    detector: Box<dyn HandDetector>,
    classifier: Box<dyn SequenceClassifier>,
    state: RecognizerState,
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Recognizer {
    /// Build a recognizer around already-initialised collaborators.
    ///
    /// # Errors
    ///
    /// [`GestureError::InvalidConfig`] if `config` fails
    /// [`RecognizerConfig::validate`].  No recognizer is produced in that case.
    pub fn new(
        config: RecognizerConfig,
        detector: Box<dyn HandDetector>,
        classifier: Box<dyn SequenceClassifier>,
    ) -> Result<Self, GestureError> {
        config.validate()?;
        info!(
            sequence_length = config.sequence_length,
            missed_frame_threshold = config.missed_frame_threshold,
            history_size = config.history_size,
            policy = %config.policy,
            classes = config.labels.len(),
            "recognizer initialised"
        );
        Ok(Self {
            normalizer: LandmarkNormalizer::new(config.normalizer),
            state: RecognizerState::new(&config),
            config,
            detector,
            classifier,
        })
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn state(&self) -> &RecognizerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Display-space landmarks of the most recent accepted hand.
    pub fn last_landmarks(&self) -> Option<&[Landmark]> {
        self.state.last_landmarks()
    }

    /// Clear both buffers, the miss counter and the overlay landmarks.
    ///
    /// Call between frames only.
    pub fn reset(&mut self) {
        self.state.clear_context();
        self.state.missed_frames = 0;
        self.state.phase = Phase::NoHand;
        debug!("recognizer reset");
    }

    /// Advance the state machine by one captured image.
    #[instrument(
        level = "debug",
        skip_all,
        fields(rotation = ?image.rotation_degrees, mirrored = image.mirrored)
    )]
    pub fn process_frame(&mut self, image: &ImageFrame) -> GestureResult {
        let detection = match self.detector.detect(image) {
            Ok(detection) => detection,
            Err(e) => {
                warn!(error = %e, "detector failed; counting frame as a miss");
                None
            }
        };
        match detection {
            Some(hand) => {
                let transform = DisplayTransform::for_frame(image.rotation_degrees, image.mirrored);
                self.on_hand(hand, transform)
            }
            None => self.on_miss(),
        }
    }

    /// Advance the state machine with a detection produced elsewhere.
    ///
    /// Same transitions as [`process_frame`][Self::process_frame] minus the
    /// detector call.
    pub fn process_detection(
        &mut self,
        detection: Option<HandDetection>,
        transform: DisplayTransform,
    ) -> GestureResult {
        match detection {
            Some(hand) => self.on_hand(hand, transform),
            None => self.on_miss(),
        }
    }

    fn on_miss(&mut self) -> GestureResult {
        self.state.missed_frames = self.state.missed_frames.saturating_add(1);
        self.state.phase = Phase::NoHand;

        if self.state.missed_frames > self.config.missed_frame_threshold {
            let had_context = !self.state.buffer.is_empty()
                || !self.state.history.is_empty()
                || self.state.last_landmarks.is_some();
            if had_context {
                info!(
                    missed_frames = self.state.missed_frames,
                    "hand lost; clearing sequence and prediction history"
                );
            }
            self.state.clear_context();
            self.state.missed_frames = 0;
            return GestureResult::no_hand(0.0);
        }

        debug!(missed_frames = self.state.missed_frames, "transient miss; keeping buffers");
        GestureResult::no_hand(self.state.buffer.progress())
    }

    fn on_hand(&mut self, hand: HandDetection, transform: DisplayTransform) -> GestureResult {
        let HandDetection {
            landmarks,
            handedness,
            score,
        } = hand;

        let display = transform.apply_all(&landmarks);
        let frame = match self.normalizer.normalize_landmarks(&display) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "rejecting malformed detection");
                return GestureResult::rejected(self.state.buffer.progress())
                    .with_detection_meta(handedness, score);
            }
        };

        self.state.missed_frames = 0;
        self.state.last_landmarks = Some(display);
        self.state.buffer.add(frame);

        if !self.state.buffer.is_full() {
            self.state.phase = Phase::Collecting;
            return GestureResult::collecting(self.state.buffer.progress())
                .with_detection_meta(handedness, score);
        }

        self.state.phase = Phase::Predicting;
        self.classify(handedness, score)
    }

    fn classify(&mut self, handedness: Option<String>, score: Option<f32>) -> GestureResult {
        let Some(sequence) = self.state.buffer.get_sequence() else {
            return GestureResult::collecting(self.state.buffer.progress())
                .with_detection_meta(handedness, score);
        };

        let probabilities = match self
            .classifier
            .predict(&sequence)
            .and_then(|p| self.check_output(p))
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "prediction failed; keeping buffers");
                return GestureResult::prediction_failed().with_detection_meta(handedness, score);
            }
        };

        let Some((top_class, confidence)) = argmax(&probabilities) else {
            warn!("classifier output has no finite probabilities");
            return GestureResult::prediction_failed().with_detection_meta(handedness, score);
        };

        self.state.history.add_prediction(top_class);
        let voted = self.state.history.smoothed_prediction().unwrap_or(top_class);
        let is_stable = self.state.history.is_stable();
        debug!(top_class, confidence, voted, is_stable, "classified window");

        if self.config.policy == BufferingPolicy::SingleShot {
            self.state.buffer.clear();
        }

        GestureResult {
            status: RecognitionStatus::Predicted,
            label: Some(self.label_for(voted)),
            class_index: Some(voted),
            confidence: confidence.clamp(0.0, 1.0),
            probabilities,
            hand_detected: true,
            buffer_progress: 1.0,
            is_stable,
            handedness,
            detector_score: score,
        }
    }

    fn check_output(&self, probabilities: Vec<f32>) -> Result<Vec<f32>, GestureError> {
        if probabilities.is_empty() {
            return Err(GestureError::ClassifierUnavailable(
                "empty probability vector".to_string(),
            ));
        }
        let classes = self.config.labels.len();
        if classes > 0 && probabilities.len() != classes {
            return Err(GestureError::ClassifierUnavailable(format!(
                "expected {classes} probabilities, got {}",
                probabilities.len()
            )));
        }
        Ok(probabilities)
    }

    fn label_for(&self, class_index: usize) -> String {
        self.config
            .labels
            .get(class_index)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_index}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gestura_perception::Rotation;
    use gestura_types::{FeatureVector, NUM_LANDMARKS};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // ── Mock collaborators ──────────────────────────────────────────────────

    /// Replays a fixed list of detector outcomes, then reports no hand.
    struct ScriptedDetector {
        script: VecDeque<Result<Option<HandDetection>, GestureError>>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Result<Option<HandDetection>, GestureError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl HandDetector for ScriptedDetector {
        fn detect(&mut self, _image: &ImageFrame) -> Result<Option<HandDetection>, GestureError> {
            self.script.pop_front().unwrap_or(Ok(None))
        }
    }

    type Calls = Arc<Mutex<Vec<Vec<FeatureVector>>>>;

    /// Returns a fixed output and records every sequence it was given.
    struct FixedClassifier {
        output: Result<Vec<f32>, GestureError>,
        calls: Calls,
    }

    impl SequenceClassifier for FixedClassifier {
        fn predict(&mut self, sequence: &[FeatureVector]) -> Result<Vec<f32>, GestureError> {
            self.calls.lock().unwrap().push(sequence.to_vec());
            self.output.clone()
        }
    }

    /// Returns the next queued output on each call.
    struct QueueClassifier {
        outputs: VecDeque<Vec<f32>>,
    }

    impl SequenceClassifier for QueueClassifier {
        fn predict(&mut self, _sequence: &[FeatureVector]) -> Result<Vec<f32>, GestureError> {
            self.outputs
                .pop_front()
                .ok_or_else(|| GestureError::ClassifierUnavailable("script exhausted".into()))
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    const LABELS: [&str; 4] = ["none", "fist", "open_palm", "thumbs_up"];
    const PEAK_AT_3: [f32; 4] = [0.05, 0.05, 0.05, 0.85];

    fn config() -> RecognizerConfig {
        RecognizerConfig {
            labels: LABELS.iter().map(|s| s.to_string()).collect(),
            ..RecognizerConfig::default()
        }
    }

    /// A plausible open hand whose fingertip spread depends on `seed`.
    fn hand(seed: usize) -> HandDetection {
        let landmarks = (0..NUM_LANDMARKS)
            .map(|i| {
                let t = i as f32 / 20.0;
                Landmark::new(0.4 + 0.2 * t, 0.7 - 0.3 * t * (1.0 + seed as f32 * 0.01), 0.0)
            })
            .collect();
        HandDetection {
            landmarks,
            handedness: Some("Right".to_string()),
            score: Some(0.97),
        }
    }

    fn hit(seed: usize) -> Result<Option<HandDetection>, GestureError> {
        Ok(Some(hand(seed)))
    }

    fn miss() -> Result<Option<HandDetection>, GestureError> {
        Ok(None)
    }

    fn recognizer_with(
        config: RecognizerConfig,
        script: Vec<Result<Option<HandDetection>, GestureError>>,
        output: Result<Vec<f32>, GestureError>,
    ) -> (Recognizer, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let classifier = FixedClassifier {
            output,
            calls: Arc::clone(&calls),
        };
        let recognizer = Recognizer::new(
            config,
            Box::new(ScriptedDetector::new(script)),
            Box::new(classifier),
        )
        .unwrap();
        (recognizer, calls)
    }

    fn run(recognizer: &mut Recognizer, frames: usize) -> Vec<GestureResult> {
        let image = ImageFrame::default();
        (0..frames).map(|_| recognizer.process_frame(&image)).collect()
    }

    // ── Construction ────────────────────────────────────────────────────────

    #[test]
    fn invalid_config_prevents_construction() {
        let bad = [
            RecognizerConfig { sequence_length: 0, ..config() },
            RecognizerConfig { history_size: 0, ..config() },
            RecognizerConfig { stability_threshold: 0.0, ..config() },
            RecognizerConfig { stability_threshold: 1.5, ..config() },
            RecognizerConfig { labels: vec!["ok".into(), " ".into()], ..config() },
            RecognizerConfig { history_size: 2, min_stable_samples: 3, ..config() },
        ];
        for cfg in bad {
            let result = Recognizer::new(
                cfg,
                Box::new(ScriptedDetector::new(vec![])),
                Box::new(QueueClassifier { outputs: VecDeque::new() }),
            );
            assert!(matches!(result, Err(GestureError::InvalidConfig(_))));
        }
    }

    #[test]
    fn starts_empty_in_no_hand_phase() {
        let (r, _) = recognizer_with(config(), vec![], Ok(PEAK_AT_3.to_vec()));
        assert_eq!(r.phase(), Phase::NoHand);
        assert!(r.state().buffer().is_empty());
        assert!(r.state().history().is_empty());
        assert_eq!(r.state().missed_frames(), 0);
        assert!(r.last_landmarks().is_none());
    }

    // ── Collecting ──────────────────────────────────────────────────────────

    #[test]
    fn collecting_reports_progress_without_label() {
        let script = (0..5).map(hit).collect();
        let (mut r, calls) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 5);
        for (i, res) in results.iter().enumerate() {
            assert_eq!(res.status, RecognitionStatus::Collecting);
            assert!(res.hand_detected);
            assert!(res.label.is_none());
            assert!((res.buffer_progress - (i + 1) as f32 / 15.0).abs() < 1e-6);
            assert_eq!(res.handedness.as_deref(), Some("Right"));
        }
        assert_eq!(r.phase(), Phase::Collecting);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(r.last_landmarks().map(|l| l.len()), Some(NUM_LANDMARKS));
    }

    // ── Hysteresis ──────────────────────────────────────────────────────────

    #[test]
    fn short_dropout_keeps_buffers() {
        // 5 hands, 2 misses, 1 hand.
        let mut script: Vec<_> = (0..5).map(hit).collect();
        script.extend([miss(), miss(), hit(5)]);
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 8);

        for res in &results[5..7] {
            assert_eq!(res.status, RecognitionStatus::NoHand);
            assert!(!res.hand_detected);
            assert_eq!(res.confidence, 0.0);
            assert!((res.buffer_progress - 5.0 / 15.0).abs() < 1e-6);
        }
        assert_eq!(results[6].status, RecognitionStatus::NoHand);

        // The next hand appends onto the pre-existing buffer.
        assert_eq!(r.state().buffer().len(), 6);
        assert_eq!(r.state().missed_frames(), 0);
        assert!((results[7].buffer_progress - 6.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn dropout_at_threshold_keeps_buffers() {
        let mut script: Vec<_> = (0..4).map(hit).collect();
        script.extend([miss(), miss(), miss()]);
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        run(&mut r, 7);
        assert_eq!(r.state().missed_frames(), 3);
        assert_eq!(r.state().buffer().len(), 4);
        assert!(r.last_landmarks().is_some());
    }

    #[test]
    fn sustained_dropout_clears_buffers() {
        // Fill the buffer and build some history, then lose the hand.
        let mut script: Vec<_> = (0..17).map(hit).collect();
        script.extend([miss(), miss(), miss(), miss(), hit(99)]);
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 22);
        assert_eq!(results[16].status, RecognitionStatus::Predicted);

        let fourth_miss = &results[20];
        assert!(!fourth_miss.hand_detected);
        assert_eq!(fourth_miss.confidence, 0.0);
        assert_eq!(fourth_miss.buffer_progress, 0.0);

        // Progress restarts from an empty window.
        let next = &results[21];
        assert_eq!(next.status, RecognitionStatus::Collecting);
        assert!((next.buffer_progress - 1.0 / 15.0).abs() < 1e-6);
        assert_eq!(r.state().buffer().len(), 1);
        assert!(r.state().history().is_empty());
    }

    #[test]
    fn hand_loss_restarts_miss_counter() {
        let script = vec![hit(0), miss(), miss(), miss(), miss(), miss()];
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        run(&mut r, 5);
        assert_eq!(r.state().missed_frames(), 0);
        assert!(r.state().buffer().is_empty());

        let after = run(&mut r, 1);
        assert_eq!(r.state().missed_frames(), 1);
        assert_eq!(after[0].buffer_progress, 0.0);
    }

    #[test]
    fn history_equal_to_min_samples_can_become_stable() {
        let cfg = RecognizerConfig {
            sequence_length: 2,
            history_size: 3,
            min_stable_samples: 3,
            ..config()
        };
        let (mut r, _) = recognizer_with(cfg, (0..5).map(hit).collect(), Ok(PEAK_AT_3.to_vec()));
        let results = run(&mut r, 5);
        assert!(!results[2].is_stable);
        assert!(results[3].is_stable);
        assert!(results[4].is_stable);
    }

    #[test]
    fn detector_error_counts_as_miss() {
        let mut script: Vec<_> = (0..3).map(hit).collect();
        script.push(Err(GestureError::DetectorUnavailable("camera busy".into())));
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 4);
        assert_eq!(results[3].status, RecognitionStatus::NoHand);
        assert_eq!(r.state().missed_frames(), 1);
        assert_eq!(r.state().buffer().len(), 3);
    }

    // ── Predicting ──────────────────────────────────────────────────────────

    #[test]
    fn full_buffer_emits_classified_result() {
        let script = (0..15).map(hit).collect();
        let (mut r, calls) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 15);
        let last = results.last().unwrap();

        assert_eq!(last.status, RecognitionStatus::Predicted);
        assert_eq!(last.label.as_deref(), Some("thumbs_up"));
        assert_eq!(last.class_index, Some(3));
        assert!((last.confidence - 0.85).abs() < 1e-6);
        assert_eq!(last.buffer_progress, 1.0);
        assert_eq!(last.probabilities, PEAK_AT_3.to_vec());
        assert!(last.hand_detected);
        assert_eq!(last.detector_score, Some(0.97));
        assert_eq!(r.phase(), Phase::Predicting);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 15);
        // Every frame handed to the classifier is wrist-relative.
        assert!(calls[0].iter().all(|f| f[0] == 0.0 && f[1] == 0.0));
    }

    #[test]
    fn continuous_policy_predicts_every_frame() {
        let script = (0..20).map(hit).collect();
        let (mut r, calls) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 20);
        assert!(results[15..].iter().all(|res| res.status == RecognitionStatus::Predicted));
        assert_eq!(calls.lock().unwrap().len(), 6);
        assert_eq!(r.state().buffer().len(), 15);
        // Stability needs min_stable_samples predictions.
        assert!(!results[15].is_stable);
        assert!(results[19].is_stable);
    }

    #[test]
    fn single_shot_policy_restarts_window() {
        let cfg = RecognizerConfig {
            sequence_length: 4,
            policy: BufferingPolicy::SingleShot,
            ..config()
        };
        let script = (0..6).map(hit).collect();
        let (mut r, calls) = recognizer_with(cfg, script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 6);
        assert_eq!(results[3].status, RecognitionStatus::Predicted);
        assert_eq!(results[4].status, RecognitionStatus::Collecting);
        assert!((results[4].buffer_progress - 0.25).abs() < 1e-6);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(r.state().history().len(), 1);
    }

    #[test]
    fn label_is_smoothed_but_confidence_is_instantaneous() {
        let cfg = RecognizerConfig {
            sequence_length: 2,
            ..config()
        };
        let script = (0..5).map(hit).collect();
        let classifier = QueueClassifier {
            outputs: VecDeque::from(vec![
                vec![0.1, 0.8, 0.05, 0.05],
                vec![0.1, 0.7, 0.1, 0.1],
                vec![0.1, 0.75, 0.1, 0.05],
                vec![0.05, 0.0, 0.9, 0.05], // single-frame flicker to class 2
            ]),
        };
        let mut r = Recognizer::new(
            cfg,
            Box::new(ScriptedDetector::new(script)),
            Box::new(classifier),
        )
        .unwrap();

        let results = run(&mut r, 5);
        let flicker = &results[4];
        assert_eq!(flicker.label.as_deref(), Some("fist"));
        assert_eq!(flicker.class_index, Some(1));
        assert!((flicker.confidence - 0.9).abs() < 1e-6);
        assert!(flicker.is_stable); // 3 of 4
    }

    // ── Failures ────────────────────────────────────────────────────────────

    #[test]
    fn classifier_failure_keeps_buffers() {
        let script = (0..16).map(hit).collect();
        let (mut r, calls) = recognizer_with(
            config(),
            script,
            Err(GestureError::ClassifierUnavailable("model not loaded".into())),
        );

        let results = run(&mut r, 16);
        for res in &results[14..] {
            assert_eq!(res.status, RecognitionStatus::PredictionFailed);
            assert!(res.hand_detected);
            assert!(res.label.is_none());
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(r.state().buffer().len(), 15);
        assert!(r.state().history().is_empty());
    }

    #[test]
    fn mismatched_class_count_is_prediction_failure() {
        let script = (0..15).map(hit).collect();
        let (mut r, _) = recognizer_with(config(), script, Ok(vec![0.5, 0.5]));

        let results = run(&mut r, 15);
        assert_eq!(results[14].status, RecognitionStatus::PredictionFailed);
    }

    #[test]
    fn empty_label_table_renders_indices() {
        let cfg = RecognizerConfig {
            sequence_length: 1,
            labels: Vec::new(),
            ..RecognizerConfig::default()
        };
        let (mut r, _) = recognizer_with(cfg, vec![hit(0)], Ok(vec![0.2, 0.1, 0.7]));

        let res = r.process_frame(&ImageFrame::default());
        assert_eq!(res.label.as_deref(), Some("class_2"));
    }

    #[test]
    fn malformed_detection_is_rejected_without_state_change() {
        let mut bad = hand(0);
        bad.landmarks.truncate(20);
        let script = vec![hit(0), miss(), Ok(Some(bad))];
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

        let results = run(&mut r, 3);
        assert_eq!(results[2].status, RecognitionStatus::Rejected);
        assert_eq!(r.state().buffer().len(), 1);
        assert_eq!(r.state().missed_frames(), 1);
    }

    #[test]
    fn non_finite_landmark_is_rejected_without_state_change() {
        for bad_value in [f32::NAN, f32::INFINITY] {
            let mut bad = hand(0);
            bad.landmarks[10].x = bad_value;
            let script = vec![hit(0), Ok(Some(bad)), hit(1)];
            let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));

            let results = run(&mut r, 2);
            assert_eq!(results[1].status, RecognitionStatus::Rejected);
            assert_eq!(r.state().buffer().len(), 1);

            run(&mut r, 1);
            assert_eq!(r.state().buffer().len(), 2);
        }
    }

    #[test]
    fn unsupported_rotation_falls_back_to_identity() {
        let (mut rotated, _) = recognizer_with(config(), vec![hit(1)], Ok(PEAK_AT_3.to_vec()));
        let (mut plain, _) = recognizer_with(config(), vec![hit(1)], Ok(PEAK_AT_3.to_vec()));

        let odd = ImageFrame {
            rotation_degrees: Some(45),
            ..ImageFrame::default()
        };
        let res = rotated.process_frame(&odd);
        plain.process_frame(&ImageFrame::default());

        assert_eq!(res.status, RecognitionStatus::Collecting);
        assert_eq!(rotated.last_landmarks(), plain.last_landmarks());
    }

    #[test]
    fn rotation_and_mirror_applied_to_overlay_landmarks() {
        let (mut r, _) = recognizer_with(config(), vec![], Ok(PEAK_AT_3.to_vec()));
        let raw = hand(0);
        let wrist = raw.landmarks[0];
        r.process_detection(Some(raw), DisplayTransform::new(Rotation::Deg90, true));

        let shown = r.last_landmarks().unwrap()[0];
        // 90° then mirror: x' = y, y' = x.
        assert!((shown.x - wrist.y).abs() < 1e-6);
        assert!((shown.y - wrist.x).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_everything() {
        let mut script: Vec<_> = (0..15).map(hit).collect();
        script.push(miss());
        let (mut r, _) = recognizer_with(config(), script, Ok(PEAK_AT_3.to_vec()));
        run(&mut r, 16);

        r.reset();
        assert!(r.state().buffer().is_empty());
        assert!(r.state().history().is_empty());
        assert_eq!(r.state().missed_frames(), 0);
        assert!(r.last_landmarks().is_none());
        assert_eq!(r.phase(), Phase::NoHand);
    }

    // ── Config ──────────────────────────────────────────────────────────────

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("continuous".parse::<BufferingPolicy>().unwrap(), BufferingPolicy::Continuous);
        assert_eq!("single-shot".parse::<BufferingPolicy>().unwrap(), BufferingPolicy::SingleShot);
        assert!("sometimes".parse::<BufferingPolicy>().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: RecognizerConfig =
            serde_json::from_str(r#"{"policy":"single_shot","labels":["a","b"]}"#).unwrap();
        assert_eq!(cfg.sequence_length, DEFAULT_SEQUENCE_LENGTH);
        assert_eq!(cfg.missed_frame_threshold, DEFAULT_MISSED_FRAME_THRESHOLD);
        assert_eq!(cfg.policy, BufferingPolicy::SingleShot);
        assert_eq!(cfg.labels.len(), 2);
        assert!(cfg.validate().is_ok());
    }
}
