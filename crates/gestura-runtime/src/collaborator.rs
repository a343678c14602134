//! Collaborator traits for the two black boxes the recognizer drives.
//!
//! Model backends implement these traits and are handed to
//! [`Recognizer::new`][crate::recognizer::Recognizer::new].  The recognizer
//! only ever talks to the traits, so a detector or classifier can be swapped
//! without touching the temporal logic.

use gestura_types::{FeatureVector, GestureError, HandDetection, ImageFrame};

/// A hand-landmark detector.
///
/// Only the first hand matters: implementations that find several hands
/// return the most confident one.
pub trait HandDetector: Send {
    /// Detect a hand in `image`.
    ///
    /// Returns `Ok(None)` when no hand is visible; that is a normal outcome,
    /// not an error.
    ///
    /// # Errors
    ///
    /// [`GestureError::DetectorUnavailable`] when the detector cannot run at
    /// all for this image.  The recognizer treats it as a missed frame.
    fn detect(&mut self, image: &ImageFrame) -> Result<Option<HandDetection>, GestureError>;
}

/// A fixed-length sequence classifier.
///
/// Must be a pure function of the input sequence: the recognizer calls it on
/// every eligible frame and relies on it carrying no state between calls.
pub trait SequenceClassifier: Send {
    /// Classify `sequence` (oldest frame first) into one probability per class.
    ///
    /// # Errors
    ///
    /// [`GestureError::ClassifierUnavailable`] when no prediction could be
    /// produced.  The recognizer reports a failed prediction for that frame
    /// and keeps its buffers.
    fn predict(&mut self, sequence: &[FeatureVector]) -> Result<Vec<f32>, GestureError>;
}

/// Index and value of the largest finite probability.
///
/// Returns `None` for an empty vector or one with no finite entries.  Ties
/// resolve to the lowest index.
pub fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probabilities.iter().enumerate() {
        if !p.is_finite() {
            continue;
        }
        match best {
            Some((_, bp)) if bp >= p => {}
            _ => best = Some((i, p)),
        }
    }
    best
}
