//! Landmark Normalizer.
//!
//! Produces a position- and scale-invariant frame from 21 display-space
//! landmarks so the classifier sees the same numbers regardless of where the
//! hand is in the image or how close it is to the camera.
//!
//! Steps, in order:
//!
//! 1. Translate every landmark so the wrist (index 0) sits at the origin.
//! 2. Take the larger of the x and y bounding-box ranges as the hand scale.
//! 3. Floor the scale at `min_scale` so a collapsed hand cannot blow up.
//! 4. Divide all 63 values (x, y and z) by the scale.
//! 5. Hard-clip every value to `[-clip, clip]`.
//!
//! # Example
//!
//! ```rust
//! use gestura_perception::normalize::LandmarkNormalizer;
//!
//! let normalizer = LandmarkNormalizer::default();
//! let mut input = vec![0.0f32; 63];
//! for i in 0..21 {
//!     input[i * 3] = 0.5 + 0.01 * i as f32;
//!     input[i * 3 + 1] = 0.5;
//! }
//! let frame = normalizer.normalize(&input).unwrap();
//! assert_eq!(&frame[..3], &[0.0, 0.0, 0.0]);
//! assert!((frame[60] - 1.0).abs() < 1e-5);
//! ```

use gestura_types::{
    COORDS_PER_LANDMARK, FEATURE_COUNT, FeatureVector, GestureError, Landmark, flatten_landmarks,
};
use serde::{Deserialize, Serialize};

/// Smallest hand scale the normalizer will divide by.
pub const DEFAULT_MIN_SCALE: f32 = 1e-3;

/// Symmetric bound applied to every normalized value.
pub const DEFAULT_CLIP: f32 = 5.0;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for [`LandmarkNormalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_min_scale")]
    pub min_scale: f32,
    #[serde(default = "default_clip")]
    pub clip: f32,
}

fn default_min_scale() -> f32 {
    DEFAULT_MIN_SCALE
}
fn default_clip() -> f32 {
    DEFAULT_CLIP
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            clip: DEFAULT_CLIP,
        }
    }
}

impl NormalizerConfig {
    /// # Errors
    ///
    /// [`GestureError::InvalidConfig`] unless both values are finite and
    /// strictly positive.
    pub fn validate(&self) -> Result<(), GestureError> {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(GestureError::InvalidConfig(format!(
                "normalizer.min_scale must be > 0, got {}",
                self.min_scale
            )));
        }
        if !(self.clip.is_finite() && self.clip > 0.0) {
            return Err(GestureError::InvalidConfig(format!(
                "normalizer.clip must be > 0, got {}",
                self.clip
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LandmarkNormalizer
// ────────────────────────────────────────────────────────────────────────────

/// Stateless wrist-relative, scale-normalizing feature extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandmarkNormalizer {
    config: NormalizerConfig,
}

impl LandmarkNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a flat `[x0, y0, z0, ..., x20, y20, z20]` slice.
    ///
    /// # Errors
    ///
    /// [`GestureError::InvalidInputShape`] if `values.len() != 63`, and
    /// [`GestureError::NonFiniteInput`] if any value is NaN or infinite.
    pub fn normalize(&self, values: &[f32]) -> Result<FeatureVector, GestureError> {
        if values.len() != FEATURE_COUNT {
            return Err(GestureError::InvalidInputShape {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        // NaN slips through min/max/clamp, so it must be caught up front.
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(GestureError::NonFiniteInput { index });
        }

        let mut out: FeatureVector = [0.0; FEATURE_COUNT];
        let (wx, wy, wz) = (values[0], values[1], values[2]);

        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;

        for (dst, src) in out
            .chunks_exact_mut(COORDS_PER_LANDMARK)
            .zip(values.chunks_exact(COORDS_PER_LANDMARK))
        {
            let x = src[0] - wx;
            let y = src[1] - wy;
            dst[0] = x;
            dst[1] = y;
            dst[2] = src[2] - wz;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let scale = (max_x - min_x).max(max_y - min_y).max(self.config.min_scale);
        let clip = self.config.clip;
        for v in out.iter_mut() {
            *v = (*v / scale).clamp(-clip, clip);
        }

        Ok(out)
    }

    /// Normalize a detection given as landmarks rather than a flat slice.
    pub fn normalize_landmarks(&self, landmarks: &[Landmark]) -> Result<FeatureVector, GestureError> {
        self.normalize(&flatten_landmarks(landmarks))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
