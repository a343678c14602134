//! Sensor-to-display coordinate transform.
//!
//! Detector landmarks arrive in the camera sensor's native orientation.  The
//! transform rotates them into display orientation and then, for front-facing
//! capture, mirrors them horizontally.  Rotation is always applied before the
//! mirror; swapping the order gives a different mapping at 90° and 270°.
//!
//! | Rotation | x' | y' |
//! |---|---|---|
//! | 0° | x | y |
//! | 90° | 1 − y | x |
//! | 180° | 1 − x | 1 − y |
//! | 270° | y | 1 − x |
//!
//! Mirroring then sets `x' = 1 − x'`.  `z` is never touched.
//!
//! # Example
//!
//! ```rust
//! use gestura_perception::transform::{DisplayTransform, Rotation};
//! use gestura_types::Landmark;
//!
//! let tf = DisplayTransform::new(Rotation::Deg90, false);
//! let p = tf.apply(Landmark::new(0.2, 0.3, -0.1));
//! assert!((p.x - 0.7).abs() < 1e-6);
//! assert!((p.y - 0.2).abs() < 1e-6);
//! assert_eq!(p.z, -0.1);
//! ```

use gestura_types::{GestureError, Landmark};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ────────────────────────────────────────────────────────────────────────────
// Rotation
// ────────────────────────────────────────────────────────────────────────────

/// One of the four sensor rotations the capture layer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a rotation in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::UnsupportedRotation`] for anything other than
    /// 0, 90, 180 or 270.
    pub fn from_degrees(degrees: i32) -> Result<Self, GestureError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(GestureError::UnsupportedRotation(other)),
        }
    }

    /// Resolve the rotation metadata attached to a frame.
    ///
    /// Missing metadata means 0°.  An unsupported value falls back to 0° and
    /// emits a warning so the misconfiguration shows up in the logs.
    pub fn resolve(degrees: Option<i32>) -> Self {
        match degrees.map(Self::from_degrees) {
            None => Self::Deg0,
            Some(Ok(rotation)) => rotation,
            Some(Err(e)) => {
                warn!(error = %e, "falling back to identity rotation");
                Self::Deg0
            }
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// The rotation that undoes this one (360° − r).
    pub fn inverse(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg0,
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg180,
            Self::Deg270 => Self::Deg90,
        }
    }

    /// Rotate a single normalized point.
    pub fn rotate(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Self::Deg0 => (x, y),
            Self::Deg90 => (1.0 - y, x),
            Self::Deg180 => (1.0 - x, 1.0 - y),
            Self::Deg270 => (y, 1.0 - x),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DisplayTransform
// ────────────────────────────────────────────────────────────────────────────

/// Rotation + optional mirror, applied landmark by landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayTransform {
    pub rotation: Rotation,
    pub mirrored: bool,
}

impl DisplayTransform {
    pub fn new(rotation: Rotation, mirrored: bool) -> Self {
        Self { rotation, mirrored }
    }

    /// Build the transform for a frame's metadata (see [`Rotation::resolve`]).
    pub fn for_frame(rotation_degrees: Option<i32>, mirrored: bool) -> Self {
        Self::new(Rotation::resolve(rotation_degrees), mirrored)
    }

    /// `true` when the transform leaves every point unchanged.
    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::Deg0 && !self.mirrored
    }

    /// Map one sensor-space landmark into display space.
    pub fn apply(&self, landmark: Landmark) -> Landmark {
        let (mut x, y) = self.rotation.rotate(landmark.x, landmark.y);
        if self.mirrored {
            x = 1.0 - x;
        }
        Landmark::new(x, y, landmark.z)
    }

    /// Map every landmark of a detection.
    pub fn apply_all(&self, landmarks: &[Landmark]) -> Vec<Landmark> {
        if self.is_identity() {
            return landmarks.to_vec();
        }
        landmarks.iter().map(|l| self.apply(*l)).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
