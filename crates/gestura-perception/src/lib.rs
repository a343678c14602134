//! `gestura-perception` – per-detection geometry.
//!
//! Turns a single raw detector output into the feature vector the sequence
//! classifier consumes.  Everything here is a pure function of its input.
//!
//! # Modules
//!
//! - [`transform`] – [`DisplayTransform`][transform::DisplayTransform]: maps
//!   sensor-space landmarks into display space, correcting for sensor rotation
//!   (0/90/180/270°) and front-camera mirroring.
//! - [`normalize`] – [`LandmarkNormalizer`][normalize::LandmarkNormalizer]:
//!   converts 21 display-space landmarks into a wrist-relative,
//!   scale-invariant, clipped 63-value frame.

pub mod normalize;
pub mod transform;

pub use normalize::{LandmarkNormalizer, NormalizerConfig};
pub use transform::{DisplayTransform, Rotation};
