//! [`PredictionSmoother`] – majority-vote label filter.
//!
//! Per-frame classifier output flickers near decision boundaries.  The
//! smoother keeps a short rolling window of the last *M* predicted class
//! indices and reports the most frequent one.
//!
//! # Algorithm
//!
//! - **Mode**: the class with the most occurrences in the window.  Ties go to
//!   the tied class whose latest occurrence is most recent.
//! - **Stability**: the mode's count must reach `stability_threshold` × the
//!   current window length, and the window must hold at least
//!   `min_samples` predictions.
//!
//! # Example
//!
//! ```rust
//! use gestura_runtime::smoother::{PredictionSmoother, SmootherConfig};
//!
//! let mut s = PredictionSmoother::new(SmootherConfig::default());
//! assert_eq!(s.smoothed_prediction(), None);
//!
//! s.add_prediction(2);
//! s.add_prediction(2);
//! s.add_prediction(4); // one-frame flicker
//!
//! assert_eq!(s.smoothed_prediction(), Some(2));
//! assert!(s.is_stable()); // 2 of 3 ≥ 60 %
//! ```

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Default window length (M).
pub const DEFAULT_HISTORY_SIZE: usize = 5;
/// Default fraction of the window the mode must occupy.
pub const DEFAULT_STABILITY_THRESHOLD: f32 = 0.6;
/// Default minimum window fill before a label can be called stable.
pub const DEFAULT_MIN_SAMPLES: usize = 3;

/// Absorbs f32 rounding in `threshold * len` (0.6 × 5 is not exactly 3).
const STABILITY_EPSILON: f64 = 1e-6;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Maximum number of predictions kept (M).
    pub history_size: usize,
    /// Fraction in `(0, 1]` of the window the mode must occupy.
    pub stability_threshold: f32,
    /// Window fill below which [`PredictionSmoother::is_stable`] is always
    /// `false`.
    pub min_samples: usize,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PredictionSmoother
// ─────────────────────────────────────────────────────────────────────────────

/// Rolling majority vote over recent class indices.
#[derive(Debug, Clone)]
pub struct PredictionSmoother {
    config: SmootherConfig,
    history: VecDeque<usize>,
}

impl PredictionSmoother {
    /// `history_size` is clamped to at least 1.
    pub fn new(config: SmootherConfig) -> Self {
        let config = SmootherConfig {
            history_size: config.history_size.max(1),
            ..config
        };
        Self {
            config,
            history: VecDeque::with_capacity(config.history_size),
        }
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Record this frame's predicted class, dropping the oldest beyond M.
    pub fn add_prediction(&mut self, class_index: usize) {
        self.history.push_back(class_index);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }

    /// The mode and its occurrence count, or `None` when empty.
    pub fn mode(&self) -> Option<(usize, usize)> {
        // class -> (count, position of latest occurrence)
        let mut tally: HashMap<usize, (usize, usize)> = HashMap::new();
        for (pos, &class) in self.history.iter().enumerate() {
            let entry = tally.entry(class).or_insert((0, pos));
            entry.0 += 1;
            entry.1 = pos;
        }
        tally
            .into_iter()
            .max_by_key(|&(_, (count, last_pos))| (count, last_pos))
            .map(|(class, (count, _))| (class, count))
    }

    /// Majority-vote class index; `None` when no predictions are recorded.
    pub fn smoothed_prediction(&self) -> Option<usize> {
        self.mode().map(|(class, _)| class)
    }

    /// `true` when the mode dominates the current window.
    pub fn is_stable(&self) -> bool {
        let len = self.history.len();
        if len == 0 || len < self.config.min_samples {
            return false;
        }
        match self.mode() {
            Some((_, count)) => {
                count as f64 + STABILITY_EPSILON
                    >= f64::from(self.config.stability_threshold) * len as f64
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
