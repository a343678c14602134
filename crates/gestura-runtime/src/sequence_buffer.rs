//! [`SequenceBuffer`] – rolling window of normalized frames.
//!
//! Holds the most recent *N* frames in arrival order.  Once the window is
//! full every new frame evicts the oldest, so the classifier always sees the
//! latest *N* frames (a true sliding window, not a one-shot batch).
//!
//! # Example
//!
//! ```rust
//! use gestura_runtime::sequence_buffer::SequenceBuffer;
//!
//! let mut buf = SequenceBuffer::new(2);
//! assert!(buf.get_sequence().is_none()); // still warming up
//!
//! buf.add([1.0; 63]);
//! buf.add([2.0; 63]);
//! buf.add([3.0; 63]); // evicts the first frame
//!
//! let seq = buf.get_sequence().unwrap();
//! assert_eq!(seq[0][0], 2.0);
//! assert_eq!(seq[1][0], 3.0);
//! ```

use std::collections::VecDeque;

use gestura_types::FeatureVector;

/// Fixed-capacity FIFO of [`FeatureVector`]s.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    capacity: usize,
    frames: VecDeque<FeatureVector>,
}

impl SequenceBuffer {
    /// Create an empty buffer holding at most `capacity` frames.
    ///
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `frame`, evicting the oldest frame once capacity is exceeded.
    pub fn add(&mut self, frame: FeatureVector) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// Fill level in `[0, 1]`; exactly `1.0` only when full.
    pub fn progress(&self) -> f32 {
        if self.is_full() {
            1.0
        } else {
            self.frames.len() as f32 / self.capacity as f32
        }
    }

    /// The window contents, oldest first, as an N×63 matrix.
    ///
    /// Returns `None` while the buffer is still filling; this is the normal
    /// warm-up state, not an error.
    pub fn get_sequence(&self) -> Option<Vec<FeatureVector>> {
        if !self.is_full() {
            return None;
        }
        Some(self.frames.iter().copied().collect())
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
