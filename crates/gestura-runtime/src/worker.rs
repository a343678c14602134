//! [`RecognizerWorker`] – runs a [`Recognizer`] on its own Tokio task.
//!
//! The worker is the single owner of the recognizer's mutable state.  The
//! capture layer pushes frames with [`RecognizerWorker::submit`]; frames go
//! through a [`tokio::sync::watch`] slot, so if the worker is still busy a
//! newer frame replaces the unprocessed one (keep-latest backpressure) and
//! the recognizer only ever sees frames in arrival order, one at a time.
//!
//! Results are fanned out on a [`tokio::sync::broadcast`] channel.  A slow
//! subscriber lags and loses old results; it never blocks the worker.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn demo(recognizer: gestura_runtime::Recognizer) {
//! use gestura_runtime::worker::RecognizerWorker;
//! use gestura_types::ImageFrame;
//!
//! let worker = RecognizerWorker::spawn(recognizer, 64);
//! let mut results = worker.subscribe();
//! worker.submit(ImageFrame::default());
//! let result = results.recv().await.unwrap();
//! println!("hand detected: {}", result.hand_detected);
//! let _recognizer = worker.shutdown().await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use gestura_types::{GestureResult, ImageFrame};
use thiserror::Error;
use tokio::sync::{Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::recognizer::Recognizer;

/// Default result channel capacity.
pub const DEFAULT_RESULT_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("recognizer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handle to a recognizer running on a background task.
pub struct RecognizerWorker {
    frames: watch::Sender<Option<ImageFrame>>,
    results: broadcast::Sender<GestureResult>,
    reset: Arc<Notify>,
    handle: JoinHandle<Recognizer>,
}

impl RecognizerWorker {
    /// Move `recognizer` onto a new task.  Must be called inside a Tokio
    /// runtime.
    ///
    /// `result_capacity` is the number of results buffered per subscriber
    /// before the oldest are dropped (clamped to at least 1).
    pub fn spawn(recognizer: Recognizer, result_capacity: usize) -> Self {
        let (frames, frames_rx) = watch::channel(None);
        let (results, _) = broadcast::channel(result_capacity.max(1));
        let reset = Arc::new(Notify::new());

        let handle = tokio::spawn(run(
            recognizer,
            frames_rx,
            results.clone(),
            Arc::clone(&reset),
        ));

        Self {
            frames,
            results,
            reset,
            handle,
        }
    }

    /// Hand a frame to the worker, replacing any frame still waiting.
    pub fn submit(&self, frame: ImageFrame) {
        self.frames.send_replace(Some(frame));
    }

    /// Subscribe to results produced from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GestureResult> {
        self.results.subscribe()
    }

    /// Ask the worker to reset the recognizer before its next frame.
    pub fn request_reset(&self) {
        self.reset.notify_one();
    }

    /// Stop accepting frames, let the task finish any pending frame, and
    /// return the recognizer.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Join`] if the task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<Recognizer, WorkerError> {
        let Self { frames, handle, .. } = self;
        drop(frames);
        Ok(handle.await?)
    }
}

async fn run(
    mut recognizer: Recognizer,
    mut frames: watch::Receiver<Option<ImageFrame>>,
    results: broadcast::Sender<GestureResult>,
    reset: Arc<Notify>,
) -> Recognizer {
    loop {
        tokio::select! {
            biased;
            _ = reset.notified() => {
                recognizer.reset();
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    let result = recognizer.process_frame(&frame);
                    // No subscribers is not an error.
                    let _ = results.send(result);
                }
            }
        }
    }
    debug!("recognizer worker stopped");
    recognizer
}
