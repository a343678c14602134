//! `gestura-runtime` – the temporal gesture-classification engine.
//!
//! Turns a stream of per-frame hand detections into a stable,
//! confidence-scored gesture label.
//!
//! # Modules
//!
//! - [`recognizer`] – [`Recognizer`][recognizer::Recognizer]: the per-frame
//!   state machine (NoHand → Collecting → Predicting) with missed-frame
//!   hysteresis, wiring the perception crate, the sequence buffer and the
//!   smoother together.
//! - [`sequence_buffer`] – [`SequenceBuffer`][sequence_buffer::SequenceBuffer]:
//!   the fixed-capacity sliding window of normalized frames fed to the
//!   classifier.
//! - [`smoother`] – [`PredictionSmoother`][smoother::PredictionSmoother]:
//!   majority vote over recent class indices, with a stability flag.
//! - [`collaborator`] – [`HandDetector`][collaborator::HandDetector] and
//!   [`SequenceClassifier`][collaborator::SequenceClassifier]: the seams
//!   model backends plug into.
//! - [`worker`] – [`RecognizerWorker`][worker::RecognizerWorker]: owns a
//!   recognizer on a Tokio task with keep-latest frame backpressure.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console and
//!   optional OTLP tracing setup.

pub mod collaborator;
pub mod recognizer;
pub mod sequence_buffer;
pub mod smoother;
pub mod telemetry;
pub mod worker;

pub use collaborator::{HandDetector, SequenceClassifier};
pub use recognizer::{BufferingPolicy, Phase, Recognizer, RecognizerConfig, RecognizerState};
pub use sequence_buffer::SequenceBuffer;
pub use smoother::{PredictionSmoother, SmootherConfig};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use worker::{RecognizerWorker, WorkerError};
