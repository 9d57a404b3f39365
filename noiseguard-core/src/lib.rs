//! # noiseguard-core
//!
//! Real-time noise suppression core.
//!
//! ## Architecture
//!
//! ```text
//! capture callback → RingProducer ══ SPSC ring ══ RingConsumer
//!                                                      │ one frame (480)
//!                                               FrameProcessor::process_frame
//!                                      DenoiseModel → dry/wet → VAD gate → comfort noise
//!                                                      │
//! playback callback ← RingConsumer ══ SPSC ring ══ RingProducer
//!
//! control/UI threads ── ProcessorParams (atomic knobs) / AudioMetrics (atomic meters)
//! ```
//!
//! Ring `write`/`read` and `process_frame` never allocate, lock or block.
//! All heap work happens in `FrameProcessor::init` and `NoiseEngine::start`,
//! on a control thread.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod denoise;
pub mod engine;
pub mod error;
pub mod processor;

// Convenience re-exports for downstream crates
pub use buffering::{create_audio_ring, RingBuffer, RingConsumer, RingProducer};
pub use denoise::{
    default_provider, DenoiseModel, EnergyModelProvider, ModelProvider, FRAME_SIZE,
    MODEL_SAMPLE_RATE,
};
pub use engine::{EngineConfig, EngineIo, EngineStatus, NoiseEngine};
pub use error::NoiseGuardError;
pub use processor::{AudioMetrics, FrameProcessor, MetricsSnapshot, ProcessorParams};

#[cfg(feature = "rnnoise")]
pub use denoise::RnnoiseProvider;
