//! Denoising model abstraction.
//!
//! The neural model is an opaque frame-in/frame-out function that also
//! reports voice activity. `FrameProcessor` only sees it through these two
//! traits, so any backend (RNNoise, the built-in energy model, a scripted
//! test double) can be swapped in without touching the gating logic.
//!
//! Acquisition happens through a [`ModelProvider`]; release is `Drop` of the
//! returned box.

pub mod energy;

#[cfg(feature = "rnnoise")]
pub mod rnnoise;

pub use energy::{EnergyModel, EnergyModelProvider};

#[cfg(feature = "rnnoise")]
pub use rnnoise::{RnnoiseModel, RnnoiseProvider};

use std::sync::Arc;

use crate::error::Result;

/// Samples per model call: 10 ms at 48 kHz.
pub const FRAME_SIZE: usize = 480;

/// Scale between the public [-1.0, 1.0] range and the model's int16-like range.
pub const MODEL_SCALE: f32 = 32767.0;

/// Sample rate every backend expects (Hz).
pub const MODEL_SAMPLE_RATE: u32 = 48_000;

/// One acquired model instance.
///
/// Implementations must be real-time safe: `process_frame` may not allocate,
/// lock or block.
pub trait DenoiseModel: Send + 'static {
    /// Denoise `frame` in place and return the voice-activity probability.
    ///
    /// Samples arrive scaled by [`MODEL_SCALE`] and must leave in the same
    /// range. The returned probability should lie in [0, 1]; callers clamp it.
    fn process_frame(&mut self, frame: &mut [f32; FRAME_SIZE]) -> f32;
}

/// Factory for model instances. Called only from control threads.
pub trait ModelProvider: Send + Sync + 'static {
    /// Acquire a fresh model resource.
    ///
    /// # Errors
    /// Returns `NoiseGuardError::ModelInit` when the resource is unavailable.
    fn create(&self) -> Result<Box<dyn DenoiseModel>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// The best backend compiled into this build: RNNoise when the `rnnoise`
/// feature is on, otherwise the energy model.
pub fn default_provider() -> Arc<dyn ModelProvider> {
    #[cfg(feature = "rnnoise")]
    {
        Arc::new(RnnoiseProvider)
    }

    #[cfg(not(feature = "rnnoise"))]
    {
        Arc::new(EnergyModelProvider::default())
    }
}
