//! `FrameProcessor` — per-frame denoising, voice-activity gating and metrics.
//!
//! ## Pipeline (per frame)
//!
//! ```text
//! 1. level <= 0 → bypass: publish RMS, vad = 0, gain = 1, return 0
//! 2. input RMS
//! 3. keep dry copy, scale ×32767
//! 4. model.process_frame → vad
//! 5. scale back to [-1, 1]
//! 6. dry/wet blend by level
//! 7. target gain from vad (hysteresis band)
//! 8. smooth gain, apply
//! 9. comfort noise when gain < COMFORT_GAIN_THRESHOLD
//! 10. output RMS, frame counter
//! ```
//!
//! ## Real-time rules
//!
//! `process_frame` does no allocation, locking or I/O: fixed loops over
//! `FRAME_SIZE` samples and relaxed atomics. `init` and `destroy` are NOT
//! real-time safe and belong on a control thread, never concurrent with an
//! in-flight `process_frame`. `&mut self` on all three makes that exclusion a
//! compile-time fact.

pub mod comfort;
pub mod gate;
pub mod metrics;
pub mod params;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use crate::audio::compute_rms;
use crate::denoise::{DenoiseModel, ModelProvider, FRAME_SIZE, MODEL_SCALE};
use crate::error::Result;

pub use comfort::{ComfortNoise, COMFORT_NOISE_LEVEL, NOISE_SEED};
pub use gate::{target_gain, GainSmoother, GAIN_SMOOTH_COEFF, MIN_GATE_GAIN, VAD_HYSTERESIS};
pub use metrics::{AudioMetrics, MetricsSnapshot};
pub use params::ProcessorParams;

/// Gain below which comfort noise fades in. Looser than `MIN_GATE_GAIN`.
pub const COMFORT_GAIN_THRESHOLD: f32 = 0.1;

const INV_MODEL_SCALE: f32 = 1.0 / MODEL_SCALE;

/// Wraps a [`DenoiseModel`] with gating, smoothing, comfort noise and metrics.
pub struct FrameProcessor {
    provider: Arc<dyn ModelProvider>,
    /// `Some` between a successful `init` and `destroy`.
    model: Option<Box<dyn DenoiseModel>>,
    params: Arc<ProcessorParams>,
    metrics: Arc<AudioMetrics>,
    smoother: GainSmoother,
    noise: ComfortNoise,
}

impl FrameProcessor {
    /// Build an uninitialized processor with default parameters.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_params(provider, Arc::new(ProcessorParams::default()))
    }

    /// Build an uninitialized processor sharing an existing parameter block.
    pub fn with_params(provider: Arc<dyn ModelProvider>, params: Arc<ProcessorParams>) -> Self {
        Self::with_shared(provider, params, Arc::new(AudioMetrics::default()))
    }

    /// Build an uninitialized processor publishing into an existing metrics block.
    pub fn with_shared(
        provider: Arc<dyn ModelProvider>,
        params: Arc<ProcessorParams>,
        metrics: Arc<AudioMetrics>,
    ) -> Self {
        Self {
            provider,
            model: None,
            params,
            metrics,
            smoother: GainSmoother::new(),
            noise: ComfortNoise::new(),
        }
    }

    /// Acquire the model and reset all per-run state.
    ///
    /// Re-initializing releases the previous model first.
    ///
    /// # Errors
    /// Returns `NoiseGuardError::ModelInit` if the provider cannot supply a
    /// model. The processor then stays uninitialized and `process_frame`
    /// remains a no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.model.is_some() {
            self.destroy();
        }

        self.smoother.reset();
        self.noise.reset();
        self.metrics.reset();

        match self.provider.create() {
            Ok(model) => {
                self.model = Some(model);
                info!(backend = self.provider.name(), "frame processor initialized");
                Ok(())
            }
            Err(e) => {
                warn!(backend = self.provider.name(), "model acquisition failed: {e}");
                Err(e)
            }
        }
    }

    /// Release the model. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.model.take().is_some() {
            debug!(backend = self.provider.name(), "frame processor destroyed");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.model.is_some()
    }

    /// Process one frame in place and return the voice-activity probability.
    ///
    /// Returns 0.0 and leaves the frame untouched when uninitialized.
    pub fn process_frame(&mut self, frame: &mut [f32; FRAME_SIZE]) -> f32 {
        let Some(model) = self.model.as_mut() else {
            return 0.0;
        };

        let level = self.params.suppression_level();

        if level <= 0.0 {
            let rms = compute_rms(frame);
            self.metrics.publish_input_rms(rms);
            self.metrics.publish_output_rms(rms);
            self.metrics.publish_vad(0.0);
            self.metrics.publish_gain(1.0);
            self.metrics.count_frame();
            return 0.0;
        }

        self.metrics.publish_input_rms(compute_rms(frame));

        let dry = *frame;
        for sample in frame.iter_mut() {
            *sample *= MODEL_SCALE;
        }

        let raw_vad = model.process_frame(frame);
        let vad = if raw_vad.is_nan() {
            0.0
        } else {
            raw_vad.clamp(0.0, 1.0)
        };
        self.metrics.publish_vad(vad);

        for sample in frame.iter_mut() {
            *sample *= INV_MODEL_SCALE;
        }

        if level < 1.0 {
            let dry_mix = 1.0 - level;
            for (wet, &orig) in frame.iter_mut().zip(dry.iter()) {
                *wet = *wet * level + orig * dry_mix;
            }
        }

        let target = target_gain(vad, self.params.vad_threshold());
        let gain = self.smoother.step(target);
        self.metrics.publish_gain(gain);

        for sample in frame.iter_mut() {
            *sample *= gain;
        }

        if self.params.comfort_noise() && gain < COMFORT_GAIN_THRESHOLD {
            let scale = (COMFORT_GAIN_THRESHOLD - gain) / COMFORT_GAIN_THRESHOLD;
            for sample in frame.iter_mut() {
                *sample += self.noise.sample() * scale;
            }
        }

        self.metrics.publish_output_rms(compute_rms(frame));
        self.metrics.count_frame();

        vad
    }

    /// Shared parameter block; clone the `Arc` into control threads.
    pub fn controls(&self) -> Arc<ProcessorParams> {
        Arc::clone(&self.params)
    }

    /// Shared metrics block; clone the `Arc` into UI threads.
    pub fn metrics(&self) -> Arc<AudioMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn set_suppression_level(&self, level: f32) {
        self.params.set_suppression_level(level);
    }

    pub fn suppression_level(&self) -> f32 {
        self.params.suppression_level()
    }

    pub fn set_vad_threshold(&self, threshold: f32) {
        self.params.set_vad_threshold(threshold);
    }

    pub fn vad_threshold(&self) -> f32 {
        self.params.vad_threshold()
    }

    pub fn set_comfort_noise(&self, enabled: bool) {
        self.params.set_comfort_noise(enabled);
    }

    pub fn comfort_noise(&self) -> bool {
        self.params.comfort_noise()
    }

    /// Current smoothed gate gain (processing-thread view).
    pub fn gate_gain(&self) -> f32 {
        self.smoother.gain()
    }

    pub fn backend_name(&self) -> &'static str {
        self.provider.name()
    }
}

impl Drop for FrameProcessor {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for FrameProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProcessor")
            .field("backend", &self.provider.name())
            .field("initialized", &self.is_initialized())
            .field("gain", &self.smoother.gain())
            .finish_non_exhaustive()
    }
}
