//! Energy-based fallback model.
//!
//! ## Algorithm
//!
//! 1. Leave the samples untouched (no spectral denoising).
//! 2. Compute the frame RMS in the model range.
//! 3. Map RMS to a voice-activity estimate: `rms / speech_rms`, clamped to [0, 1].
//! 4. Once a frame reaches `speech_rms`, hold the estimate at 1.0 for
//!    `hangover_frames` further frames so word endings are not gated.

use super::{DenoiseModel, ModelProvider, FRAME_SIZE, MODEL_SCALE};
use crate::audio::compute_rms;
use crate::error::Result;
use tracing::debug;

/// RMS-driven voice-activity estimator that passes audio through.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    /// RMS (in model units) at or above which a frame counts as speech.
    speech_rms: f32,
    /// Frames to keep reporting speech after the level drops.
    hangover_frames: u32,
    hangover_counter: u32,
}

impl EnergyModel {
    /// # Parameters
    /// - `speech_rms`: full-scale RMS (public [-1, 1] units) treated as certain
    ///   speech. Default `0.02`.
    /// - `hangover_frames`: default `8` (80 ms at 10 ms frames).
    pub fn new(speech_rms: f32, hangover_frames: u32) -> Self {
        Self {
            speech_rms: speech_rms.max(f32::EPSILON) * MODEL_SCALE,
            hangover_frames,
            hangover_counter: 0,
        }
    }
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self::new(0.02, 8)
    }
}

impl DenoiseModel for EnergyModel {
    fn process_frame(&mut self, frame: &mut [f32; FRAME_SIZE]) -> f32 {
        let ratio = (compute_rms(frame) / self.speech_rms).min(1.0);

        if ratio >= 1.0 {
            self.hangover_counter = self.hangover_frames;
            1.0
        } else if self.hangover_counter > 0 {
            self.hangover_counter -= 1;
            1.0
        } else {
            ratio
        }
    }
}

/// Provider for [`EnergyModel`]. Acquisition never fails.
#[derive(Debug, Clone)]
pub struct EnergyModelProvider {
    pub speech_rms: f32,
    pub hangover_frames: u32,
}

impl Default for EnergyModelProvider {
    fn default() -> Self {
        Self {
            speech_rms: 0.02,
            hangover_frames: 8,
        }
    }
}

impl ModelProvider for EnergyModelProvider {
    fn create(&self) -> Result<Box<dyn DenoiseModel>> {
        debug!(
            speech_rms = self.speech_rms,
            hangover_frames = self.hangover_frames,
            "creating energy model"
        );
        Ok(Box::new(EnergyModel::new(
            self.speech_rms,
            self.hangover_frames,
        )))
    }

    fn name(&self) -> &'static str {
        "energy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame_of(amplitude: f32) -> [f32; FRAME_SIZE] {
        [amplitude * MODEL_SCALE; FRAME_SIZE]
    }

    #[test]
    fn silence_reports_no_activity() {
        let mut model = EnergyModel::new(0.02, 0);
        assert_eq!(model.process_frame(&mut frame_of(0.0)), 0.0);
    }

    #[test]
    fn loud_frame_reports_full_activity() {
        let mut model = EnergyModel::new(0.02, 0);
        assert_eq!(model.process_frame(&mut frame_of(0.5)), 1.0);
    }

    #[test]
    fn quiet_frame_scales_proportionally() {
        let mut model = EnergyModel::new(0.02, 0);
        let vad = model.process_frame(&mut frame_of(0.01));
        assert_relative_eq!(vad, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn samples_pass_through_unchanged() {
        let mut model = EnergyModel::default();
        let mut frame = frame_of(0.3);
        let before = frame;
        model.process_frame(&mut frame);
        assert_eq!(frame, before);
    }

    #[test]
    fn hangover_extends_activity() {
        let mut model = EnergyModel::new(0.02, 2);
        assert_eq!(model.process_frame(&mut frame_of(0.5)), 1.0);
        assert_eq!(model.process_frame(&mut frame_of(0.0)), 1.0);
        assert_eq!(model.process_frame(&mut frame_of(0.0)), 1.0);
        assert_eq!(model.process_frame(&mut frame_of(0.0)), 0.0);
    }

    #[test]
    fn provider_always_succeeds() {
        let provider = EnergyModelProvider::default();
        assert!(provider.create().is_ok());
        assert_eq!(provider.name(), "energy");
    }
}
