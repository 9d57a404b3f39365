//! RNNoise backend via the pure-Rust `nnnoiseless` port.
//!
//! `DenoiseState::process_frame` writes into a separate output slice, so the
//! model keeps one preallocated input copy and never allocates per frame.

use nnnoiseless::DenoiseState;
use tracing::info;

use super::{DenoiseModel, ModelProvider, FRAME_SIZE};
use crate::error::{NoiseGuardError, Result};

/// Clamp bound inside the int16 range; avoids wrap-around clicks on overload.
const PCM_LIMIT: f32 = 32_760.0;

pub struct RnnoiseModel {
    state: Box<DenoiseState<'static>>,
    input: [f32; FRAME_SIZE],
}

impl RnnoiseModel {
    pub fn new() -> Self {
        Self {
            state: DenoiseState::new(),
            input: [0.0; FRAME_SIZE],
        }
    }
}

impl Default for RnnoiseModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DenoiseModel for RnnoiseModel {
    fn process_frame(&mut self, frame: &mut [f32; FRAME_SIZE]) -> f32 {
        for (dst, src) in self.input.iter_mut().zip(frame.iter()) {
            *dst = src.clamp(-PCM_LIMIT, PCM_LIMIT);
        }
        self.state.process_frame(&mut frame[..], &self.input)
    }
}

/// Provider for [`RnnoiseModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RnnoiseProvider;

impl ModelProvider for RnnoiseProvider {
    fn create(&self) -> Result<Box<dyn DenoiseModel>> {
        if DenoiseState::FRAME_SIZE != FRAME_SIZE {
            return Err(NoiseGuardError::ModelInit(format!(
                "rnnoise frame size {} does not match {}",
                DenoiseState::FRAME_SIZE,
                FRAME_SIZE
            )));
        }
        info!("creating rnnoise model");
        Ok(Box::new(RnnoiseModel::new()))
    }

    fn name(&self) -> &'static str {
        "rnnoise"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_frame_stays_quiet() {
        let mut model = RnnoiseProvider.create().unwrap();
        let mut frame = [0.0f32; FRAME_SIZE];
        let vad = model.process_frame(&mut frame);
        assert!((0.0..=1.0).contains(&vad), "vad={vad}");
        assert!(frame.iter().all(|s| s.abs() < 1.0));
    }
}
