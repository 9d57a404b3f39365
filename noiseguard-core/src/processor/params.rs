//! Control-thread knobs read by the processing thread once per frame.
//!
//! Each field is an independent relaxed atomic. A new value is picked up by
//! some upcoming frame; there is no cross-field transaction, so a frame may
//! see a new level together with an old threshold. These are continuous
//! controls, so that is acceptable.

use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

pub const DEFAULT_SUPPRESSION_LEVEL: f32 = 1.0;
pub const DEFAULT_VAD_THRESHOLD: f32 = 0.5;
pub const DEFAULT_COMFORT_NOISE: bool = true;

/// Shared processor parameters. Hand out via `Arc` to UI/control threads.
#[derive(Debug)]
pub struct ProcessorParams {
    suppression_level: AtomicF32,
    vad_threshold: AtomicF32,
    comfort_noise: AtomicBool,
}

impl ProcessorParams {
    pub fn new(suppression_level: f32, vad_threshold: f32, comfort_noise: bool) -> Self {
        let params = Self::default();
        params.set_suppression_level(suppression_level);
        params.set_vad_threshold(vad_threshold);
        params.set_comfort_noise(comfort_noise);
        params
    }

    /// Suppression level: 0.0 = bypass, 1.0 = full effect. Clamped to [0, 1].
    pub fn set_suppression_level(&self, level: f32) {
        self.suppression_level.store(clamp_unit(level), Ordering::Relaxed);
    }

    pub fn suppression_level(&self) -> f32 {
        self.suppression_level.load(Ordering::Relaxed)
    }

    /// Voice-activity gate threshold. Higher = more aggressive gating.
    /// Clamped to [0, 1].
    pub fn set_vad_threshold(&self, threshold: f32) {
        self.vad_threshold.store(clamp_unit(threshold), Ordering::Relaxed);
    }

    pub fn vad_threshold(&self) -> f32 {
        self.vad_threshold.load(Ordering::Relaxed)
    }

    /// Enable/disable comfort noise while the gate is nearly closed.
    pub fn set_comfort_noise(&self, enabled: bool) {
        self.comfort_noise.store(enabled, Ordering::Relaxed);
    }

    pub fn comfort_noise(&self) -> bool {
        self.comfort_noise.load(Ordering::Relaxed)
    }
}

impl Default for ProcessorParams {
    fn default() -> Self {
        Self {
            suppression_level: AtomicF32::new(DEFAULT_SUPPRESSION_LEVEL),
            vad_threshold: AtomicF32::new(DEFAULT_VAD_THRESHOLD),
            comfort_noise: AtomicBool::new(DEFAULT_COMFORT_NOISE),
        }
    }
}

/// NaN maps to 0 so a bad UI value degrades to bypass rather than poisoning the gate.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = ProcessorParams::default();
        assert_eq!(params.suppression_level(), 1.0);
        assert_eq!(params.vad_threshold(), 0.5);
        assert!(params.comfort_noise());
    }

    #[test]
    fn setters_clamp_to_unit_range() {
        let params = ProcessorParams::default();

        params.set_suppression_level(0.5);
        assert_eq!(params.suppression_level(), 0.5);
        params.set_suppression_level(1.5);
        assert_eq!(params.suppression_level(), 1.0);
        params.set_suppression_level(-0.5);
        assert_eq!(params.suppression_level(), 0.0);

        params.set_vad_threshold(2.0);
        assert_eq!(params.vad_threshold(), 1.0);
        params.set_vad_threshold(f32::NAN);
        assert_eq!(params.vad_threshold(), 0.0);
    }

    #[test]
    fn new_applies_clamping() {
        let params = ProcessorParams::new(3.0, -1.0, false);
        assert_eq!(params.suppression_level(), 1.0);
        assert_eq!(params.vad_threshold(), 0.0);
        assert!(!params.comfort_noise());
    }
}
