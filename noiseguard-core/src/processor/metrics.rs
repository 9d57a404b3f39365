//! Per-frame metrics published by the processing thread.
//!
//! One writer, many readers. Every field is its own relaxed atomic, so a
//! reader never sees a torn value but may mix fields from adjacent frames
//! in one [`AudioMetrics::snapshot`]. Consumers must not assume the fields
//! of a snapshot describe the same frame.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use atomic_float::AtomicF32;

/// Live metrics, shared via `Arc` with UI/control threads.
#[derive(Debug)]
pub struct AudioMetrics {
    input_rms: AtomicF32,
    output_rms: AtomicF32,
    vad_probability: AtomicF32,
    current_gain: AtomicF32,
    frames_processed: AtomicU64,
}

impl Default for AudioMetrics {
    fn default() -> Self {
        Self {
            input_rms: AtomicF32::new(0.0),
            output_rms: AtomicF32::new(0.0),
            vad_probability: AtomicF32::new(0.0),
            current_gain: AtomicF32::new(1.0),
            frames_processed: AtomicU64::new(0),
        }
    }
}

impl AudioMetrics {
    /// Zero the meters; gain reads as fully open.
    pub fn reset(&self) {
        self.input_rms.store(0.0, Ordering::Relaxed);
        self.output_rms.store(0.0, Ordering::Relaxed);
        self.vad_probability.store(0.0, Ordering::Relaxed);
        self.current_gain.store(1.0, Ordering::Relaxed);
        self.frames_processed.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            input_rms: self.input_rms.load(Ordering::Relaxed),
            output_rms: self.output_rms.load(Ordering::Relaxed),
            vad_probability: self.vad_probability.load(Ordering::Relaxed),
            current_gain: self.current_gain.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
        }
    }

    pub fn input_rms(&self) -> f32 {
        self.input_rms.load(Ordering::Relaxed)
    }

    pub fn output_rms(&self) -> f32 {
        self.output_rms.load(Ordering::Relaxed)
    }

    pub fn vad_probability(&self) -> f32 {
        self.vad_probability.load(Ordering::Relaxed)
    }

    pub fn current_gain(&self) -> f32 {
        self.current_gain.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub(crate) fn publish_input_rms(&self, rms: f32) {
        self.input_rms.store(rms, Ordering::Relaxed);
    }

    pub(crate) fn publish_output_rms(&self, rms: f32) {
        self.output_rms.store(rms, Ordering::Relaxed);
    }

    pub(crate) fn publish_vad(&self, vad: f32) {
        self.vad_probability.store(vad, Ordering::Relaxed);
    }

    pub(crate) fn publish_gain(&self, gain: f32) {
        self.current_gain.store(gain, Ordering::Relaxed);
    }

    pub(crate) fn count_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`AudioMetrics`] for the UI / IPC layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Pre-processing RMS; nominally [0, 1], can exceed 1 on clipped input.
    pub input_rms: f32,
    /// Post-processing RMS.
    pub output_rms: f32,
    /// Last voice-activity probability in [0, 1].
    pub vad_probability: f32,
    /// Applied gate gain in [MIN_GATE_GAIN, 1].
    pub current_gain: f32,
    pub frames_processed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let metrics = AudioMetrics::default();
        metrics.publish_input_rms(0.3);
        metrics.publish_output_rms(0.2);
        metrics.publish_vad(0.9);
        metrics.publish_gain(0.5);
        metrics.count_frame();
        metrics.count_frame();
        assert_eq!(metrics.frames_processed(), 2);

        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.input_rms, 0.0);
        assert_eq!(snap.output_rms, 0.0);
        assert_eq!(snap.vad_probability, 0.0);
        assert_eq!(snap.current_gain, 1.0);
        assert_eq!(snap.frames_processed, 0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let metrics = AudioMetrics::default();
        metrics.publish_vad(0.75);
        metrics.count_frame();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["vadProbability"], 0.75);
        assert_eq!(json["framesProcessed"], 1);
        assert_eq!(json["currentGain"], 1.0);
    }
}
