//! Voice-activity gate: target-gain curve plus one-pole gain smoothing.
//!
//! The target curve has three regions, with `low = threshold - VAD_HYSTERESIS`:
//!
//! | voice activity        | target gain                                      |
//! |-----------------------|--------------------------------------------------|
//! | `vad >= threshold`    | 1.0                                              |
//! | `low <= vad < threshold` | floor → 1.0, linear in the position in the band |
//! | `vad < low`           | floor → 1.0, linear in `vad / max(low, MIN_GATE_SPAN)` |
//!
//! The target is allowed to jump at `low`; the smoother turns any jump into
//! an exponential glide so the applied gain never clicks.

/// Lowest gain the gate ever applies.
pub const MIN_GATE_GAIN: f32 = 0.001;

/// Width of the band below the threshold where the gate partially opens.
pub const VAD_HYSTERESIS: f32 = 0.1;

/// One-pole smoothing coefficient per frame (~120 ms time constant at 10 ms frames).
pub const GAIN_SMOOTH_COEFF: f32 = 0.08;

/// Smallest denominator for the below-band ratio when the threshold sits near zero.
pub const MIN_GATE_SPAN: f32 = 0.01;

/// Target gain for a voice-activity probability under `threshold`.
pub fn target_gain(vad: f32, threshold: f32) -> f32 {
    let band_floor = threshold - VAD_HYSTERESIS;

    if vad >= threshold {
        1.0
    } else if vad < band_floor {
        let ratio = vad / band_floor.max(MIN_GATE_SPAN);
        (MIN_GATE_GAIN + ratio * (1.0 - MIN_GATE_GAIN)).max(MIN_GATE_GAIN)
    } else {
        let ratio = (vad - band_floor) / VAD_HYSTERESIS;
        MIN_GATE_GAIN + ratio * (1.0 - MIN_GATE_GAIN)
    }
}

/// Exponential moving average of the gate gain. Processing-thread private.
#[derive(Debug, Clone)]
pub struct GainSmoother {
    gain: f32,
}

impl GainSmoother {
    pub fn new() -> Self {
        Self { gain: 1.0 }
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Move one step toward `target` and return the clamped result.
    ///
    /// A single step changes the gain by at most `GAIN_SMOOTH_COEFF * |target - gain|`.
    #[inline]
    pub fn step(&mut self, target: f32) -> f32 {
        self.gain += GAIN_SMOOTH_COEFF * (target - self.gain);
        self.gain = self.gain.clamp(MIN_GATE_GAIN, 1.0);
        self.gain
    }
}

impl Default for GainSmoother {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn open_at_and_above_threshold() {
        assert_eq!(target_gain(0.5, 0.5), 1.0);
        assert_eq!(target_gain(0.9, 0.5), 1.0);
    }

    #[test]
    fn floor_at_zero_activity() {
        assert_relative_eq!(target_gain(0.0, 0.5), MIN_GATE_GAIN);
    }

    #[test]
    fn band_edges() {
        let threshold = 0.5;
        let low = threshold - VAD_HYSTERESIS;
        assert_relative_eq!(target_gain(low - 1e-6, threshold), 1.0, epsilon = 1e-4);
        assert_relative_eq!(target_gain(low, threshold), MIN_GATE_GAIN, epsilon = 1e-4);

        // continuous at the threshold itself
        assert_relative_eq!(target_gain(threshold - 1e-6, threshold), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn band_midpoint_is_halfway() {
        let gain = target_gain(0.45, 0.5);
        let expected = MIN_GATE_GAIN + 0.5 * (1.0 - MIN_GATE_GAIN);
        assert_relative_eq!(gain, expected, epsilon = 1e-4);
    }

    #[test]
    fn near_zero_threshold_uses_minimum_span() {
        // threshold - hyst is negative; nothing is below the band, and the
        // band itself keeps the ratio bounded.
        let gain = target_gain(0.0, 0.05);
        assert!(gain.is_finite());
        assert!((MIN_GATE_GAIN..=1.0).contains(&gain));

        // threshold just above the hysteresis: span would be 0.005 without the floor
        let gain = target_gain(0.004, 0.105);
        assert!(gain.is_finite());
        let expected = MIN_GATE_GAIN + 0.4 * (1.0 - MIN_GATE_GAIN);
        assert_relative_eq!(gain, expected, epsilon = 1e-3);
    }

    #[test]
    fn target_stays_in_range_over_grid() {
        for t in 0..=20 {
            for v in 0..=20 {
                let gain = target_gain(v as f32 / 20.0, t as f32 / 20.0);
                assert!(
                    (MIN_GATE_GAIN - 1e-6..=1.0 + 1e-6).contains(&gain),
                    "vad={v} threshold={t} gain={gain}"
                );
            }
        }
    }

    #[test]
    fn smoother_step_is_bounded() {
        let mut smoother = GainSmoother::new();
        let before = smoother.gain();
        let after = smoother.step(MIN_GATE_GAIN);
        let max_step = GAIN_SMOOTH_COEFF * (before - MIN_GATE_GAIN);
        assert_relative_eq!(before - after, max_step, epsilon = 1e-6);
    }

    #[test]
    fn smoother_converges_and_clamps() {
        let mut smoother = GainSmoother::new();
        for _ in 0..500 {
            smoother.step(0.0);
        }
        assert_eq!(smoother.gain(), MIN_GATE_GAIN);

        for _ in 0..500 {
            smoother.step(2.0);
        }
        assert_eq!(smoother.gain(), 1.0);
    }
}
