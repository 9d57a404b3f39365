//! Deterministic comfort-noise source.

/// Seed restored on every `FrameProcessor::init`, so output is reproducible.
pub const NOISE_SEED: u32 = 0x1234_5678;

/// Peak comfort-noise amplitude, about -60 dBFS.
pub const COMFORT_NOISE_LEVEL: f32 = 0.001;

/// xorshift32 generator producing low-level noise samples.
///
/// Per-instance state: two processors never share a sequence.
#[derive(Debug, Clone)]
pub struct ComfortNoise {
    state: u32,
}

impl ComfortNoise {
    pub fn new() -> Self {
        Self { state: NOISE_SEED }
    }

    pub fn reset(&mut self) {
        self.state = NOISE_SEED;
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next sample in [-COMFORT_NOISE_LEVEL, COMFORT_NOISE_LEVEL).
    #[inline]
    pub fn sample(&mut self) -> f32 {
        let unit = self.next_u32() as i32 as f32 / 2_147_483_648.0;
        unit * COMFORT_NOISE_LEVEL
    }
}

impl Default for ComfortNoise {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_level() {
        let mut noise = ComfortNoise::new();
        for _ in 0..10_000 {
            let s = noise.sample();
            assert!(s.abs() <= COMFORT_NOISE_LEVEL, "sample={s}");
        }
    }

    #[test]
    fn reset_replays_sequence() {
        let mut noise = ComfortNoise::new();
        let first: Vec<f32> = (0..32).map(|_| noise.sample()).collect();
        noise.reset();
        let second: Vec<f32> = (0..32).map(|_| noise.sample()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn known_first_value() {
        // 0x12345678 after one xorshift32 step
        let mut noise = ComfortNoise::new();
        assert_eq!(noise.next_u32(), 0x87985aa5);
    }

    #[test]
    fn not_constant() {
        let mut noise = ComfortNoise::new();
        let a = noise.sample();
        let b = noise.sample();
        assert_ne!(a, b);
    }
}
