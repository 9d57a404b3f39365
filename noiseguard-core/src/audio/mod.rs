//! Offline audio helpers. Live device I/O belongs to the host, not this crate.

pub mod resample;

pub use resample::RateConverter;

/// Root-mean-square of a sample slice; 0.0 when empty.
pub fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn rms_of_square_wave() {
        let samples: Vec<f32> = (0..256)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        assert_relative_eq!(compute_rms(&samples), 0.5, epsilon = 1e-5);
        assert_eq!(compute_rms(&[]), 0.0);
    }
}
