//! Sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! Every denoise backend runs at 48 kHz. `RateConverter` brings offline
//! material to that rate and back. It allocates freely and is never used on
//! the processing thread.
//!
//! When both rates match, `RateConverter` is a passthrough and no rubato
//! session is created at all.
//!
//! ## Usage
//!
//! ```ignore
//! let mut rc = RateConverter::new(44_100, 48_000, 1024)?;
//! let mut out = rc.process(&samples)?;
//! out.extend(rc.flush()?);
//! ```

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

use crate::error::{NoiseGuardError, Result};

/// Converts f32 mono audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when from == to (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Holds a partial input chunk between calls.
    input_buf: Vec<f32>,
    /// Input samples rubato consumes per call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// # Errors
    /// Returns `NoiseGuardError::Resample` if rubato rejects the parameters.
    pub fn new(from_rate: u32, to_rate: u32, chunk_size: usize) -> Result<Self> {
        if from_rate == to_rate {
            return Ok(Self {
                resampler: None,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = to_rate as f64 / from_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| NoiseGuardError::Resample(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        debug!(from_rate, to_rate, chunk_size, max_out, "resampling enabled");

        Ok(Self {
            resampler: Some(resampler),
            input_buf: Vec::with_capacity(chunk_size * 2),
            chunk_size,
            output_buf: vec![vec![0f32; max_out]; 1],
        })
    }

    /// Feed samples and return whatever output is ready (may be empty).
    ///
    /// Input is accumulated until a full `chunk_size` block is available;
    /// the remainder waits for the next call or for [`flush`](Self::flush).
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        if self.resampler.is_none() {
            return Ok(samples.to_vec());
        }

        self.input_buf.extend_from_slice(samples);
        let mut result = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            self.run_chunk(&mut result)?;
        }

        Ok(result)
    }

    /// Zero-pad and convert any buffered remainder.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let mut result = Vec::new();
        if self.resampler.is_none() || self.input_buf.is_empty() {
            return Ok(result);
        }

        self.input_buf.resize(self.chunk_size, 0.0);
        self.run_chunk(&mut result)?;
        Ok(result)
    }

    /// Returns `true` when both rates match.
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }

    fn run_chunk(&mut self, result: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };

        let input_slice = &self.input_buf[..self.chunk_size];
        let (_consumed, produced) = resampler
            .process_into_buffer(&[input_slice], &mut self.output_buf, None)
            .map_err(|e| NoiseGuardError::Resample(e.to_string()))?;
        result.extend_from_slice(&self.output_buf[0][..produced]);

        self.input_buf.drain(..self.chunk_size);
        Ok(())
    }
}
