//! Processing-thread loop.
//!
//! ## Per iteration
//!
//! ```text
//! 1. Fewer than FRAME_SIZE samples buffered → sleep idle_sleep, poll again
//! 2. Pull exactly one frame from the input ring
//! 3. FrameProcessor::process_frame (in place)
//! 4. Push the frame to the output ring; count any shortfall as dropped
//! ```
//!
//! The rings have no wake-up mechanism, so the loop polls. A short write to
//! the output ring is back-pressure from a slow consumer, not a fault, and
//! is only counted.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    buffering::{RingConsumer, RingProducer},
    denoise::FRAME_SIZE,
    error::{NoiseGuardError, Result},
    processor::FrameProcessor,
};

/// Counters published by the processing thread.
#[derive(Debug, Default)]
pub struct PipelineDiagnostics {
    pub frames_processed: AtomicU64,
    pub samples_dropped: AtomicU64,
    pub idle_polls: AtomicU64,
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.frames_processed.store(0, Ordering::Relaxed);
        self.samples_dropped.store(0, Ordering::Relaxed);
        self.idle_polls.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub frames_processed: u64,
    pub samples_dropped: u64,
    pub idle_polls: u64,
}

/// Everything the processing thread owns, moved in as one value.
pub struct PipelineContext {
    /// Must already be initialized; the loop never calls `init`/`destroy`.
    pub processor: FrameProcessor,
    pub input: RingConsumer,
    pub output: RingProducer,
    pub running: Arc<AtomicBool>,
    pub diagnostics: Arc<PipelineDiagnostics>,
    pub idle_sleep: Duration,
}

/// Run until `ctx.running` is cleared, then hand the processor back so the
/// control thread can `destroy` it.
pub fn run(ctx: PipelineContext) -> FrameProcessor {
    let PipelineContext {
        mut processor,
        mut input,
        mut output,
        running,
        diagnostics,
        idle_sleep,
    } = ctx;

    info!(
        backend = processor.backend_name(),
        input_capacity = input.capacity(),
        output_capacity = output.capacity(),
        "pipeline started"
    );

    let mut frame = [0.0f32; FRAME_SIZE];

    while running.load(Ordering::SeqCst) {
        if input.available_read() < FRAME_SIZE {
            diagnostics.idle_polls.fetch_add(1, Ordering::Relaxed);
            thread::sleep(idle_sleep);
            continue;
        }

        let read = input.read(&mut frame);
        debug_assert_eq!(read, FRAME_SIZE, "single consumer saw data vanish");

        processor.process_frame(&mut frame);

        let written = output.write(&frame);
        diagnostics.frames_processed.fetch_add(1, Ordering::Relaxed);
        if written < FRAME_SIZE {
            diagnostics
                .samples_dropped
                .fetch_add((FRAME_SIZE - written) as u64, Ordering::Relaxed);
        }
    }

    let summary = diagnostics.snapshot();
    info!(
        frames = summary.frames_processed,
        dropped = summary.samples_dropped,
        idle_polls = summary.idle_polls,
        "pipeline exiting"
    );

    processor
}

/// Process every whole frame of an offline buffer in place.
///
/// A trailing partial frame is left untouched; callers pad if they need it
/// processed. Returns the number of frames processed.
///
/// # Errors
/// `NoiseGuardError::NotInitialized` if `init` has not succeeded.
pub fn process_buffer(processor: &mut FrameProcessor, samples: &mut [f32]) -> Result<usize> {
    if !processor.is_initialized() {
        return Err(NoiseGuardError::NotInitialized);
    }

    let mut frames = 0;
    for chunk in samples.chunks_exact_mut(FRAME_SIZE) {
        // chunks_exact_mut only yields FRAME_SIZE-long chunks.
        let Ok(frame) = <&mut [f32; FRAME_SIZE]>::try_from(chunk) else {
            continue;
        };
        processor.process_frame(frame);
        frames += 1;
    }
    debug_assert_eq!(frames, samples.len() / FRAME_SIZE);

    debug!(
        frames,
        remainder = samples.len() % FRAME_SIZE,
        "offline buffer processed"
    );
    Ok(frames)
}
