//! `NoiseEngine` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! NoiseEngine::new()
//!     └─► start()   → processor.init() on this thread, rings built,
//!                     processing thread spawned, status = Running
//!         └─► stop() → running=false, thread joined, processor.destroy()
//!                      on this thread, status = Stopped
//! ```
//!
//! `start()`/`stop()` return an error when called in the wrong state rather
//! than panicking. A failed `init()` leaves the engine not running with
//! status `Error`.
//!
//! ## Threading
//!
//! The processor is moved into the processing thread and moved back out
//! through the `JoinHandle`, so `init`/`destroy` always run on the control
//! thread and never overlap `process_frame`. Control and UI threads only
//! touch the shared atomics in `ProcessorParams` and `AudioMetrics`.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    buffering::{create_audio_ring, RingConsumer, RingProducer},
    denoise::ModelProvider,
    error::{NoiseGuardError, Result},
    processor::{params, AudioMetrics, FrameProcessor, MetricsSnapshot, ProcessorParams},
};

use pipeline::{DiagnosticsSnapshot, PipelineContext, PipelineDiagnostics};

/// Name given to the processing thread.
const DSP_THREAD_NAME: &str = "noiseguard-dsp";

/// Configuration for `NoiseEngine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Requested ring size in samples, for both the input and output ring.
    /// Rounded up to a power of two. Default: 96 000 (→ 131 072, ~2.7 s at 48 kHz).
    pub ring_capacity: usize,
    /// Initial suppression level in [0, 1]. Default: 1.0.
    pub suppression_level: f32,
    /// Initial voice-activity gate threshold in [0, 1]. Default: 0.5.
    pub vad_threshold: f32,
    /// Initial comfort-noise toggle. Default: on.
    pub comfort_noise: bool,
    /// Processing-thread sleep when less than a frame is buffered. Default: 2 ms.
    pub idle_sleep_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 96_000,
            suppression_level: params::DEFAULT_SUPPRESSION_LEVEL,
            vad_threshold: params::DEFAULT_VAD_THRESHOLD,
            comfort_noise: params::DEFAULT_COMFORT_NOISE,
            idle_sleep_ms: 2,
        }
    }
}

/// Coarse engine state for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineStatus {
    /// Constructed, never started.
    Idle,
    /// Processing thread active.
    Running,
    /// Stopped after running.
    Stopped,
    /// Last `start()` failed.
    Error,
}

/// Host-side ends of the two rings created by `start()`.
///
/// The host's capture callback writes into `input`; its playback callback
/// reads processed audio from `output`.
#[derive(Debug)]
pub struct EngineIo {
    pub input: RingProducer,
    pub output: RingConsumer,
}

/// The top-level engine handle. `Send + Sync`; share it behind an `Arc`.
pub struct NoiseEngine {
    config: EngineConfig,
    provider: Arc<dyn ModelProvider>,
    params: Arc<ProcessorParams>,
    metrics: Arc<AudioMetrics>,
    diagnostics: Arc<PipelineDiagnostics>,
    running: Arc<AtomicBool>,
    status: Mutex<EngineStatus>,
    /// Parked processor while stopped; `None` while the thread owns it.
    processor: Mutex<Option<FrameProcessor>>,
    worker: Mutex<Option<JoinHandle<FrameProcessor>>>,
}

impl NoiseEngine {
    /// Create a stopped engine. Nothing is acquired until `start()`.
    pub fn new(config: EngineConfig, provider: Arc<dyn ModelProvider>) -> Self {
        let params = Arc::new(ProcessorParams::new(
            config.suppression_level,
            config.vad_threshold,
            config.comfort_noise,
        ));
        let metrics = Arc::new(AudioMetrics::default());
        let processor = FrameProcessor::with_shared(
            Arc::clone(&provider),
            Arc::clone(&params),
            Arc::clone(&metrics),
        );

        Self {
            config,
            provider,
            params,
            metrics,
            diagnostics: Arc::new(PipelineDiagnostics::default()),
            running: Arc::new(AtomicBool::new(false)),
            status: Mutex::new(EngineStatus::Idle),
            processor: Mutex::new(Some(processor)),
            worker: Mutex::new(None),
        }
    }

    /// Initialize the processor and spawn the processing thread.
    ///
    /// # Errors
    /// - `NoiseGuardError::AlreadyRunning` if already started.
    /// - `NoiseGuardError::ModelInit` if the model cannot be acquired.
    /// - `NoiseGuardError::ThreadSpawn` if the OS refuses the thread.
    pub fn start(&self) -> Result<EngineIo> {
        if self.running.load(Ordering::SeqCst) {
            return Err(NoiseGuardError::AlreadyRunning);
        }

        let mut processor = self
            .processor
            .lock()
            .take()
            .ok_or(NoiseGuardError::AlreadyRunning)?;

        if let Err(e) = processor.init() {
            *self.processor.lock() = Some(processor);
            self.set_status(EngineStatus::Error);
            error!("engine start failed: {e}");
            return Err(e);
        }

        let (input, pipeline_input) = create_audio_ring(self.config.ring_capacity);
        let (pipeline_output, output) = create_audio_ring(self.config.ring_capacity);

        self.diagnostics.reset();
        self.running.store(true, Ordering::SeqCst);

        let ctx = PipelineContext {
            processor,
            input: pipeline_input,
            output: pipeline_output,
            running: Arc::clone(&self.running),
            diagnostics: Arc::clone(&self.diagnostics),
            idle_sleep: Duration::from_millis(self.config.idle_sleep_ms),
        };

        let spawned = thread::Builder::new()
            .name(DSP_THREAD_NAME.into())
            .spawn(move || pipeline::run(ctx));

        match spawned {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                self.set_status(EngineStatus::Running);
                info!(
                    backend = self.provider.name(),
                    ring_capacity = input.capacity(),
                    "engine started"
                );
                Ok(EngineIo { input, output })
            }
            Err(e) => {
                // The closure, and the processor inside it, is gone.
                self.running.store(false, Ordering::SeqCst);
                *self.processor.lock() = Some(self.fresh_processor());
                self.set_status(EngineStatus::Error);
                error!("failed to spawn processing thread: {e}");
                Err(NoiseGuardError::ThreadSpawn(e.to_string()))
            }
        }
    }

    /// Stop the processing thread and release the model.
    ///
    /// Blocks until the processing thread has finished its current frame.
    ///
    /// # Errors
    /// - `NoiseGuardError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(NoiseGuardError::NotRunning);
        }

        let handle = self.worker.lock().take();
        let processor = match handle.map(JoinHandle::join) {
            Some(Ok(mut processor)) => {
                processor.destroy();
                processor
            }
            Some(Err(_)) => {
                error!("processing thread panicked");
                self.fresh_processor()
            }
            None => self.fresh_processor(),
        };
        *self.processor.lock() = Some(processor);

        self.set_status(EngineStatus::Stopped);
        info!("engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live parameter block; setters are lock-free and callable any time.
    pub fn controls(&self) -> Arc<ProcessorParams> {
        Arc::clone(&self.params)
    }

    /// Live metrics block for UI polling.
    pub fn metrics(&self) -> Arc<AudioMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn fresh_processor(&self) -> FrameProcessor {
        FrameProcessor::with_shared(
            Arc::clone(&self.provider),
            Arc::clone(&self.params),
            Arc::clone(&self.metrics),
        )
    }

    fn set_status(&self, new_status: EngineStatus) {
        *self.status.lock() = new_status;
    }
}

impl Drop for NoiseEngine {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

impl std::fmt::Debug for NoiseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseEngine")
            .field("backend", &self.provider.name())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::denoise::{DenoiseModel, FRAME_SIZE};

    struct FailingProvider;

    impl ModelProvider for FailingProvider {
        fn create(&self) -> Result<Box<dyn DenoiseModel>> {
            Err(NoiseGuardError::ModelInit("model file missing".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct OpenGate;

    impl DenoiseModel for OpenGate {
        fn process_frame(&mut self, _frame: &mut [f32; FRAME_SIZE]) -> f32 {
            1.0
        }
    }

    struct OpenGateProvider;

    impl ModelProvider for OpenGateProvider {
        fn create(&self) -> Result<Box<dyn DenoiseModel>> {
            Ok(Box::new(OpenGate))
        }

        fn name(&self) -> &'static str {
            "open-gate"
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            ring_capacity: FRAME_SIZE * 16,
            idle_sleep_ms: 1,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn failed_init_keeps_engine_stopped() {
        let engine = NoiseEngine::new(test_config(), Arc::new(FailingProvider));

        let err = engine.start().unwrap_err();
        assert!(matches!(err, NoiseGuardError::ModelInit(_)));
        assert!(!engine.is_running());
        assert_eq!(engine.status(), EngineStatus::Error);
        assert!(matches!(engine.stop(), Err(NoiseGuardError::NotRunning)));
    }

    #[test]
    fn start_stop_cycle() {
        let engine = NoiseEngine::new(test_config(), Arc::new(OpenGateProvider));
        assert_eq!(engine.status(), EngineStatus::Idle);

        let io = engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.status(), EngineStatus::Running);
        assert_eq!(io.input.capacity(), 8192);
        assert!(matches!(engine.start(), Err(NoiseGuardError::AlreadyRunning)));

        engine.stop().unwrap();
        assert!(!engine.is_running());
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert!(matches!(engine.stop(), Err(NoiseGuardError::NotRunning)));

        // restartable
        let _io = engine.start().unwrap();
        engine.stop().unwrap();
    }

    #[test]
    fn config_seeds_controls() {
        let config = EngineConfig {
            suppression_level: 0.25,
            vad_threshold: 0.7,
            comfort_noise: false,
            ..test_config()
        };
        let engine = NoiseEngine::new(config, Arc::new(OpenGateProvider));
        let controls = engine.controls();
        assert_eq!(controls.suppression_level(), 0.25);
        assert_eq!(controls.vad_threshold(), 0.7);
        assert!(!controls.comfort_noise());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "vadThreshold": 0.3, "comfortNoise": false }"#).unwrap();
        assert_eq!(config.vad_threshold, 0.3);
        assert!(!config.comfort_noise);
        assert_eq!(config.ring_capacity, EngineConfig::default().ring_capacity);
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&EngineStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
