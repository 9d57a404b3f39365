use thiserror::Error;

/// All errors produced by noiseguard-core.
///
/// Only control-thread operations return these. The real-time path
/// (`FrameProcessor::process_frame`, ring `write`/`read`) never fails; it
/// degrades to neutral values or partial counts instead.
#[derive(Debug, Error)]
pub enum NoiseGuardError {
    #[error("denoise model could not be acquired: {0}")]
    ModelInit(String),

    #[error("frame processor is not initialized")]
    NotInitialized,

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("failed to spawn processing thread: {0}")]
    ThreadSpawn(String),

    #[error("resampler error: {0}")]
    Resample(String),
}

pub type Result<T> = std::result::Result<T, NoiseGuardError>;
