//! Error types for sstvtx core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid sample rate: {rate} Hz")]
    InvalidSampleRate { rate: u32 },

    #[error("Invalid amplitude: {amplitude} (must be 1..=32767)")]
    InvalidAmplitude { amplitude: u32 },

    #[error("Invalid tone parameters: {msg}")]
    InvalidToneParameters { msg: String },

    #[error("Invalid envelope parameters: {msg}")]
    InvalidEnvelope { msg: String },

    #[error("Sample buffer overflow: {requested} samples requested, capacity {capacity}")]
    SampleBufferOverflow { requested: u64, capacity: u64 },

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Only I/O failures (disk full, broken pipe) can succeed on a retry;
    /// every other kind is deterministic for the same inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Io(_))
    }
}

/// Result type for sstvtx core operations
pub type Result<T> = std::result::Result<T, CoreError>;
