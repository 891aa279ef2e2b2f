//! Error types for sstvtx modem

use thiserror::Error;

/// Modem error types
#[derive(Error, Debug)]
pub enum ModemError {
    #[error("Invalid mode definition: {msg}")]
    InvalidModeDefinition { msg: String },

    #[error("Unknown SSTV mode: {name}")]
    UnknownMode { name: String },

    #[error(
        "Image dimension mismatch: mode needs {}x{}, got {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    ImageDimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Image buffer size mismatch: expected {expected} bytes, got {actual}")]
    ImageBufferSize { expected: usize, actual: usize },

    #[error("Core error: {0}")]
    Core(#[from] sstvtx_core::CoreError),
}

impl ModemError {
    /// Only I/O failures from the core are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ModemError::Core(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for sstvtx modem operations
pub type Result<T> = std::result::Result<T, ModemError>;
