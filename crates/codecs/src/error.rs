//! Error types for sstvtx codecs

use thiserror::Error;

/// Codec error types
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid CW parameters: {msg}")]
    InvalidCwParameters { msg: String },

    #[error("Unsupported CW character: {ch:?}")]
    UnsupportedCwCharacter { ch: char },

    #[error("Core error: {0}")]
    Core(#[from] sstvtx_core::CoreError),
}

/// Result type for sstvtx codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
