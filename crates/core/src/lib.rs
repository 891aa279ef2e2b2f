//! sstvtx Core - sample buffers, tone synthesis and audio containers
//!
//! This crate provides the biased 16-bit sample buffer, the phase-continuous
//! DDS oscillator with raised-cosine envelopes, and the WAV/AIFF serializers
//! used by the SSTV encoder.

pub mod buffer;
pub mod envelope;
pub mod error;
pub mod format;
pub mod oscillator;

pub use error::{CoreError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        buffer::{SampleBuffer, BIAS, DEFAULT_MAX_DURATION_SECS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE},
        envelope::EnvelopeSpec,
        error::{CoreError, Result},
        format::{encode_to, write_aiff, write_wav, AudioEncoder, AudioFormat},
        oscillator::{Oscillator, OscillatorState, Segment, ToneEvent, DEFAULT_AMPLITUDE},
    };
}
