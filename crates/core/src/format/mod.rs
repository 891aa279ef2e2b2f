//! Audio container serializers
//!
//! Both containers carry mono signed 16-bit PCM. The biased sample buffer is
//! converted with [`to_signed`](crate::buffer::to_signed) on the way out, and
//! each file is assembled in memory and handed to the writer in one call.

mod aiff;
mod wav;

pub use aiff::{extended_from_f64, extended_to_f64, write_aiff, AiffEncoder};
pub use wav::{write_wav, WavEncoder};

use crate::buffer::SampleBuffer;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Serializes a finished sample buffer into a container
pub trait AudioEncoder {
    /// Write the complete file for `buffer` to `writer`
    fn encode(&self, buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()>;

    /// Size of the encoded file in bytes
    fn encoded_len(&self, samples: u64) -> u64;
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Aiff,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    /// Parse a format name or extension, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(AudioFormat::Wav),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            _ => None,
        }
    }

    /// Get file extension for format
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Aiff => "aiff",
        }
    }

    pub fn encoder(&self) -> Box<dyn AudioEncoder> {
        match self {
            AudioFormat::Wav => Box::new(WavEncoder),
            AudioFormat::Aiff => Box::new(AiffEncoder),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialize `buffer` in `format`
pub fn encode_to(format: AudioFormat, buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()> {
    format.encoder().encode(buffer, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        assert_eq!(AudioFormat::from_path(&PathBuf::from("out.wav")), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path(&PathBuf::from("OUT.AIF")), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::from_path(&PathBuf::from("out.ogg")), None);
        assert_eq!(AudioFormat::from_path(&PathBuf::from("out")), None);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(AudioFormat::from_name("AIFF"), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::Aiff.extension(), "aiff");
        assert_eq!(AudioFormat::Wav.to_string(), "wav");
    }

    #[test]
    fn test_encode_to_matches_declared_length() {
        let mut buffer = SampleBuffer::new(8000, 100).unwrap();
        buffer.extend_silence(37).unwrap();

        for format in [AudioFormat::Wav, AudioFormat::Aiff] {
            let mut out = Vec::new();
            encode_to(format, &buffer, &mut out).unwrap();
            assert_eq!(out.len() as u64, format.encoder().encoded_len(37));
        }
    }
}
