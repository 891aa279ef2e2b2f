//! RIFF/WAVE PCM16 mono writer

use super::AudioEncoder;
use crate::buffer::{to_signed, SampleBuffer};
use crate::Result;
use std::io::{Cursor, Write};
use tracing::debug;

/// Size of the RIFF, fmt and data headers
const HEADER_LEN: u64 = 44;

/// WAV container encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl AudioEncoder for WavEncoder {
    fn encode(&self, buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()> {
        write_wav(buffer, writer)
    }

    fn encoded_len(&self, samples: u64) -> u64 {
        HEADER_LEN + 2 * samples
    }
}

/// Write `buffer` as a mono 16-bit PCM WAV file
pub fn write_wav(buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity((HEADER_LEN as usize) + 2 * buffer.len()));
    {
        let mut wav = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in buffer.data() {
            wav.write_sample(to_signed(sample))?;
        }
        wav.finalize()?;
    }

    let bytes = cursor.into_inner();
    debug!(
        "WAV: {} samples at {} Hz, {} bytes",
        buffer.len(),
        buffer.sample_rate(),
        bytes.len()
    );
    writer.write_all(&bytes)?;
    Ok(())
}
