//! Encoding session
//!
//! Owns the single oscillator and sample buffer of one transmission. Every
//! stage appends through the same oscillator, so phase and the fractional
//! sample carry flow unbroken from the preamble to the CW identifier.

use crate::image::RgbBuffer;
use crate::modes::ModeDefinition;
use crate::scan::encode_image;
use crate::vis::{attention_preamble, encode_vis, vis_trailer};
use crate::Result;
use sstvtx_core::buffer::SampleBuffer;
use sstvtx_core::oscillator::{Oscillator, Segment, ToneEvent};
use tracing::{debug, info};

/// One in-progress transmission
#[derive(Debug)]
pub struct EncodingSession {
    oscillator: Oscillator,
    buffer: SampleBuffer,
}

impl EncodingSession {
    /// Session at `sample_rate` holding at most `max_duration_secs` of audio
    pub fn new(sample_rate: u32, amplitude: u16, max_duration_secs: u32) -> Result<Self> {
        let buffer = SampleBuffer::with_max_duration(sample_rate, max_duration_secs)?;
        let oscillator = Oscillator::new(sample_rate, amplitude)?;
        debug!(
            "Session: {} Hz, amplitude {}, capacity {} samples",
            sample_rate,
            amplitude,
            buffer.capacity()
        );
        Ok(Self { oscillator, buffer })
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Audio produced so far, in seconds
    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// Append segments in order
    pub fn add_segments<'a, I>(&mut self, segments: I) -> Result<u64>
    where
        I: IntoIterator<Item = &'a Segment>,
    {
        let mut written = 0;
        for segment in segments {
            written += self.oscillator.render(&mut self.buffer, segment)?;
        }
        Ok(written)
    }

    /// Append unshaped tones in order
    pub fn add_tones<I>(&mut self, tones: I) -> Result<u64>
    where
        I: IntoIterator<Item = ToneEvent>,
    {
        let mut written = 0;
        for tone in tones {
            written += self
                .oscillator
                .emit(&mut self.buffer, tone.frequency_hz, tone.duration_us, None)?;
        }
        Ok(written)
    }

    /// Append exact-bias silence
    pub fn add_silence(&mut self, duration_us: f64) -> Result<u64> {
        Ok(self.oscillator.emit_silence(&mut self.buffer, duration_us)?)
    }

    /// Append the attention preamble
    pub fn add_preamble(&mut self) -> Result<u64> {
        let written = self.add_segments(&attention_preamble())?;
        debug!("Preamble: {} samples", written);
        Ok(written)
    }

    /// Append the VIS header identifying `mode`
    pub fn add_vis_header(&mut self, mode: &ModeDefinition) -> Result<u64> {
        let tones = encode_vis(mode)?;
        let written = self.add_tones(tones)?;
        info!("Added VIS header for {} (VIS {})", mode.display_name, mode.vis_code);
        Ok(written)
    }

    /// Append every scan line of `pixels`
    pub fn add_image(&mut self, mode: &ModeDefinition, pixels: &RgbBuffer) -> Result<u64> {
        let lines = encode_image(mode, pixels)?;
        let start = self.buffer.len();
        let written = self.add_tones(lines)?;
        info!(
            "Encoded {}x{} image in {}: {:.2} s",
            mode.width,
            mode.height,
            mode.display_name,
            (self.buffer.len() - start) as f64 / f64::from(self.sample_rate())
        );
        Ok(written)
    }

    /// Append the closing tones
    pub fn add_trailer(&mut self) -> Result<u64> {
        let written = self.add_segments(&vis_trailer())?;
        debug!("Trailer: {} samples", written);
        Ok(written)
    }

    /// Finish the session and hand over the buffer
    pub fn finish(self) -> SampleBuffer {
        info!(
            "Transmission complete: {} samples, {:.2} s",
            self.buffer.len(),
            self.buffer.duration_secs()
        );
        self.buffer
    }
}
