//! Transmitter pipeline

use crate::config::TxConfig;
use anyhow::{Context, Result};
use sstvtx_codecs::cw::{encode_cw, CwMessage};
use sstvtx_core::buffer::{SampleBuffer, DEFAULT_MAX_DURATION_SECS};
use sstvtx_core::format::{encode_to, AudioFormat};
use sstvtx_core::CoreError;
use sstvtx_modem::image::RgbBuffer;
use sstvtx_modem::modes::ModeDefinition;
use sstvtx_modem::session::EncodingSession;
use sstvtx_modem::vis::{attention_preamble, encode_vis, total_duration_us, vis_trailer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Silence between the trailer and the CW identifier
pub const CW_LEAD_IN_US: f64 = 2_000_000.0;

/// SSTV transmitter
#[derive(Debug)]
pub struct Transmitter {
    config: TxConfig,
    mode: &'static ModeDefinition,
    cw: Option<CwMessage>,
    max_duration_secs: u32,
}

impl Transmitter {
    /// Create a new transmitter, validating the configuration
    pub fn new(config: TxConfig) -> Result<Self> {
        config.validate()?;
        let mode = config.mode_definition()?;
        let cw = config.cw_message()?;

        Ok(Self {
            config,
            mode,
            cw,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        })
    }

    /// Cap the length of the produced audio
    pub fn with_max_duration(mut self, secs: u32) -> Self {
        self.max_duration_secs = secs;
        self
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn mode(&self) -> &'static ModeDefinition {
        self.mode
    }

    /// Length of the complete transmission in microseconds
    pub fn plan_duration_us(&self) -> Result<f64> {
        let mut total = 0.0;
        if self.config.preamble {
            total += total_duration_us(&attention_preamble());
        }
        total += encode_vis(self.mode)?.iter().map(|t| t.duration_us).sum::<f64>();
        total += self.mode.image_duration_us();
        if self.config.trailer {
            total += total_duration_us(&vis_trailer());
        }
        if let Some(cw) = &self.cw {
            total += CW_LEAD_IN_US + cw.duration_us()?;
        }
        Ok(total)
    }

    /// Encode `pixels` into a complete transmission
    pub fn transmit(&self, pixels: &RgbBuffer) -> Result<SampleBuffer> {
        // fail on dimensions and capacity before rendering anything
        self.mode.check_dimensions(pixels.width(), pixels.height())?;

        let planned_us = self.plan_duration_us()?;
        let planned_samples = (planned_us * f64::from(self.config.sample_rate) / 1e6).ceil() as u64;
        let capacity = u64::from(self.config.sample_rate) * u64::from(self.max_duration_secs);
        debug!(
            "Planned {:.3} s ({} samples), capacity {} samples",
            planned_us / 1e6,
            planned_samples,
            capacity
        );
        if planned_samples > capacity {
            let overflow = CoreError::SampleBufferOverflow {
                requested: planned_samples,
                capacity,
            };
            return Err(anyhow::Error::new(overflow).context(format!(
                "{} transmission needs {:.1} s but at most {} s of audio is allowed",
                self.mode.display_name,
                planned_us / 1e6,
                self.max_duration_secs
            )));
        }

        // one spare second absorbs rounding of the per-tone carry
        let mut session = EncodingSession::new(
            self.config.sample_rate,
            self.config.amplitude,
            self.max_duration_secs.saturating_add(1),
        )?;

        if self.config.preamble {
            session.add_preamble()?;
        }
        session.add_vis_header(self.mode)?;
        session.add_image(self.mode, pixels)?;
        if self.config.trailer {
            session.add_trailer()?;
        }
        if let Some(cw) = &self.cw {
            session.add_silence(CW_LEAD_IN_US)?;
            let segments = encode_cw(cw)?;
            session.add_segments(&segments)?;
            info!("Added CW identifier '{}' at {} WPM", cw.text(), cw.wpm());
        }

        Ok(session.finish())
    }

    /// Write `buffer` to the configured output file
    pub fn write(&self, buffer: &SampleBuffer) -> Result<()> {
        let path = self.config.output_path();
        write_audio_file(buffer, &path, self.config.audio_format())
    }
}

/// Serialize `buffer` into `path`
pub fn write_audio_file(buffer: &SampleBuffer, path: &Path, format: AudioFormat) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    encode_to(format, buffer, &mut writer)
        .with_context(|| format!("Failed to write {} file: {:?}", format, path))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output file: {:?}", path))?;

    info!("Wrote {} samples to {:?} ({})", buffer.len(), path, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn config(mode: &str) -> TxConfig {
        TxConfig {
            input: PathBuf::from("card.png"),
            mode: mode.to_string(),
            sample_rate: 8000,
            ..TxConfig::default()
        }
    }

    #[test]
    fn test_transmitter_creation() {
        let transmitter = Transmitter::new(config("r36")).unwrap();
        assert_eq!(transmitter.mode().code, "r36");
        assert!(Transmitter::new(config("nope")).is_err());
    }

    #[test]
    fn test_plan_duration() {
        let plain = Transmitter::new(TxConfig {
            preamble: false,
            trailer: false,
            ..config("r36")
        })
        .unwrap();
        assert_abs_diff_eq!(plain.plan_duration_us().unwrap(), 36.91e6, epsilon = 1.0);

        let full = Transmitter::new(config("r36")).unwrap();
        assert_abs_diff_eq!(full.plan_duration_us().unwrap(), 39.15e6, epsilon = 1.0);
    }

    #[test]
    fn test_transmit_matches_plan() {
        let transmitter = Transmitter::new(TxConfig {
            callsign: Some("n0call".to_string()),
            cw_wpm: 30,
            ..config("r36")
        })
        .unwrap();
        let img = RgbBuffer::from_fn(320, 240, |x, y| [x as u8, y as u8, 128]);

        let buffer = transmitter.transmit(&img).unwrap();
        let planned = transmitter.plan_duration_us().unwrap() / 1e6;
        assert!((buffer.duration_secs() - planned).abs() < 1e-3);
    }

    #[test]
    fn test_capacity_checked_before_rendering() {
        let transmitter = Transmitter::new(config("r36")).unwrap().with_max_duration(30);
        let img = RgbBuffer::filled(320, 240, [0, 0, 0]);
        let err = transmitter.transmit(&img).unwrap_err();
        assert!(err.to_string().contains("at most 30 s"));
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::SampleBufferOverflow { capacity: 240_000, .. })
        ));
    }

    #[test]
    fn test_wrong_image_size() {
        let transmitter = Transmitter::new(config("m1")).unwrap();
        let img = RgbBuffer::filled(320, 240, [0, 0, 0]);
        assert!(transmitter.transmit(&img).is_err());
    }
}
