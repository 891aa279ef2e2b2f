//! Configuration for the transmit tool

use crate::common::{default_output_path, load_config, save_config};
use crate::imaging::AspectMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sstvtx_codecs::cw::{CwMessage, DEFAULT_TONE_HZ, DEFAULT_WPM};
use sstvtx_core::buffer::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use sstvtx_core::format::AudioFormat;
use sstvtx_core::oscillator::{DEFAULT_AMPLITUDE, MAX_AMPLITUDE};
use sstvtx_modem::modes::ModeDefinition;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Characters refused in output file names
const FORBIDDEN_NAME_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '"', '\'', '\\', '*', '?', '(', ')', '{', '}', '[', ']', '!',
];

/// Transmitter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    /// Source image
    pub input: PathBuf,
    /// Output audio file, derived from the input when absent
    pub output: Option<PathBuf>,
    /// Mode short code
    pub mode: String,
    /// Container format, inferred from the output extension when absent
    pub format: Option<AudioFormat>,
    pub sample_rate: u32,
    pub aspect: AspectMode,
    /// Station callsign keyed in CW after the image
    pub callsign: Option<String>,
    pub cw_wpm: u32,
    pub cw_tone_hz: f64,
    /// Peak deviation from the bias
    pub amplitude: u16,
    pub preamble: bool,
    pub trailer: bool,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            mode: "m1".to_string(),
            format: None,
            sample_rate: 22050,
            aspect: AspectMode::Center,
            callsign: None,
            cw_wpm: DEFAULT_WPM,
            cw_tone_hz: DEFAULT_TONE_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            preamble: true,
            trailer: true,
        }
    }
}

impl TxConfig {
    /// Load configuration from a TOML file, or JSON for `.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        load_config(path)
    }

    /// Save configuration in the format named by the extension
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_config(self, path)
    }

    /// The configured mode
    pub fn mode_definition(&self) -> Result<&'static ModeDefinition> {
        Ok(ModeDefinition::by_code(&self.mode)?)
    }

    /// Output container: explicit format, else the output extension, else WAV
    pub fn audio_format(&self) -> AudioFormat {
        let inferred = self.output.as_deref().and_then(AudioFormat::from_path);
        match (self.format, inferred) {
            (Some(format), Some(ext)) if format != ext => {
                warn!(
                    "Output extension suggests {} but {} was requested; writing {}",
                    ext, format, format
                );
                format
            }
            (Some(format), _) => format,
            (None, Some(ext)) => ext,
            (None, None) => AudioFormat::Wav,
        }
    }

    /// Output file, `<input stem>.<ext>` when none is configured
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.input, self.audio_format()),
        }
    }

    /// CW identifier for the configured callsign, uppercased
    pub fn cw_message(&self) -> Result<Option<CwMessage>> {
        match &self.callsign {
            Some(callsign) => {
                let message = CwMessage::new(&callsign.to_uppercase(), self.cw_wpm, self.cw_tone_hz)
                    .with_context(|| format!("Invalid CW identifier for '{}'", callsign))?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Check every setting before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            anyhow::bail!("No input image given");
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            anyhow::bail!(
                "Sample rate must be {}-{} Hz, got {}",
                MIN_SAMPLE_RATE,
                MAX_SAMPLE_RATE,
                self.sample_rate
            );
        }
        if self.amplitude == 0 || self.amplitude > MAX_AMPLITUDE {
            anyhow::bail!("Amplitude must be 1-{}, got {}", MAX_AMPLITUDE, self.amplitude);
        }
        self.mode_definition()?;
        self.cw_message()?;
        validate_output_name(&self.output_path())
    }
}

/// Reject empty names and names carrying shell metacharacters or control codes
fn validate_output_name(path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid output file name: {:?}", path))?;

    if name.trim().is_empty() {
        anyhow::bail!("Output file name is empty");
    }
    if let Some(ch) = name
        .chars()
        .find(|ch| ch.is_control() || FORBIDDEN_NAME_CHARS.contains(ch))
    {
        anyhow::bail!("Output file name {:?} contains forbidden character {:?}", name, ch);
    }
    Ok(())
}
