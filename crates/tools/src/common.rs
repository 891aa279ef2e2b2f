//! Common utilities for the transmit tool

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sstvtx_core::format::AudioFormat;
use std::path::{Path, PathBuf};

/// Initialize the fmt subscriber.
///
/// `debug` wins over `verbose`; without either only warnings are shown.
pub fn init_logging(debug: bool, verbose: bool, timestamps: bool) {
    let log_level = if debug {
        tracing::Level::DEBUG
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false);

    if timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load configuration from file, JSON for `.json` and TOML otherwise
pub fn load_config<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {:?}", path))
    } else {
        toml::from_str(&content).with_context(|| format!("Failed to parse TOML config: {:?}", path))
    }
}

/// Save configuration to file in the format its extension names
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(config).context("Failed to serialize config")?
    } else {
        toml::to_string_pretty(config).context("Failed to serialize config")?
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}

/// Parse a `--format` value
pub fn parse_format(name: &str) -> Result<AudioFormat> {
    if name.eq_ignore_ascii_case("ogg") || name.eq_ignore_ascii_case("vorbis") {
        anyhow::bail!("Ogg Vorbis output is not supported; write WAV and encode it with an external tool");
    }
    AudioFormat::from_name(name)
        .with_context(|| format!("Unknown audio format '{}' (expected wav or aiff)", name))
}

/// `<input stem>.<format extension>` next to the input image
pub fn default_output_path(input: &Path, format: AudioFormat) -> PathBuf {
    input.with_extension(format.extension())
}
