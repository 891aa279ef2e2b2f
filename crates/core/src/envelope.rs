//! Raised-cosine amplitude envelope for keyed tones

use crate::{CoreError, Result};
use std::f64::consts::PI;

/// Attack/release shaping applied to a single tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSpec {
    attack_ms: f64,
}

impl EnvelopeSpec {
    /// Ramp length used for CW elements
    pub const DEFAULT_ATTACK_MS: f64 = 5.0;

    /// Create an envelope with the given attack (and equal release) time
    pub fn new(attack_ms: f64) -> Result<Self> {
        if !attack_ms.is_finite() || attack_ms <= 0.0 {
            return Err(CoreError::InvalidEnvelope {
                msg: format!("attack time must be a positive number of milliseconds, got {attack_ms}"),
            });
        }
        Ok(Self { attack_ms })
    }

    /// Attack/release time in milliseconds
    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    /// Ramp length in samples for a tone of `total` samples.
    ///
    /// A tone shorter than two full ramps gets ramps of half its length, so
    /// both edges still rise and fall monotonically.
    pub fn ramp_samples(&self, total: usize, sample_rate: u32) -> usize {
        let full = (self.attack_ms * 1e-3 * f64::from(sample_rate)).round() as usize;
        full.min(total / 2)
    }

    /// Amplitude multiplier in `[0, 1]` for sample `index` of a `total`-sample tone
    pub fn factor(&self, index: usize, total: usize, sample_rate: u32) -> f64 {
        let ramp = self.ramp_samples(total, sample_rate);
        raised_cosine(index, total, ramp)
    }
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self {
            attack_ms: Self::DEFAULT_ATTACK_MS,
        }
    }
}

/// Hann-shaped edge: 0 at the first and last sample, 1 across the body
#[inline]
pub(crate) fn raised_cosine(index: usize, total: usize, ramp: usize) -> f64 {
    if ramp == 0 || index >= total {
        return if index < total { 1.0 } else { 0.0 };
    }

    // distance to the nearest edge
    let edge = index.min(total - 1 - index);
    if edge >= ramp {
        1.0
    } else {
        0.5 * (1.0 - (PI * edge as f64 / ramp as f64).cos())
    }
}
