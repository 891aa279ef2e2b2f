//! Sample buffer management
//!
//! Samples are unsigned 16-bit PCM centred on [`BIAS`]. Silence is exactly
//! `BIAS`; a tone of amplitude `scale` stays within `BIAS ± scale`.

use crate::{CoreError, Result};
use std::ops::Index;

/// Mid-point of the unsigned 16-bit range.
pub const BIAS: u16 = 32768;

/// Lowest sample rate accepted by the encoder.
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest sample rate accepted by the encoder.
pub const MAX_SAMPLE_RATE: u32 = 48_000;

/// Longest transmission a session will hold, in seconds.
pub const DEFAULT_MAX_DURATION_SECS: u32 = 600;

/// Append-only buffer of biased 16-bit samples with a fixed capacity bound
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Vec<u16>,
    capacity: u64,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create an empty buffer that may hold at most `capacity` samples
    pub fn new(sample_rate: u32, capacity: u64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate { rate: sample_rate });
        }

        Ok(Self {
            data: Vec::new(),
            capacity,
            sample_rate,
        })
    }

    /// Create a buffer sized for `max_duration_secs` of audio.
    ///
    /// The bound is computed in 64-bit arithmetic so that high sample rates
    /// combined with long modes never wrap.
    pub fn with_max_duration(sample_rate: u32, max_duration_secs: u32) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(CoreError::InvalidSampleRate { rate: sample_rate });
        }

        let capacity = u64::from(sample_rate) * u64::from(max_duration_secs);
        Self::new(sample_rate, capacity)
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum number of samples this buffer accepts
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Samples that can still be appended
    pub fn remaining(&self) -> u64 {
        self.capacity.saturating_sub(self.data.len() as u64)
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Length of the buffered audio in seconds
    pub fn duration_secs(&self) -> f64 {
        self.data.len() as f64 / f64::from(self.sample_rate)
    }

    /// Fail with [`CoreError::SampleBufferOverflow`] unless `additional`
    /// more samples fit. Reserves memory for them on success.
    pub fn ensure_room(&mut self, additional: u64) -> Result<()> {
        let requested = (self.data.len() as u64)
            .checked_add(additional)
            .ok_or(CoreError::SampleBufferOverflow {
                requested: u64::MAX,
                capacity: self.capacity,
            })?;

        if requested > self.capacity {
            return Err(CoreError::SampleBufferOverflow {
                requested,
                capacity: self.capacity,
            });
        }

        let additional = usize::try_from(additional).map_err(|_| CoreError::SampleBufferOverflow {
            requested,
            capacity: self.capacity,
        })?;
        self.data.reserve(additional);
        Ok(())
    }

    /// Append a single sample
    pub fn push(&mut self, sample: u16) -> Result<()> {
        self.ensure_room(1)?;
        self.data.push(sample);
        Ok(())
    }

    /// Append `count` samples of exact silence
    pub fn extend_silence(&mut self, count: u64) -> Result<()> {
        self.ensure_room(count)?;
        // ensure_room has proven `count` fits in usize
        self.data.resize(self.data.len() + count as usize, BIAS);
        Ok(())
    }

    /// Append samples the caller has already accounted for with
    /// [`ensure_room`](Self::ensure_room).
    pub(crate) fn extend_reserved<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = u16>,
    {
        self.data.extend(samples);
        debug_assert!(self.data.len() as u64 <= self.capacity);
    }

    /// Two's-complement view of the buffer (`s - BIAS`), as stored in PCM files
    pub fn to_signed(&self) -> Vec<i16> {
        self.data.iter().map(|&s| to_signed(s)).collect()
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Index<usize> for SampleBuffer {
    type Output = u16;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

/// Convert a biased sample to signed PCM
#[inline]
pub fn to_signed(sample: u16) -> i16 {
    (i32::from(sample) - i32::from(BIAS)) as i16
}

/// Convert a signed PCM sample back to the biased representation
#[inline]
pub fn from_signed(sample: i16) -> u16 {
    (i32::from(sample) + i32::from(BIAS)) as u16
}
