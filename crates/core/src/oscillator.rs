//! Phase-continuous tone synthesis (DDS)
//!
//! Every tone rendered through one [`Oscillator`] continues from the phase
//! the previous tone ended on, so frequency changes never produce a step in
//! the waveform. Durations are fractional microseconds; the part of a sample
//! lost to rounding one tone is carried into the next so long runs of short
//! tones (SSTV pixels) keep their cumulative timing.

use crate::buffer::{SampleBuffer, BIAS};
use crate::envelope::{raised_cosine, EnvelopeSpec};
use crate::{CoreError, Result};
use std::f64::consts::TAU;

/// Largest amplitude that keeps `BIAS ± amplitude` inside `u16`
pub const MAX_AMPLITUDE: u16 = 32767;

/// Default amplitude: 65 % of full scale
pub const DEFAULT_AMPLITUDE: u16 = 21298;

/// A single tone: frequency and duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEvent {
    pub frequency_hz: f64,
    pub duration_us: f64,
}

impl ToneEvent {
    #[inline]
    pub const fn new(frequency_hz: f64, duration_us: f64) -> Self {
        Self {
            frequency_hz,
            duration_us,
        }
    }
}

/// Unit of work for the oscillator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Constant-amplitude tone
    Tone(ToneEvent),
    /// Tone with raised-cosine attack and release
    Shaped(ToneEvent, EnvelopeSpec),
    /// Exact-bias silence
    Silence { duration_us: f64 },
}

impl Segment {
    /// Nominal duration in microseconds
    pub fn duration_us(&self) -> f64 {
        match self {
            Segment::Tone(tone) | Segment::Shaped(tone, _) => tone.duration_us,
            Segment::Silence { duration_us } => *duration_us,
        }
    }

    /// True for segments that produce a carrier
    pub fn is_tone(&self) -> bool {
        !matches!(self, Segment::Silence { .. })
    }
}

impl From<ToneEvent> for Segment {
    fn from(tone: ToneEvent) -> Self {
        Segment::Tone(tone)
    }
}

/// Running state of one encoding session's oscillator
#[derive(Debug, Clone, Copy)]
pub struct OscillatorState {
    /// Phase in radians, kept in `[0, 2π)`
    pub phase: f64,
    /// Fractional sample left over from the previous segment
    pub carry: f64,
    pub sample_rate_hz: u32,
}

impl OscillatorState {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            phase: 0.0,
            carry: 0.0,
            sample_rate_hz,
        }
    }
}

/// DDS tone generator writing biased 16-bit samples
#[derive(Debug, Clone)]
pub struct Oscillator {
    state: OscillatorState,
    amplitude: f64,
}

impl Oscillator {
    /// Create an oscillator for `sample_rate` with peak deviation `amplitude`
    pub fn new(sample_rate: u32, amplitude: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate { rate: sample_rate });
        }
        if amplitude == 0 || amplitude > MAX_AMPLITUDE {
            return Err(CoreError::InvalidAmplitude {
                amplitude: u32::from(amplitude),
            });
        }

        Ok(Self {
            state: OscillatorState::new(sample_rate),
            amplitude: f64::from(amplitude),
        })
    }

    pub fn state(&self) -> &OscillatorState {
        &self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.state.sample_rate_hz
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Number of samples the next segment of `duration_us` would produce,
    /// and the carry it would leave. Does not modify state.
    pub fn planned_samples(&self, duration_us: f64) -> Result<(u64, f64)> {
        if !duration_us.is_finite() || duration_us < 0.0 {
            return Err(CoreError::InvalidToneParameters {
                msg: format!("duration must be a finite, non-negative number of microseconds, got {duration_us}"),
            });
        }

        let exact = duration_us * f64::from(self.state.sample_rate_hz) / 1e6 + self.state.carry;
        let count = exact.round().max(0.0);
        // u32::MAX samples is over 24 hours even at 48 kHz
        if count > f64::from(u32::MAX) {
            return Err(CoreError::InvalidToneParameters {
                msg: format!("duration of {duration_us} us produces too many samples"),
            });
        }

        Ok((count as u64, exact - count))
    }

    fn check_frequency(&self, frequency_hz: f64) -> Result<()> {
        let nyquist = f64::from(self.state.sample_rate_hz) / 2.0;
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 || frequency_hz >= nyquist {
            return Err(CoreError::InvalidToneParameters {
                msg: format!("frequency must be in (0, {nyquist}) Hz, got {frequency_hz}"),
            });
        }
        Ok(())
    }

    /// Append a tone to `buffer`, optionally shaped by `envelope`.
    ///
    /// Parameters and capacity are checked before any sample is written.
    /// Returns the number of samples appended.
    pub fn emit(
        &mut self,
        buffer: &mut SampleBuffer,
        frequency_hz: f64,
        duration_us: f64,
        envelope: Option<&EnvelopeSpec>,
    ) -> Result<u64> {
        self.check_frequency(frequency_hz)?;
        let (count, carry) = self.planned_samples(duration_us)?;
        buffer.ensure_room(count)?;

        let total = count as usize;
        let rate = self.state.sample_rate_hz;
        let ramp = envelope.map(|env| env.ramp_samples(total, rate));
        let step = TAU * frequency_hz / f64::from(rate);
        let amplitude = self.amplitude;
        let state = &mut self.state;

        buffer.extend_reserved((0..total).map(|i| {
            let gain = match ramp {
                Some(ramp) => raised_cosine(i, total, ramp),
                None => 1.0,
            };
            let sample = (f64::from(BIAS) + amplitude * gain * state.phase.sin()).round();
            state.phase = (state.phase + step).rem_euclid(TAU);
            sample as u16
        }));
        self.state.carry = carry;

        Ok(count)
    }

    /// Append exact-bias silence. Phase is left untouched.
    pub fn emit_silence(&mut self, buffer: &mut SampleBuffer, duration_us: f64) -> Result<u64> {
        let (count, carry) = self.planned_samples(duration_us)?;
        buffer.extend_silence(count)?;
        self.state.carry = carry;
        Ok(count)
    }

    /// Render one segment
    pub fn render(&mut self, buffer: &mut SampleBuffer, segment: &Segment) -> Result<u64> {
        match segment {
            Segment::Tone(tone) => self.emit(buffer, tone.frequency_hz, tone.duration_us, None),
            Segment::Shaped(tone, envelope) => {
                self.emit(buffer, tone.frequency_hz, tone.duration_us, Some(envelope))
            }
            Segment::Silence { duration_us } => self.emit_silence(buffer, *duration_us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn buffer(rate: u32) -> SampleBuffer {
        SampleBuffer::new(rate, 10 * u64::from(rate)).unwrap()
    }

    #[test]
    fn test_sample_count_rounds() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        // 30 ms at 8 kHz
        assert_eq!(osc.emit(&mut buf, 1100.0, 30_000.0, None).unwrap(), 240);
        assert_eq!(buf.len(), 240);
    }

    #[test]
    fn test_fractional_durations_accumulate() {
        let mut osc = Oscillator::new(11025, 13000).unwrap();
        let mut buf = buffer(11025);
        // 320 Martin 1 pixels, each 5.045 samples long
        for _ in 0..320 {
            osc.emit(&mut buf, 1900.0, 457.6, None).unwrap();
        }
        let exact = 320.0 * 457.6 * 11025.0 / 1e6;
        assert!((buf.len() as f64 - exact).abs() <= 1.0);
    }

    #[test]
    fn test_first_sample_starts_at_bias() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        osc.emit(&mut buf, 1000.0, 1000.0, None).unwrap();
        assert_eq!(buf[0], BIAS);
        // quarter period of 1 kHz at 8 kHz is two samples
        assert_eq!(buf[2], BIAS + 13000);
    }

    #[test]
    fn test_rejects_invalid_frequency() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        for freq in [0.0, -5.0, f64::NAN, 4000.0] {
            let err = osc.emit(&mut buf, freq, 1000.0, None).unwrap_err();
            assert!(matches!(err, CoreError::InvalidToneParameters { .. }));
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rejects_invalid_duration() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        assert!(osc.emit(&mut buf, 1000.0, -1.0, None).is_err());
        assert!(osc.emit(&mut buf, 1000.0, f64::INFINITY, None).is_err());
        assert!(osc.emit(&mut buf, 1000.0, 1e18, None).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = SampleBuffer::new(8000, 100).unwrap();
        let err = osc.emit(&mut buf, 1000.0, 1_000_000.0, None).unwrap_err();
        assert!(matches!(err, CoreError::SampleBufferOverflow { requested: 8000, capacity: 100 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rejects_invalid_amplitude() {
        assert!(Oscillator::new(8000, 0).is_err());
        assert!(Oscillator::new(8000, 40000).is_err());
        assert!(Oscillator::new(0, 1000).is_err());
    }

    #[test]
    fn test_silence_keeps_phase() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        osc.emit(&mut buf, 1234.0, 3_300.0, None).unwrap();
        let phase = osc.state().phase;
        osc.emit_silence(&mut buf, 10_000.0).unwrap();
        assert_eq!(osc.state().phase, phase);
        assert!(buf.data()[buf.len() - 80..].iter().all(|&s| s == BIAS));
    }

    #[test]
    fn test_shaped_tone_ramps_from_bias() {
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buf = buffer(8000);
        let env = EnvelopeSpec::default();
        osc.render(&mut buf, &Segment::Shaped(ToneEvent::new(700.0, 100_000.0), env))
            .unwrap();
        assert_eq!(buf[0], BIAS);
        assert_eq!(buf[buf.len() - 1], BIAS);
        let peak = buf.data().iter().map(|&s| (i32::from(s) - 32768).abs()).max().unwrap();
        assert!(peak > 12900);
    }

    #[test]
    fn test_phase_continuity_across_frequency_change() {
        let rate = 11025;
        let amplitude = 13000.0;
        let mut osc = Oscillator::new(rate, 13000).unwrap();
        let mut buf = buffer(rate);
        osc.emit(&mut buf, 1200.0, 4862.0, None).unwrap();
        osc.emit(&mut buf, 2300.0, 4862.0, None).unwrap();
        osc.emit(&mut buf, 1500.0, 572.0, None).unwrap();

        let max_step = amplitude * TAU * 2300.0 / f64::from(rate) + 1.0;
        for pair in buf.data().windows(2) {
            let jump = (f64::from(pair[1]) - f64::from(pair[0])).abs();
            assert!(jump <= max_step, "jump {jump} exceeds {max_step}");
        }
    }

    #[quickcheck]
    fn prop_no_jump_between_tones(f1: u16, f2: u16, d1: u16, d2: u16) -> bool {
        let rate = 11025;
        let amplitude = 13000.0;
        let first = f64::from(f1 % 3700 + 300);
        let second = f64::from(f2 % 3700 + 300);
        let mut osc = Oscillator::new(rate, 13000).unwrap();
        let mut buf = buffer(rate);
        osc.emit(&mut buf, first, f64::from(d1 % 20_000) + 1.0, None).unwrap();
        osc.emit(&mut buf, second, f64::from(d2 % 20_000) + 1.0, None).unwrap();

        let max_step = amplitude * TAU * first.max(second) / f64::from(rate) + 1.0;
        buf.data()
            .windows(2)
            .all(|pair| (f64::from(pair[1]) - f64::from(pair[0])).abs() <= max_step)
    }

    #[quickcheck]
    fn prop_tones_stay_within_amplitude(freq: u16, dur: u16, amp: u16) -> bool {
        let amplitude = amp % MAX_AMPLITUDE + 1;
        let frequency = f64::from(freq % 3000 + 300);
        let mut osc = Oscillator::new(8000, amplitude).unwrap();
        let mut buf = buffer(8000);
        osc.emit(&mut buf, frequency, f64::from(dur), None).unwrap();
        osc.emit(&mut buf, frequency / 2.0, f64::from(dur), Some(&EnvelopeSpec::default()))
            .unwrap();

        let lo = i32::from(BIAS) - i32::from(amplitude);
        let hi = i32::from(BIAS) + i32::from(amplitude);
        buf.data().iter().all(|&s| (lo..=hi).contains(&i32::from(s)))
    }

    #[quickcheck]
    fn prop_phase_stays_wrapped(freqs: Vec<u16>) -> bool {
        let mut osc = Oscillator::new(22050, 1000).unwrap();
        let mut buf = buffer(22050);
        for f in freqs.into_iter().take(50) {
            osc.emit(&mut buf, f64::from(f % 10000 + 1), 1000.0, None).unwrap();
        }
        (0.0..TAU).contains(&osc.state().phase)
    }
}
