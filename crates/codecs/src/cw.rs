//! CW (Morse code) station identifier
//!
//! Turns `"SSTV DE " + callsign` into shaped tone and exact-bias silence
//! segments that the encoding session appends after the image.

use crate::{CodecError, Result};
use sstvtx_core::envelope::EnvelopeSpec;
use sstvtx_core::oscillator::{Segment, ToneEvent};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

pub const MIN_WPM: u32 = 1;
pub const MAX_WPM: u32 = 50;
pub const DEFAULT_WPM: u32 = 15;

pub const MIN_TONE_HZ: f64 = 400.0;
pub const MAX_TONE_HZ: f64 = 2000.0;
pub const DEFAULT_TONE_HZ: f64 = 800.0;

pub const MAX_CALLSIGN_LEN: usize = 31;

/// Text sent ahead of the callsign
pub const MESSAGE_PREFIX: &str = "SSTV DE ";

/// Morse code element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorseElement {
    Dot,
    Dash,
    ElementSpace,
    CharacterSpace,
    WordSpace,
}

impl MorseElement {
    /// Length in dot units
    pub fn units(&self) -> u32 {
        match self {
            MorseElement::Dot | MorseElement::ElementSpace => 1,
            MorseElement::Dash | MorseElement::CharacterSpace => 3,
            MorseElement::WordSpace => 7,
        }
    }

    pub fn is_tone(&self) -> bool {
        matches!(self, MorseElement::Dot | MorseElement::Dash)
    }
}

/// Shared Morse code lookup table for `A-Z`, `0-9` and `/`
pub fn morse_table() -> &'static HashMap<char, &'static [MorseElement]> {
    use MorseElement::{Dash, Dot};

    static TABLE: OnceLock<HashMap<char, &'static [MorseElement]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries: [(char, &'static [MorseElement]); 37] = [
            // Letters
            ('A', &[Dot, Dash]),
            ('B', &[Dash, Dot, Dot, Dot]),
            ('C', &[Dash, Dot, Dash, Dot]),
            ('D', &[Dash, Dot, Dot]),
            ('E', &[Dot]),
            ('F', &[Dot, Dot, Dash, Dot]),
            ('G', &[Dash, Dash, Dot]),
            ('H', &[Dot, Dot, Dot, Dot]),
            ('I', &[Dot, Dot]),
            ('J', &[Dot, Dash, Dash, Dash]),
            ('K', &[Dash, Dot, Dash]),
            ('L', &[Dot, Dash, Dot, Dot]),
            ('M', &[Dash, Dash]),
            ('N', &[Dash, Dot]),
            ('O', &[Dash, Dash, Dash]),
            ('P', &[Dot, Dash, Dash, Dot]),
            ('Q', &[Dash, Dash, Dot, Dash]),
            ('R', &[Dot, Dash, Dot]),
            ('S', &[Dot, Dot, Dot]),
            ('T', &[Dash]),
            ('U', &[Dot, Dot, Dash]),
            ('V', &[Dot, Dot, Dot, Dash]),
            ('W', &[Dot, Dash, Dash]),
            ('X', &[Dash, Dot, Dot, Dash]),
            ('Y', &[Dash, Dot, Dash, Dash]),
            ('Z', &[Dash, Dash, Dot, Dot]),
            // Numbers
            ('0', &[Dash, Dash, Dash, Dash, Dash]),
            ('1', &[Dot, Dash, Dash, Dash, Dash]),
            ('2', &[Dot, Dot, Dash, Dash, Dash]),
            ('3', &[Dot, Dot, Dot, Dash, Dash]),
            ('4', &[Dot, Dot, Dot, Dot, Dash]),
            ('5', &[Dot, Dot, Dot, Dot, Dot]),
            ('6', &[Dash, Dot, Dot, Dot, Dot]),
            ('7', &[Dash, Dash, Dot, Dot, Dot]),
            ('8', &[Dash, Dash, Dash, Dot, Dot]),
            ('9', &[Dash, Dash, Dash, Dash, Dot]),
            // Portable designator
            ('/', &[Dash, Dot, Dot, Dash, Dot]),
        ];
        entries.into_iter().collect()
    })
}

/// Convert text to morse elements.
///
/// Letters are separated by a character space; a space character becomes a
/// word space in place of the character space. Anything outside the table
/// fails with [`CodecError::UnsupportedCwCharacter`].
pub fn text_to_morse(text: &str) -> Result<Vec<MorseElement>> {
    let table = morse_table();
    let mut elements = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ' ' {
            elements.push(MorseElement::WordSpace);
            continue;
        }

        let morse = table
            .get(&ch)
            .ok_or(CodecError::UnsupportedCwCharacter { ch })?;
        for (i, element) in morse.iter().enumerate() {
            elements.push(*element);
            if i < morse.len() - 1 {
                elements.push(MorseElement::ElementSpace);
            }
        }

        if chars.peek().is_some() && chars.peek() != Some(&' ') {
            elements.push(MorseElement::CharacterSpace);
        }
    }

    Ok(elements)
}

/// Validated CW identifier
#[derive(Debug, Clone, PartialEq)]
pub struct CwMessage {
    callsign: String,
    text: String,
    wpm: u32,
    tone_hz: f64,
    envelope: EnvelopeSpec,
}

impl CwMessage {
    /// Build the identifier for `callsign` at `wpm` with a `tone_hz` carrier.
    ///
    /// All parameters are checked here, before any sample is generated.
    pub fn new(callsign: &str, wpm: u32, tone_hz: f64) -> Result<Self> {
        validate_callsign(callsign)?;

        if !(MIN_WPM..=MAX_WPM).contains(&wpm) {
            return Err(CodecError::InvalidCwParameters {
                msg: format!("speed must be {MIN_WPM}-{MAX_WPM} WPM, got {wpm}"),
            });
        }
        if !(MIN_TONE_HZ..=MAX_TONE_HZ).contains(&tone_hz) {
            return Err(CodecError::InvalidCwParameters {
                msg: format!("tone must be {MIN_TONE_HZ}-{MAX_TONE_HZ} Hz, got {tone_hz}"),
            });
        }

        Ok(Self {
            callsign: callsign.to_string(),
            text: format!("{MESSAGE_PREFIX}{callsign}"),
            wpm,
            tone_hz,
            envelope: EnvelopeSpec::default(),
        })
    }

    /// Replace the default 5 ms keying envelope
    pub fn with_envelope(mut self, envelope: EnvelopeSpec) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Full text that is keyed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn tone_hz(&self) -> f64 {
        self.tone_hz
    }

    pub fn envelope(&self) -> &EnvelopeSpec {
        &self.envelope
    }

    /// Dot length in microseconds: 1200 ms / WPM
    pub fn dot_us(&self) -> f64 {
        1_200_000.0 / f64::from(self.wpm)
    }

    /// Duration of `element` in microseconds
    pub fn element_us(&self, element: MorseElement) -> f64 {
        f64::from(element.units()) * self.dot_us()
    }

    /// Duration of the whole identifier in microseconds
    pub fn duration_us(&self) -> Result<f64> {
        let units: u32 = text_to_morse(&self.text)?.iter().map(MorseElement::units).sum();
        Ok(f64::from(units) * self.dot_us())
    }
}

/// Callsigns are 1-31 characters of `A-Z`, `0-9` and `/`
pub fn validate_callsign(callsign: &str) -> Result<()> {
    if callsign.is_empty() {
        return Err(CodecError::InvalidCwParameters {
            msg: "callsign is empty".to_string(),
        });
    }
    if callsign.chars().count() > MAX_CALLSIGN_LEN {
        return Err(CodecError::InvalidCwParameters {
            msg: format!(
                "callsign is {} characters, at most {MAX_CALLSIGN_LEN} allowed",
                callsign.chars().count()
            ),
        });
    }
    if let Some(bad) = callsign
        .chars()
        .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '/'))
    {
        return Err(CodecError::InvalidCwParameters {
            msg: format!("callsign contains '{bad}', only A-Z, 0-9 and '/' are allowed"),
        });
    }
    Ok(())
}

/// Segments for `message`: shaped tones for dots and dashes, exact-bias
/// silence for every gap
pub fn encode_cw(message: &CwMessage) -> Result<Vec<Segment>> {
    let elements = text_to_morse(message.text())?;

    let segments: Vec<Segment> = elements
        .iter()
        .map(|&element| {
            let duration_us = message.element_us(element);
            if element.is_tone() {
                Segment::Shaped(ToneEvent::new(message.tone_hz(), duration_us), *message.envelope())
            } else {
                Segment::Silence { duration_us }
            }
        })
        .collect();

    debug!(
        "CW '{}' at {} WPM, {} Hz: {} elements",
        message.text(),
        message.wpm(),
        message.tone_hz(),
        segments.len()
    );
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use sstvtx_core::buffer::{SampleBuffer, BIAS};
    use sstvtx_core::oscillator::Oscillator;

    #[test]
    fn test_cw_timing() {
        let msg = CwMessage::new("W1AW", 20, 600.0).unwrap();
        // 20 WPM = 60ms dots
        assert!((msg.dot_us() - 60_000.0).abs() < 1e-9);
        assert_eq!(msg.element_us(MorseElement::WordSpace), 420_000.0);
        assert_eq!(msg.text(), "SSTV DE W1AW");
    }

    #[test]
    fn test_morse_conversion() {
        use MorseElement::*;
        assert_eq!(
            text_to_morse("SOS").unwrap(),
            vec![
                Dot, ElementSpace, Dot, ElementSpace, Dot, CharacterSpace,
                Dash, ElementSpace, Dash, ElementSpace, Dash, CharacterSpace,
                Dot, ElementSpace, Dot, ElementSpace, Dot,
            ]
        );
        assert_eq!(text_to_morse("E T").unwrap(), vec![Dot, WordSpace, Dash]);
    }

    #[test]
    fn test_unknown_character() {
        assert!(matches!(
            text_to_morse("AB?"),
            Err(CodecError::UnsupportedCwCharacter { ch: '?' })
        ));
        assert!(text_to_morse("k4abc").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        let cases = [
            CwMessage::new("K4ABC", 0, 800.0),
            CwMessage::new("K4ABC", 51, 800.0),
            CwMessage::new("K4ABC", 15, 399.0),
            CwMessage::new("K4ABC", 15, 2001.0),
            CwMessage::new(&"K".repeat(32), 15, 800.0),
            CwMessage::new("", 15, 800.0),
            CwMessage::new("K4-ABC", 15, 800.0),
            CwMessage::new("k4abc", 15, 800.0),
        ];
        for case in cases {
            assert!(matches!(case, Err(CodecError::InvalidCwParameters { .. })));
        }

        assert!(CwMessage::new(&"K".repeat(31), 50, 2000.0).is_ok());
        assert!(CwMessage::new("VK7/K4ABC", 1, 400.0).is_ok());
    }

    #[test]
    fn test_silence_is_bias_and_tones_are_shaped() {
        let msg = CwMessage::new("E", 20, 800.0).unwrap();
        let segments = encode_cw(&msg).unwrap();
        let mut osc = Oscillator::new(8000, 13000).unwrap();
        let mut buffer = SampleBuffer::new(8000, 8000 * 10).unwrap();

        for segment in &segments {
            let start = buffer.len();
            let n = osc.render(&mut buffer, segment).unwrap() as usize;
            let span = &buffer.data()[start..start + n];
            match segment {
                Segment::Silence { .. } => assert!(span.iter().all(|&s| s == BIAS)),
                _ => {
                    assert_eq!(span[0], BIAS);
                    assert_eq!(span[n - 1], BIAS);
                }
            }
        }
    }

    /// Recover text from rendered segment lengths alone
    fn decode(lengths: &[(bool, u64)], dot_samples: f64) -> String {
        let reverse: HashMap<Vec<MorseElement>, char> = morse_table()
            .iter()
            .map(|(&ch, &code)| (code.to_vec(), ch))
            .collect();

        let units = |n: u64| {
            for u in [1u64, 3, 7] {
                if (n as f64 - u as f64 * dot_samples).abs() <= 1.0 {
                    return u;
                }
            }
            panic!("length {n} is not a whole number of dots");
        };

        let mut text = String::new();
        let mut symbol = Vec::new();
        for &(tone, n) in lengths {
            match (tone, units(n)) {
                (true, 1) => symbol.push(MorseElement::Dot),
                (true, 3) => symbol.push(MorseElement::Dash),
                (false, 1) => {}
                (false, gap) => {
                    text.push(reverse[&symbol]);
                    symbol.clear();
                    if gap == 7 {
                        text.push(' ');
                    }
                }
                other => panic!("unexpected element {other:?}"),
            }
        }
        text.push(reverse[&symbol]);
        text
    }

    #[test]
    fn test_identifier_decodes() {
        let rate = 11025;
        let msg = CwMessage::new("K4ABC", 18, 800.0).unwrap();
        let segments = encode_cw(&msg).unwrap();

        let mut osc = Oscillator::new(rate, 21298).unwrap();
        let mut buffer = SampleBuffer::new(rate, u64::from(rate) * 60).unwrap();
        let lengths: Vec<(bool, u64)> = segments
            .iter()
            .map(|s| (s.is_tone(), osc.render(&mut buffer, s).unwrap()))
            .collect();

        let dot_samples = msg.dot_us() * f64::from(rate) / 1e6;
        assert_eq!(decode(&lengths, dot_samples), "SSTV DE K4ABC");

        let expected = msg.duration_us().unwrap() * f64::from(rate) / 1e6;
        assert!((buffer.len() as f64 - expected).abs() <= 1.0);
    }

    #[quickcheck]
    fn prop_valid_callsigns_alternate_tone_and_gap(raw: Vec<u8>, wpm: u8) -> bool {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789/";
        let callsign: String = raw
            .iter()
            .take(MAX_CALLSIGN_LEN)
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect();
        if callsign.is_empty() {
            return true;
        }

        let wpm = u32::from(wpm) % MAX_WPM + 1;
        let msg = CwMessage::new(&callsign, wpm, DEFAULT_TONE_HZ).unwrap();
        let segments = encode_cw(&msg).unwrap();
        segments.first().map_or(false, Segment::is_tone)
            && segments.last().map_or(false, Segment::is_tone)
            && segments.windows(2).all(|w| w[0].is_tone() != w[1].is_tone())
    }
}
