//! VIS header, attention preamble and trailer

use crate::modes::{ModeDefinition, BLACK_HZ, SYNC_HZ, WHITE_HZ};
use crate::{ModemError, Result};
use sstvtx_core::oscillator::{Segment, ToneEvent};

/// Leader tone
pub const LEADER_HZ: f64 = 1900.0;
pub const LEADER_US: f64 = 300_000.0;
/// Break between the two leader tones
pub const BREAK_US: f64 = 10_000.0;
/// Start bit, data bits and stop bit
pub const BIT_US: f64 = 30_000.0;
/// Standard VIS keying: a 1 bit is 1100 Hz, a 0 bit is 1300 Hz
pub const BIT_ONE_HZ: f64 = 1100.0;
pub const BIT_ZERO_HZ: f64 = 1300.0;

const PREAMBLE_SILENCE_US: f64 = 500_000.0;
const PREAMBLE_TONE_US: f64 = 100_000.0;
const PREAMBLE_TONES: [f64; 8] = [
    LEADER_HZ, BLACK_HZ, LEADER_HZ, BLACK_HZ, WHITE_HZ, BLACK_HZ, WHITE_HZ, BLACK_HZ,
];

/// Seven code bits, least significant first, followed by the even-parity bit
pub fn vis_bits(vis_code: u8) -> Result<[bool; 8]> {
    if vis_code > 0x7f {
        return Err(ModemError::InvalidModeDefinition {
            msg: format!("VIS code {vis_code} exceeds 7 bits"),
        });
    }

    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().take(7).enumerate() {
        *bit = (vis_code >> i) & 1 != 0;
    }
    bits[7] = vis_code.count_ones() % 2 == 1;
    Ok(bits)
}

/// Leader, break, leader, start bit, data and parity bits, stop bit
pub fn encode_vis(mode: &ModeDefinition) -> Result<Vec<ToneEvent>> {
    let bits = vis_bits(mode.vis_code)?;

    let mut tones = Vec::with_capacity(13);
    tones.push(ToneEvent::new(LEADER_HZ, LEADER_US));
    tones.push(ToneEvent::new(SYNC_HZ, BREAK_US));
    tones.push(ToneEvent::new(LEADER_HZ, LEADER_US));
    tones.push(ToneEvent::new(SYNC_HZ, BIT_US));
    tones.extend(bits.iter().map(|&one| {
        let freq = if one { BIT_ONE_HZ } else { BIT_ZERO_HZ };
        ToneEvent::new(freq, BIT_US)
    }));
    tones.push(ToneEvent::new(SYNC_HZ, BIT_US));
    Ok(tones)
}

/// Half a second of silence, then alternating calibration tones that
/// open a receiver's squelch before the VIS header
pub fn attention_preamble() -> Vec<Segment> {
    std::iter::once(Segment::Silence {
        duration_us: PREAMBLE_SILENCE_US,
    })
    .chain(
        PREAMBLE_TONES
            .iter()
            .map(|&freq| Segment::Tone(ToneEvent::new(freq, PREAMBLE_TONE_US))),
    )
    .collect()
}

/// Closing tones after the last line, ending in silence
pub fn vis_trailer() -> Vec<Segment> {
    vec![
        Segment::Tone(ToneEvent::new(WHITE_HZ, 300_000.0)),
        Segment::Tone(ToneEvent::new(SYNC_HZ, 10_000.0)),
        Segment::Tone(ToneEvent::new(WHITE_HZ, 100_000.0)),
        Segment::Tone(ToneEvent::new(SYNC_HZ, 30_000.0)),
        Segment::Silence {
            duration_us: 500_000.0,
        },
    ]
}

/// Total duration of `segments` in microseconds
pub fn total_duration_us<'a, I>(segments: I) -> f64
where
    I: IntoIterator<Item = &'a Segment>,
{
    segments.into_iter().map(Segment::duration_us).sum()
}
