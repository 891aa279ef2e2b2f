//! FORM/AIFF PCM16 mono writer

use super::AudioEncoder;
use crate::buffer::{to_signed, SampleBuffer};
use crate::{CoreError, Result};
use std::io::Write;
use tracing::debug;

/// FORM header, COMM chunk and SSND chunk header
const HEADER_LEN: u64 = 54;

const COMM_CHUNK_LEN: u32 = 18;

/// Exponent bias of the 80-bit extended format
const EXTENDED_BIAS: i32 = 16383;

/// AIFF container encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct AiffEncoder;

impl AudioEncoder for AiffEncoder {
    fn encode(&self, buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()> {
        write_aiff(buffer, writer)
    }

    fn encoded_len(&self, samples: u64) -> u64 {
        HEADER_LEN + 2 * samples
    }
}

/// Encode `value` as a big-endian IEEE-754 80-bit extended float.
///
/// The conversion is exact: every `f64` is representable in the wider
/// format, with the explicit integer bit set for normal numbers.
pub fn extended_from_f64(value: f64) -> [u8; 10] {
    let bits = value.to_bits();
    let sign = ((bits >> 63) as u16) << 15;
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    let (exp, mantissa): (u16, u64) = match exponent {
        0 if fraction == 0 => (0, 0),
        0 => {
            // subnormal: normalise into the explicit integer bit
            let shift = (fraction << 11).leading_zeros();
            let mantissa = (fraction << 11) << shift;
            let exp = 1 - 1023 + EXTENDED_BIAS - shift as i32;
            (exp as u16, mantissa)
        }
        0x7ff => (0x7fff, (1u64 << 63) | (fraction << 11)),
        _ => (
            (exponent - 1023 + EXTENDED_BIAS) as u16,
            (1u64 << 63) | (fraction << 11),
        ),
    };

    let mut out = [0u8; 10];
    out[..2].copy_from_slice(&(sign | exp).to_be_bytes());
    out[2..].copy_from_slice(&mantissa.to_be_bytes());
    out
}

/// Decode a big-endian 80-bit extended float
pub fn extended_to_f64(bytes: &[u8; 10]) -> f64 {
    let head = u16::from_be_bytes([bytes[0], bytes[1]]);
    let mut mantissa = [0u8; 8];
    mantissa.copy_from_slice(&bytes[2..]);
    let mantissa = u64::from_be_bytes(mantissa);

    let sign = u64::from(head >> 15) << 63;
    let exp = i32::from(head & 0x7fff);
    let bits = if exp == 0 && mantissa == 0 {
        0
    } else if exp == 0x7fff {
        let payload = (mantissa << 1) >> 12;
        if payload == 0 && mantissa << 1 != 0 {
            0x7ff8_0000_0000_0000
        } else {
            0x7ff0_0000_0000_0000 | payload
        }
    } else {
        // normalise in case the integer bit is clear
        let lz = mantissa.leading_zeros() as i32;
        let mantissa = mantissa << lz;
        let e = exp - EXTENDED_BIAS - lz;
        if e > 1023 {
            0x7ff0_0000_0000_0000
        } else if e >= -1022 {
            (((e + 1023) as u64) << 52) | ((mantissa << 1) >> 12)
        } else {
            let shift = -e - 1011;
            if shift >= 64 {
                0
            } else {
                mantissa >> shift
            }
        }
    };

    f64::from_bits(sign | bits)
}

/// Write `buffer` as a mono 16-bit PCM AIFF file
pub fn write_aiff(buffer: &SampleBuffer, writer: &mut dyn Write) -> Result<()> {
    let frames = buffer.len() as u64;
    let data_len = 2 * frames;
    let form_len = u32::try_from(HEADER_LEN - 8 + data_len).map_err(|_| {
        CoreError::SampleBufferOverflow {
            requested: frames,
            capacity: (u64::from(u32::MAX) - HEADER_LEN) / 2,
        }
    })?;

    let mut out = Vec::with_capacity((HEADER_LEN + data_len) as usize);
    out.extend_from_slice(b"FORM");
    out.extend_from_slice(&form_len.to_be_bytes());
    out.extend_from_slice(b"AIFF");

    out.extend_from_slice(b"COMM");
    out.extend_from_slice(&COMM_CHUNK_LEN.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(frames as u32).to_be_bytes());
    out.extend_from_slice(&16u16.to_be_bytes());
    out.extend_from_slice(&extended_from_f64(f64::from(buffer.sample_rate())));

    out.extend_from_slice(b"SSND");
    out.extend_from_slice(&((8 + data_len) as u32).to_be_bytes());
    // offset, block size
    out.extend_from_slice(&[0u8; 8]);
    for &sample in buffer.data() {
        out.extend_from_slice(&to_signed(sample).to_be_bytes());
    }

    debug!(
        "AIFF: {} frames at {} Hz, {} bytes",
        frames,
        buffer.sample_rate(),
        out.len()
    );
    writer.write_all(&out)?;
    Ok(())
}
