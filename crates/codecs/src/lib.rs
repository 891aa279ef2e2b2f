//! sstvtx Codecs - station identification
//!
//! This crate provides the Morse code table and the CW identifier that is
//! keyed after an SSTV image.

pub mod cw;
pub mod error;

pub use error::{CodecError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        cw::{encode_cw, text_to_morse, validate_callsign, CwMessage, MorseElement},
        error::{CodecError, Result},
    };
}
