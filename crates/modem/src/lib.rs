//! sstvtx Modem - SSTV mode table and tone sequencing
//!
//! This crate turns a mode definition and an RGB frame into the tone
//! sequence of an SSTV transmission: attention preamble, VIS header,
//! scan lines and trailer, rendered into a sample buffer by an
//! [`EncodingSession`](session::EncodingSession).

pub mod color;
pub mod error;
pub mod image;
pub mod modes;
pub mod scan;
pub mod session;
pub mod vis;

pub use error::{ModemError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        color::{Channel, ColorModel},
        error::{ModemError, Result},
        image::RgbBuffer,
        modes::{pixel_frequency, ChannelDraw, ModeDefinition, RowFilter, ScanStep},
        scan::{encode_image, ScanLines},
        session::EncodingSession,
        vis::{attention_preamble, encode_vis, vis_bits, vis_trailer},
    };
}
