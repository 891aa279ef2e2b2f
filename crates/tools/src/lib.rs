//! sstvtx Tools - image-to-audio transmit pipeline
//!
//! Loads an image, fits it to a mode's frame, renders the full transmission
//! and writes it as a WAV or AIFF file.

pub mod common;
pub mod config;
pub mod imaging;
pub mod tx;

pub use common::{init_logging, parse_format};
pub use config::TxConfig;
pub use imaging::{load_image, AspectMode};
pub use tx::{write_audio_file, Transmitter};
