//! Scan-line encoder
//!
//! Walks a mode's lead-in and per-line [`ScanStep`]s and yields the tone for
//! every sync pulse, porch, separator and pixel. Tones are produced one line
//! at a time so the whole image is never materialised as tone events.

use crate::color::average;
use crate::image::RgbBuffer;
use crate::modes::{pixel_frequency, ChannelDraw, ModeDefinition, ScanStep};
use crate::Result;
use sstvtx_core::oscillator::ToneEvent;
use tracing::trace;

/// Rows between progress messages
const PROGRESS_INTERVAL: u32 = 64;

/// Start encoding `pixels` in `mode`.
///
/// The frame size is checked here, before any tone is produced.
pub fn encode_image<'a>(mode: &'a ModeDefinition, pixels: &'a RgbBuffer) -> Result<ScanLines<'a>> {
    mode.check_dimensions(pixels.width(), pixels.height())?;
    Ok(ScanLines::new(mode, pixels))
}

/// Iterator over every tone of an image transmission
#[derive(Debug)]
pub struct ScanLines<'a> {
    mode: &'a ModeDefinition,
    pixels: &'a RgbBuffer,
    /// Next row to render
    row: u32,
    line: Vec<ToneEvent>,
    pos: usize,
}

impl<'a> ScanLines<'a> {
    fn new(mode: &'a ModeDefinition, pixels: &'a RgbBuffer) -> Self {
        let mut line = Vec::new();
        for step in mode.lead_in {
            push_step(mode, pixels, 0, step, &mut line);
        }

        Self {
            mode,
            pixels,
            row: 0,
            line,
            pos: 0,
        }
    }

    /// Rows fully handed out so far
    pub fn rows_done(&self) -> u32 {
        if self.pos < self.line.len() {
            self.row.saturating_sub(1)
        } else {
            self.row
        }
    }

    fn fill_line(&mut self) -> bool {
        if self.row >= self.mode.height {
            return false;
        }

        if self.row > 0 && self.row % PROGRESS_INTERVAL == 0 {
            trace!(
                "{}: encoding row {}/{}",
                self.mode.code,
                self.row,
                self.mode.height
            );
        }

        self.line.clear();
        self.pos = 0;
        for step in self.mode.scan_plan.iter().filter(|s| s.applies(self.row)) {
            push_step(self.mode, self.pixels, self.row, step, &mut self.line);
        }
        self.row += 1;
        true
    }
}

impl Iterator for ScanLines<'_> {
    type Item = ToneEvent;

    fn next(&mut self) -> Option<ToneEvent> {
        while self.pos >= self.line.len() {
            if !self.fill_line() {
                return None;
            }
        }

        let tone = self.line[self.pos];
        self.pos += 1;
        Some(tone)
    }
}

fn push_step(
    mode: &ModeDefinition,
    pixels: &RgbBuffer,
    row: u32,
    step: &ScanStep,
    out: &mut Vec<ToneEvent>,
) {
    match step {
        ScanStep::Sync => out.push(ToneEvent::new(mode.sync_freq_hz, mode.sync_duration_us)),
        ScanStep::Porch => {
            if mode.porch_duration_us > 0.0 {
                out.push(ToneEvent::new(mode.porch_freq_hz, mode.porch_duration_us));
            }
        }
        ScanStep::Tone {
            frequency_hz,
            duration_us,
            ..
        } => out.push(ToneEvent::new(*frequency_hz, *duration_us)),
        ScanStep::Draw(draw) => push_draw(pixels, row, draw, out),
    }
}

fn push_draw(pixels: &RgbBuffer, row: u32, draw: &ChannelDraw, out: &mut Vec<ToneEvent>) {
    // rows of the pair containing `row`, clamped for a trailing single row
    let first = row & !1;
    let second = (first + 1).min(pixels.height() - 1);

    out.extend((0..pixels.width()).map(|x| {
        let rgb = if draw.pair_average {
            average(pixels.pixel(x, first), pixels.pixel(x, second))
        } else {
            pixels.pixel(x, row)
        };
        let value = draw.channel.derive(rgb);
        ToneEvent::new(pixel_frequency(value), draw.pixel_duration_us)
    }));
}
