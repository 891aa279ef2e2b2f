//! SSTV mode definitions
//!
//! Each mode is pure data: a per-line list of [`ScanStep`]s that the
//! scan-line encoder walks for every row. Adding a mode means adding a table
//! entry, never new control flow.
//!
//! Timings follow N7CXI's published mode descriptions. Martin lines are
//! sync, porch, G, B, R with a separator after each scan; Scottie lines put
//! the sync between the blue and red scans and open the frame with one extra
//! sync pulse; Robot lines carry luma plus colour-difference scans behind a
//! separator whose frequency tells the receiver which chroma follows.

use crate::color::{Channel, ColorModel};
use crate::{ModemError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Sync pulse frequency shared by every mode
pub const SYNC_HZ: f64 = 1200.0;
/// Black level
pub const BLACK_HZ: f64 = 1500.0;
/// White level
pub const WHITE_HZ: f64 = 2300.0;

/// Allowed deviation of the computed image time from the documented one
pub const DURATION_TOLERANCE: f64 = 0.03;

/// Map a channel value to its tone. Identical for every mode.
#[inline]
pub fn pixel_frequency(value: u8) -> f64 {
    BLACK_HZ + f64::from(value) / 255.0 * (WHITE_HZ - BLACK_HZ)
}

/// Rows on which a step is transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowFilter {
    Every,
    Even,
    Odd,
}

impl RowFilter {
    #[inline]
    pub fn applies(&self, row: u32) -> bool {
        match self {
            RowFilter::Every => true,
            RowFilter::Even => row % 2 == 0,
            RowFilter::Odd => row % 2 == 1,
        }
    }
}

/// One scan of a derived channel across the full line width
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelDraw {
    pub channel: Channel,
    pub pixel_duration_us: f64,
    pub rows: RowFilter,
    /// Derive the channel from the average of the two rows of the row pair
    pub pair_average: bool,
}

/// A single element of a scan line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScanStep {
    /// The mode's sync pulse
    Sync,
    /// The mode's porch
    Porch,
    /// Separator or auxiliary porch at a fixed frequency
    Tone {
        frequency_hz: f64,
        duration_us: f64,
        rows: RowFilter,
    },
    Draw(ChannelDraw),
}

impl ScanStep {
    const fn separator(frequency_hz: f64, duration_us: f64) -> Self {
        ScanStep::Tone {
            frequency_hz,
            duration_us,
            rows: RowFilter::Every,
        }
    }

    const fn draw(channel: Channel, pixel_duration_us: f64) -> Self {
        ScanStep::Draw(ChannelDraw {
            channel,
            pixel_duration_us,
            rows: RowFilter::Every,
            pair_average: false,
        })
    }

    /// Whether this step is sent on `row`
    pub fn applies(&self, row: u32) -> bool {
        match self {
            ScanStep::Sync | ScanStep::Porch => true,
            ScanStep::Tone { rows, .. } => rows.applies(row),
            ScanStep::Draw(draw) => draw.rows.applies(row),
        }
    }

    /// Duration of this step in `mode`, in microseconds
    pub fn duration_us(&self, mode: &ModeDefinition) -> f64 {
        match self {
            ScanStep::Sync => mode.sync_duration_us,
            ScanStep::Porch => mode.porch_duration_us,
            ScanStep::Tone { duration_us, .. } => *duration_us,
            ScanStep::Draw(draw) => f64::from(mode.width) * draw.pixel_duration_us,
        }
    }
}

/// Immutable description of one SSTV mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeDefinition {
    /// Short code used on the command line
    pub code: &'static str,
    pub display_name: &'static str,
    /// 7-bit mode identifier sent in the VIS header
    pub vis_code: u8,
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    pub sync_freq_hz: f64,
    pub sync_duration_us: f64,
    pub porch_freq_hz: f64,
    pub porch_duration_us: f64,
    /// Steps sent once before the first line
    pub lead_in: &'static [ScanStep],
    /// Steps sent for every line, filtered by row parity
    pub scan_plan: &'static [ScanStep],
    /// Documented transmission time of the image part
    pub nominal_duration_secs: f64,
}

const MARTIN_PORCH_US: f64 = 572.0;
const SCOTTIE_SEPARATOR_US: f64 = 1500.0;
const ROBOT_SEPARATOR_US: f64 = 4500.0;
const ROBOT_CHROMA_PORCH_HZ: f64 = 1900.0;
const ROBOT_CHROMA_PORCH_US: f64 = 1500.0;

const fn martin_plan(pixel_us: f64) -> [ScanStep; 8] {
    [
        ScanStep::Sync,
        ScanStep::Porch,
        ScanStep::draw(Channel::Green, pixel_us),
        ScanStep::separator(BLACK_HZ, MARTIN_PORCH_US),
        ScanStep::draw(Channel::Blue, pixel_us),
        ScanStep::separator(BLACK_HZ, MARTIN_PORCH_US),
        ScanStep::draw(Channel::Red, pixel_us),
        ScanStep::separator(BLACK_HZ, MARTIN_PORCH_US),
    ]
}

const fn scottie_plan(pixel_us: f64) -> [ScanStep; 7] {
    [
        ScanStep::separator(BLACK_HZ, SCOTTIE_SEPARATOR_US),
        ScanStep::draw(Channel::Green, pixel_us),
        ScanStep::separator(BLACK_HZ, SCOTTIE_SEPARATOR_US),
        ScanStep::draw(Channel::Blue, pixel_us),
        ScanStep::Sync,
        ScanStep::Porch,
        ScanStep::draw(Channel::Red, pixel_us),
    ]
}

const MARTIN_1_PLAN: [ScanStep; 8] = martin_plan(457.6);
const MARTIN_2_PLAN: [ScanStep; 8] = martin_plan(228.8);
const SCOTTIE_1_PLAN: [ScanStep; 7] = scottie_plan(432.0);
const SCOTTIE_2_PLAN: [ScanStep; 7] = scottie_plan(275.2);
const SCOTTIE_DX_PLAN: [ScanStep; 7] = scottie_plan(1080.0);
const SCOTTIE_LEAD_IN: [ScanStep; 1] = [ScanStep::Sync];

/// 4:2:0. The separator frequency announces R-Y (even rows) or B-Y (odd rows);
/// each chroma scan covers the row pair.
const ROBOT_36_PLAN: [ScanStep; 8] = [
    ScanStep::Sync,
    ScanStep::Porch,
    ScanStep::draw(Channel::Luma, 275.0),
    ScanStep::Tone {
        frequency_hz: BLACK_HZ,
        duration_us: ROBOT_SEPARATOR_US,
        rows: RowFilter::Even,
    },
    ScanStep::Tone {
        frequency_hz: WHITE_HZ,
        duration_us: ROBOT_SEPARATOR_US,
        rows: RowFilter::Odd,
    },
    ScanStep::separator(ROBOT_CHROMA_PORCH_HZ, ROBOT_CHROMA_PORCH_US),
    ScanStep::Draw(ChannelDraw {
        channel: Channel::RedDifference,
        pixel_duration_us: 137.5,
        rows: RowFilter::Even,
        pair_average: true,
    }),
    ScanStep::Draw(ChannelDraw {
        channel: Channel::BlueDifference,
        pixel_duration_us: 137.5,
        rows: RowFilter::Odd,
        pair_average: true,
    }),
];

/// 4:2:2. Both colour-difference scans on every line.
const ROBOT_72_PLAN: [ScanStep; 9] = [
    ScanStep::Sync,
    ScanStep::Porch,
    ScanStep::draw(Channel::Luma, 431.25),
    ScanStep::separator(BLACK_HZ, ROBOT_SEPARATOR_US),
    ScanStep::separator(ROBOT_CHROMA_PORCH_HZ, ROBOT_CHROMA_PORCH_US),
    ScanStep::draw(Channel::RedDifference, 215.625),
    ScanStep::separator(WHITE_HZ, ROBOT_SEPARATOR_US),
    ScanStep::separator(ROBOT_CHROMA_PORCH_HZ, ROBOT_CHROMA_PORCH_US),
    ScanStep::draw(Channel::BlueDifference, 215.625),
];

impl ModeDefinition {
    /// N7CXI, 2000
    pub const M1: Self = Self {
        code: "m1",
        display_name: "Martin 1",
        vis_code: 44,
        width: 320,
        height: 256,
        color_model: ColorModel::RgbSequential,
        sync_freq_hz: SYNC_HZ,
        sync_duration_us: 4862.0,
        porch_freq_hz: BLACK_HZ,
        porch_duration_us: MARTIN_PORCH_US,
        lead_in: &[],
        scan_plan: &MARTIN_1_PLAN,
        nominal_duration_secs: 114.3,
    };

    /// N7CXI, 2000
    pub const M2: Self = Self {
        code: "m2",
        display_name: "Martin 2",
        vis_code: 40,
        scan_plan: &MARTIN_2_PLAN,
        nominal_duration_secs: 58.1,
        ..Self::M1
    };

    /// N7CXI, 2000
    pub const S1: Self = Self {
        code: "s1",
        display_name: "Scottie 1",
        vis_code: 60,
        width: 320,
        height: 256,
        color_model: ColorModel::RgbSequential,
        sync_freq_hz: SYNC_HZ,
        sync_duration_us: 9000.0,
        porch_freq_hz: BLACK_HZ,
        porch_duration_us: SCOTTIE_SEPARATOR_US,
        lead_in: &SCOTTIE_LEAD_IN,
        scan_plan: &SCOTTIE_1_PLAN,
        nominal_duration_secs: 110.0,
    };

    /// N7CXI, 2000
    pub const S2: Self = Self {
        code: "s2",
        display_name: "Scottie 2",
        vis_code: 56,
        scan_plan: &SCOTTIE_2_PLAN,
        nominal_duration_secs: 71.0,
        ..Self::S1
    };

    /// N7CXI, 2000
    pub const SDX: Self = Self {
        code: "sdx",
        display_name: "Scottie DX",
        vis_code: 76,
        scan_plan: &SCOTTIE_DX_PLAN,
        nominal_duration_secs: 269.0,
        ..Self::S1
    };

    /// N7CXI, 2000
    pub const R36: Self = Self {
        code: "r36",
        display_name: "Robot 36",
        vis_code: 8,
        width: 320,
        height: 240,
        color_model: ColorModel::YuvSubsampled,
        sync_freq_hz: SYNC_HZ,
        sync_duration_us: 9000.0,
        porch_freq_hz: BLACK_HZ,
        porch_duration_us: 3000.0,
        lead_in: &[],
        scan_plan: &ROBOT_36_PLAN,
        nominal_duration_secs: 36.0,
    };

    /// N7CXI, 2000
    pub const R72: Self = Self {
        code: "r72",
        display_name: "Robot 72",
        vis_code: 12,
        scan_plan: &ROBOT_72_PLAN,
        nominal_duration_secs: 72.0,
        ..Self::R36
    };

    /// Every built-in mode, in listing order
    pub fn all() -> &'static [ModeDefinition] {
        static ALL: [ModeDefinition; 7] = [
            ModeDefinition::M1,
            ModeDefinition::M2,
            ModeDefinition::S1,
            ModeDefinition::S2,
            ModeDefinition::SDX,
            ModeDefinition::R36,
            ModeDefinition::R72,
        ];
        &ALL
    }

    /// Look up a built-in mode by its short code, case-insensitively
    pub fn by_code(code: &str) -> Result<&'static ModeDefinition> {
        static MAP: OnceLock<HashMap<&'static str, &'static ModeDefinition>> = OnceLock::new();
        let map = MAP.get_or_init(|| Self::all().iter().map(|mode| (mode.code, mode)).collect());

        map.get(code.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ModemError::UnknownMode {
                name: code.to_string(),
            })
    }

    /// Look up a built-in mode by VIS code
    pub fn by_vis_code(vis_code: u8) -> Option<&'static ModeDefinition> {
        Self::all().iter().find(|mode| mode.vis_code == vis_code)
    }

    /// Time of one line in microseconds. Lines of a row pair may differ.
    pub fn line_duration_us(&self, row: u32) -> f64 {
        self.scan_plan
            .iter()
            .filter(|step| step.applies(row))
            .map(|step| step.duration_us(self))
            .sum()
    }

    /// Time of the lead-in and all lines in microseconds
    pub fn image_duration_us(&self) -> f64 {
        let lead_in: f64 = self.lead_in.iter().map(|step| step.duration_us(self)).sum();
        let lines: f64 = (0..self.height).map(|row| self.line_duration_us(row)).sum();
        lead_in + lines
    }

    /// Fail with [`ModemError::ImageDimensionMismatch`] unless the frame is
    /// exactly `width x height`
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if (width, height) != (self.width, self.height) {
            return Err(ModemError::ImageDimensionMismatch {
                expected: (self.width, self.height),
                actual: (width, height),
            });
        }
        Ok(())
    }

    /// Check the definition for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ModemError::InvalidModeDefinition { msg });

        if self.vis_code > 0x7f {
            return invalid(format!("{}: VIS code {} exceeds 7 bits", self.code, self.vis_code));
        }
        if self.width == 0 || self.height == 0 {
            return invalid(format!("{}: empty frame {}x{}", self.code, self.width, self.height));
        }
        if self.color_model == ColorModel::YuvSubsampled && self.height % 2 != 0 {
            return invalid(format!("{}: row-paired modes need an even height", self.code));
        }

        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.sync_freq_hz) || !positive(self.sync_duration_us) {
            return invalid(format!("{}: sync must have positive frequency and duration", self.code));
        }
        let porch_time_ok = self.porch_duration_us.is_finite() && self.porch_duration_us >= 0.0;
        if !positive(self.porch_freq_hz) || !porch_time_ok {
            return invalid(format!("{}: porch needs a positive frequency and non-negative duration", self.code));
        }

        let mut draws = 0;
        for step in self.lead_in.iter().chain(self.scan_plan) {
            match step {
                ScanStep::Tone { frequency_hz, duration_us, .. } => {
                    if !positive(*frequency_hz) || !positive(*duration_us) {
                        return invalid(format!("{}: separator tones must be positive", self.code));
                    }
                }
                ScanStep::Draw(draw) => {
                    if !positive(draw.pixel_duration_us) {
                        return invalid(format!(
                            "{}: {} pixel time must be positive",
                            self.code,
                            draw.channel.label()
                        ));
                    }
                    draws += 1;
                }
                ScanStep::Sync | ScanStep::Porch => {}
            }
        }
        if draws == 0 {
            return invalid(format!("{}: scan plan has no channel draws", self.code));
        }

        let computed = self.image_duration_us() / 1e6;
        let deviation = (computed - self.nominal_duration_secs).abs() / self.nominal_duration_secs;
        if !deviation.is_finite() || deviation > DURATION_TOLERANCE {
            return invalid(format!(
                "{}: computed duration {:.2} s deviates from documented {:.2} s",
                self.code, computed, self.nominal_duration_secs
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for ModeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_builtin_modes_validate() {
        for mode in ModeDefinition::all() {
            mode.validate().unwrap();
        }
    }

    #[test]
    fn test_durations_match_documented_times() {
        let expected = [
            ("m1", 114.3),
            ("m2", 58.1),
            ("s1", 110.0),
            ("s2", 71.0),
            ("sdx", 269.0),
            ("r36", 36.0),
            ("r72", 72.0),
        ];
        for (code, secs) in expected {
            let mode = ModeDefinition::by_code(code).unwrap();
            let computed = mode.image_duration_us() / 1e6;
            assert!(
                (computed - secs).abs() / secs <= DURATION_TOLERANCE,
                "{code}: {computed} s"
            );
        }
    }

    #[test]
    fn test_line_times() {
        assert_abs_diff_eq!(ModeDefinition::M1.line_duration_us(0), 446_446.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ModeDefinition::S1.line_duration_us(7), 428_220.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ModeDefinition::R36.line_duration_us(0), 150_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ModeDefinition::R36.line_duration_us(1), 150_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ModeDefinition::R72.line_duration_us(3), 300_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(ModeDefinition::by_code("SDX").unwrap().vis_code, 76);
        assert_eq!(ModeDefinition::by_vis_code(8).unwrap().code, "r36");
        assert!(ModeDefinition::by_vis_code(99).is_none());
        assert!(matches!(
            ModeDefinition::by_code("pd90"),
            Err(ModemError::UnknownMode { .. })
        ));
    }

    #[test]
    fn test_vis_codes_are_unique() {
        let mut codes: Vec<u8> = ModeDefinition::all().iter().map(|m| m.vis_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ModeDefinition::all().len());
    }

    #[test]
    fn test_pixel_frequency() {
        assert_eq!(pixel_frequency(0), 1500.0);
        assert_eq!(pixel_frequency(255), 2300.0);
        assert_abs_diff_eq!(pixel_frequency(128), 1500.0 + 128.0 / 255.0 * 800.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pixel_frequency(128), 1901.5686, epsilon = 1e-4);
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        let wide_vis = ModeDefinition {
            vis_code: 128,
            ..ModeDefinition::M1
        };
        assert!(matches!(
            wide_vis.validate(),
            Err(ModemError::InvalidModeDefinition { .. })
        ));

        let wrong_time = ModeDefinition {
            nominal_duration_secs: 100.0,
            ..ModeDefinition::M1
        };
        assert!(wrong_time.validate().is_err());

        let odd_height = ModeDefinition {
            height: 239,
            ..ModeDefinition::R36
        };
        assert!(odd_height.validate().is_err());
    }

    #[test]
    fn test_check_dimensions() {
        assert!(ModeDefinition::R36.check_dimensions(320, 240).is_ok());
        let err = ModeDefinition::M1.check_dimensions(320, 240).unwrap_err();
        assert!(matches!(
            err,
            ModemError::ImageDimensionMismatch {
                expected: (320, 256),
                actual: (320, 240)
            }
        ));
    }
}
