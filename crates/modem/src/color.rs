//! Channel derivation from RGB pixels

use serde::Serialize;

/// How a mode represents colour on the air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorModel {
    /// Full-resolution red, green and blue scans
    RgbSequential,
    /// Luma plus colour-difference scans at reduced resolution
    YuvSubsampled,
}

/// A scanned component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
    /// Y
    Luma,
    /// R-Y, also called V
    RedDifference,
    /// B-Y, also called U
    BlueDifference,
}

impl Channel {
    /// Short label used in logs and mode listings
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
            Channel::Luma => "Y",
            Channel::RedDifference => "R-Y",
            Channel::BlueDifference => "B-Y",
        }
    }

    /// Value of this channel for `rgb`, in `0..=255`
    pub fn derive(&self, rgb: [u8; 3]) -> u8 {
        let [r, g, b] = rgb;
        match self {
            Channel::Red => r,
            Channel::Green => g,
            Channel::Blue => b,
            Channel::Luma => yuv(rgb, 16.0, [65.738, 129.057, 25.064]),
            Channel::RedDifference => yuv(rgb, 128.0, [112.439, -94.154, -18.285]),
            Channel::BlueDifference => yuv(rgb, 128.0, [-37.945, -74.494, 112.439]),
        }
    }
}

/// Scale applied to the weighted sum, close to 1/256
const YUV_SCALE: f64 = 0.003906;

/// BT.601 studio-swing conversion, truncated to 8 bits
#[inline]
fn yuv(rgb: [u8; 3], offset: f64, weights: [f64; 3]) -> u8 {
    let sum: f64 = rgb
        .iter()
        .zip(weights)
        .map(|(&c, w)| w * f64::from(c))
        .sum();
    (offset + YUV_SCALE * sum).clamp(0.0, 255.0) as u8
}

/// Per-component average of two pixels, rounded down
#[inline]
pub fn average(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = ((u16::from(a[i]) + u16::from(b[i])) / 2) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_channels_pass_through() {
        let px = [10, 20, 30];
        assert_eq!(Channel::Red.derive(px), 10);
        assert_eq!(Channel::Green.derive(px), 20);
        assert_eq!(Channel::Blue.derive(px), 30);
    }

    #[test]
    fn test_luma_range() {
        assert_eq!(Channel::Luma.derive([0, 0, 0]), 16);
        assert!((234..=235).contains(&Channel::Luma.derive([255, 255, 255])));
    }

    #[test]
    fn test_grey_has_neutral_chroma() {
        for v in [0u8, 77, 128, 255] {
            let grey = [v, v, v];
            let u = Channel::BlueDifference.derive(grey);
            let w = Channel::RedDifference.derive(grey);
            assert!((127..=128).contains(&u), "B-Y {u} for {v}");
            assert!((127..=128).contains(&w), "R-Y {w} for {v}");
        }
    }

    #[test]
    fn test_saturated_chroma() {
        assert!(Channel::RedDifference.derive([255, 0, 0]) > 230);
        assert!(Channel::BlueDifference.derive([0, 0, 255]) > 230);
        assert!(Channel::RedDifference.derive([0, 255, 255]) < 30);
    }

    #[test]
    fn test_average_rounds_down() {
        assert_eq!(average([255, 0, 3], [254, 1, 4]), [254, 0, 3]);
    }
}
