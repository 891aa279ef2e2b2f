//! Row-major 8-bit RGB frame handed to the scan-line encoder

use crate::{ModemError, Result};

/// Bytes per pixel
const CHANNELS: usize = 3;

/// Normalised RGB frame, already scaled to a mode's resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbBuffer {
    /// Wrap `data` (`width * height * 3` bytes, row-major RGB)
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * CHANNELS;
        if data.len() != expected {
            return Err(ModemError::ImageBufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { width, height, data })
    }

    /// Frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            data: rgb.repeat(pixels),
        }
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Raw row-major bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_buffer() {
        let err = RgbBuffer::new(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, ModemError::ImageBufferSize { expected: 12, actual: 11 }));
    }

    #[test]
    fn test_pixel_addressing() {
        let img = RgbBuffer::from_fn(4, 3, |x, y| [x as u8, y as u8, 7]);
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.pixel(3, 2), [3, 2, 7]);
        assert_eq!(img.pixel(0, 1), [0, 1, 7]);
        assert_eq!(img.as_bytes().len(), 36);
    }

    #[test]
    fn test_filled() {
        let img = RgbBuffer::filled(3, 2, [1, 2, 3]);
        assert_eq!(img.pixel(2, 1), [1, 2, 3]);
        assert_eq!(RgbBuffer::new(3, 2, img.as_bytes().to_vec()).unwrap(), img);
    }
}
