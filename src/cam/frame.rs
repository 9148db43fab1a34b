//! In-memory camera frame.

use super::header::FrameHeader;
use serde::Serialize;

/// A single 2-D camera frame.
///
/// Pixels are stored row-major: `height` rows of `width` samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl Frame {
    /// Build a frame, returning `None` if `pixels` doesn't match the shape.
    pub fn new(width: u32, height: u32, pixels: Vec<u16>) -> Option<Self> {
        if pixels.len() as u64 != width as u64 * height as u64 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame from wider samples, narrowing each to u16.
    ///
    /// Values are truncated towards zero and saturate at the u16 range, the
    /// same narrowing applied when frames are stored on disk.
    pub fn from_samples(width: u32, height: u32, samples: &[f64]) -> Option<Self> {
        let pixels = samples.iter().map(|&v| v as u16).collect();
        Self::new(width, height, pixels)
    }

    /// Frame for a decoded payload; `pixels` holds exactly the samples
    /// `header` declares.
    pub(super) fn from_header(header: FrameHeader, pixels: Vec<u16>) -> Self {
        debug_assert_eq!(pixels.len() as u64, header.pixel_count());
        Self {
            width: header.width,
            height: header.height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major samples; always `width * height` long.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u16> {
        self.pixels
    }

    /// (width, height)
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u16]> {
        // chunks() panics on 0; an empty frame simply has no rows
        let width = (self.width as usize).max(1);
        self.pixels.chunks(width)
    }

    /// (min, max) pixel values, `None` for an empty frame.
    pub fn min_max(&self) -> Option<(u16, u16)> {
        let min = self.pixels.iter().copied().min()?;
        let max = self.pixels.iter().copied().max()?;
        Some((min, max))
    }
}
