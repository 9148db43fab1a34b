//! Frame header and error types for the .cam stream format.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Errors that can occur while reading or writing .cam streams.
#[derive(Error, Debug)]
pub enum CamError {
    #[error("Truncated frame header at offset {offset}: {available} of 8 bytes available")]
    TruncatedHeader { offset: u64, available: usize },

    #[error("Truncated frame payload at offset {offset}: {available} pixels available instead of {expected}")]
    TruncatedPayload {
        offset: u64,
        expected: u64,
        available: u64,
    },

    #[error("File size {file_size} is not a multiple of frame size {stride}")]
    InconsistentStreamSize { file_size: u64, stride: u64 },

    #[error("Frame index {index} is out of range")]
    IndexOutOfRange { index: usize },

    #[error("Frame {index} has a different size: {actual:?} instead of {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CamError {
    /// True for errors meaning the stream is corrupt past this point.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CamError::TruncatedHeader { .. } | CamError::TruncatedPayload { .. }
        )
    }
}

/// Frame header: two little-endian u32 (width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
}

impl FrameHeader {
    pub const SIZE: usize = 8;

    /// Parse from the first 8 bytes of `data`.
    pub fn from_bytes(data: &[u8; Self::SIZE]) -> Self {
        Self {
            width: LittleEndian::read_u32(&data[0..4]),
            height: LittleEndian::read_u32(&data[4..8]),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.width);
        LittleEndian::write_u32(&mut out[4..8], self.height);
        out
    }

    /// Number of samples in the payload.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Payload size in bytes, `None` if a corrupt header declares more than
    /// `u64` can address.
    pub fn payload_len(&self) -> Option<u64> {
        self.pixel_count().checked_mul(2)
    }

    /// Distance from this header to the next one.
    pub fn stride(&self) -> Option<u64> {
        self.payload_len()?.checked_add(Self::SIZE as u64)
    }
}
