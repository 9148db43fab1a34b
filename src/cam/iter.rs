//! Forward-only streaming over .cam frames, and reductions built on it.

use super::codec::{FrameDecoder, FrameRead};
use super::frame::Frame;
use super::header::CamError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::trace;

/// Which frames of a stream to visit: `start`, `start + step`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: usize,
    /// A step of 0 is treated as 1.
    pub step: usize,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self { start: 0, step: 1 }
    }
}

impl FrameRange {
    pub fn new(start: usize, step: usize) -> Self {
        Self { start, step }
    }

    /// Whether the frame at `index` is visited.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && (index - self.start) % self.step.max(1) == 0
    }
}

/// Lazy frame iterator over one stream.
///
/// Frames outside the range are skipped without reading their payload.
/// Iteration stops at the end of the stream; a truncated frame yields one
/// error and ends the iteration.
pub struct FrameIter<R> {
    decoder: FrameDecoder<R>,
    range: FrameRange,
    index: usize,
    done: bool,
}

impl<R: Read + Seek> FrameIter<R> {
    pub fn new(decoder: FrameDecoder<R>, range: FrameRange) -> Self {
        Self {
            decoder,
            range,
            index: 0,
            done: false,
        }
    }
}

impl<R: Read + Seek> Iterator for FrameIter<R> {
    type Item = Result<Frame, CamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let skip = !self.range.contains(self.index);
            match self.decoder.read_frame(skip) {
                Ok(FrameRead::Frame(frame)) => {
                    self.index += 1;
                    return Some(Ok(frame));
                }
                Ok(FrameRead::Skipped(header)) => {
                    trace!(index = self.index, width = header.width, height = header.height, "skipped frame");
                    self.index += 1;
                }
                Ok(FrameRead::EndOfStream) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Iterate over the frames of a .cam file.
///
/// Each call opens its own handle, released when the iterator is dropped.
pub fn iter_frames(path: &Path, range: FrameRange) -> Result<FrameIter<BufReader<File>>, CamError> {
    Ok(FrameIter::new(FrameDecoder::open(path)?, range))
}

/// Load every frame of a .cam file.
///
/// With `same_size`, a frame whose shape differs from the first one fails
/// with [`CamError::ShapeMismatch`].
pub fn load_cam(path: &Path, same_size: bool) -> Result<Vec<Frame>, CamError> {
    let mut frames: Vec<Frame> = Vec::new();
    for frame in iter_frames(path, FrameRange::default())? {
        let frame = frame?;
        if same_size {
            if let Some(first) = frames.first() {
                if first.shape() != frame.shape() {
                    return Err(CamError::ShapeMismatch {
                        index: frames.len(),
                        expected: first.shape(),
                        actual: frame.shape(),
                    });
                }
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

/// Fold the frames of a .cam file left to right.
///
/// Without `init`, the first visited frame seeds the accumulator and is not
/// passed to `reduce`. At most `max_frames` frames are visited (the seed
/// included); `Some(0)` is a real limit and visits nothing, it does not mean
/// "unlimited" (use `None` for that). Returns the result and the number of
/// frames visited; any error aborts the whole fold.
pub fn combine_frames<T, F>(
    path: &Path,
    init: Option<T>,
    range: FrameRange,
    max_frames: Option<usize>,
    mut reduce: F,
) -> Result<(Option<T>, usize), CamError>
where
    T: From<Frame>,
    F: FnMut(T, Frame) -> Result<T, CamError>,
{
    let mut result = init;
    let mut count = 0;
    if max_frames == Some(0) {
        return Ok((result, count));
    }

    for frame in iter_frames(path, range)? {
        let frame = frame?;
        result = Some(match result {
            None => T::from(frame),
            Some(acc) => reduce(acc, frame)?,
        });
        count += 1;
        if max_frames.is_some_and(|max| count >= max) {
            break;
        }
    }
    Ok((result, count))
}

/// Frame-shaped accumulator with f64 samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameTotal {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
}

impl From<Frame> for FrameTotal {
    fn from(frame: Frame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            values: frame.pixels().iter().map(|&p| p as f64).collect(),
        }
    }
}

impl FrameTotal {
    /// Add `frame` pixel-wise; `index` is only used for error reporting.
    pub fn add(mut self, frame: &Frame, index: usize) -> Result<Self, CamError> {
        if (self.width, self.height) != frame.shape() {
            return Err(CamError::ShapeMismatch {
                index,
                expected: (self.width, self.height),
                actual: frame.shape(),
            });
        }
        for (acc, &p) in self.values.iter_mut().zip(frame.pixels()) {
            *acc += p as f64;
        }
        Ok(self)
    }

    pub fn scale(mut self, factor: f64) -> Self {
        for v in &mut self.values {
            *v *= factor;
        }
        self
    }

    /// Narrow back to a u16 frame; `None` if `values` doesn't match the shape.
    pub fn to_frame(&self) -> Option<Frame> {
        Frame::from_samples(self.width, self.height, &self.values)
    }
}

/// Pixel-wise sum of the visited frames, with the number of frames summed.
pub fn sum_frames(
    path: &Path,
    range: FrameRange,
    max_frames: Option<usize>,
) -> Result<(Option<FrameTotal>, usize), CamError> {
    let mut index = 0;
    combine_frames(path, None, range, max_frames, |acc: FrameTotal, frame| {
        index += 1;
        acc.add(&frame, index)
    })
}

/// Pixel-wise mean of the visited frames.
pub fn mean_frame(
    path: &Path,
    range: FrameRange,
    max_frames: Option<usize>,
) -> Result<(Option<FrameTotal>, usize), CamError> {
    let (total, count) = sum_frames(path, range, max_frames)?;
    Ok((total.map(|t| t.scale(1.0 / count as f64)), count))
}
