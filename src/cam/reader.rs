//! Random access to frames of a .cam file without loading it whole.

use super::codec::FrameDecoder;
use super::frame::Frame;
use super::header::CamError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How frame offsets are located; fixed for the reader's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Every frame has the size of frame 0, so frame `i` sits at
    /// `stride * i`. The stride is learned on first access.
    ///
    /// If later frames do differ in size the results are undefined: frames
    /// are decoded from wherever the computed offset lands.
    Uniform { stride: Option<u64> },
    /// Frame sizes may vary; offsets are discovered by scanning and cached.
    Variable,
}

/// Reader giving indexed access to the frames of a .cam file.
///
/// The file is reopened for every access; only the offset index is kept
/// between calls. The file must not shrink or be rewritten while the
/// reader is in use.
#[derive(Debug, Clone)]
pub struct CamReader {
    path: PathBuf,
    strategy: AccessStrategy,
    /// `offsets[i]` is the header offset of frame `i`. Starts as `[0]`.
    offsets: Vec<u64>,
    frames_num: Option<usize>,
}

impl CamReader {
    /// Create a reader. With `same_size`, all frames are assumed to share
    /// one shape, making random access and [`size`](Self::size) O(1).
    pub fn new(path: impl Into<PathBuf>, same_size: bool) -> Self {
        let strategy = if same_size {
            AccessStrategy::Uniform { stride: None }
        } else {
            AccessStrategy::Variable
        };
        Self {
            path: path.into(),
            strategy,
            offsets: vec![0],
            frames_num: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn strategy(&self) -> AccessStrategy {
        self.strategy
    }

    /// Frame offsets discovered so far (variable strategy only grows this).
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Header offset of frame `index`, if already known.
    pub fn offset_of(&self, index: usize) -> Option<u64> {
        match self.strategy {
            AccessStrategy::Uniform { stride: Some(stride) } => stride.checked_mul(index as u64),
            AccessStrategy::Uniform { stride: None } => (index == 0).then_some(0),
            AccessStrategy::Variable => self.offsets.get(index).copied(),
        }
    }

    fn open(&self) -> Result<FrameDecoder<BufReader<File>>, CamError> {
        FrameDecoder::open(&self.path)
    }

    /// Learn the uniform stride from frame 0's header; `None` for an empty file.
    fn uniform_stride(&mut self) -> Result<Option<u64>, CamError> {
        if let AccessStrategy::Uniform { stride: Some(stride) } = self.strategy {
            return Ok(Some(stride));
        }

        let mut decoder = self.open()?;
        let header = match decoder.read_header()? {
            Some(header) => header,
            None => return Ok(None),
        };
        decoder.skip_payload(header)?;

        // frame 0 starts at 0, so the cursor now sits at the stride
        let stride = decoder.position();
        debug!(path = %self.path.display(), stride, "established uniform frame stride");
        self.strategy = AccessStrategy::Uniform { stride: Some(stride) };
        Ok(Some(stride))
    }

    /// Decode the frame whose header is at `offset`.
    fn read_at(&self, offset: u64, index: usize) -> Result<Frame, CamError> {
        let mut decoder = self.open()?;
        decoder.seek_to(offset)?;
        match decoder.read_header()? {
            Some(header) => decoder.read_payload(header),
            None => Err(CamError::IndexOutOfRange { index }),
        }
    }

    /// Scan forward from the last known offset until frame `index` has been
    /// located, or the end of the stream. With `read_target`, frame `index`
    /// is decoded and returned; all other payloads are skipped.
    fn scan_to(&mut self, index: usize, read_target: bool) -> Result<Option<Frame>, CamError> {
        let mut next = self.offsets.len() - 1;
        let mut decoder = self.open()?;
        decoder.seek_to(self.offsets[next])?;
        let known = self.offsets.len();

        let result = loop {
            let header = match decoder.read_header()? {
                Some(header) => header,
                None => break None,
            };
            let frame = if next == index && read_target {
                Some(decoder.read_payload(header)?)
            } else {
                decoder.skip_payload(header)?;
                None
            };
            self.offsets.push(decoder.position());
            if next == index {
                break frame;
            }
            next += 1;
        };

        if self.offsets.len() > known {
            debug!(
                path = %self.path.display(),
                indexed = self.offsets.len() - 1,
                "extended frame offset index"
            );
        }
        Ok(result)
    }

    /// Total number of frames. Computed once, then cached.
    ///
    /// Under the uniform strategy this fails with
    /// [`CamError::InconsistentStreamSize`] when the file size isn't a
    /// multiple of the stride.
    pub fn size(&mut self) -> Result<usize, CamError> {
        if let Some(n) = self.frames_num {
            return Ok(n);
        }

        let n = match self.strategy {
            AccessStrategy::Uniform { .. } => {
                let file_size = std::fs::metadata(&self.path)?.len();
                match self.uniform_stride()? {
                    None => 0,
                    Some(stride) => {
                        if file_size % stride != 0 {
                            return Err(CamError::InconsistentStreamSize { file_size, stride });
                        }
                        (file_size / stride) as usize
                    }
                }
            }
            AccessStrategy::Variable => {
                self.scan_to(usize::MAX, false)?;
                self.offsets.len() - 1
            }
        };
        self.frames_num = Some(n);
        Ok(n)
    }

    /// Frame at `index` (0-based). Negative indices and slices don't exist
    /// here; an index past the end fails with [`CamError::IndexOutOfRange`].
    pub fn get(&mut self, index: usize) -> Result<Frame, CamError> {
        if self.frames_num.is_some_and(|n| index >= n) {
            return Err(CamError::IndexOutOfRange { index });
        }

        match self.strategy {
            AccessStrategy::Uniform { .. } => {
                let stride = self
                    .uniform_stride()?
                    .ok_or(CamError::IndexOutOfRange { index })?;
                let offset = stride
                    .checked_mul(index as u64)
                    .ok_or(CamError::IndexOutOfRange { index })?;
                self.read_at(offset, index)
            }
            AccessStrategy::Variable => {
                if let Some(&offset) = self.offsets.get(index) {
                    return self.read_at(offset, index);
                }
                self.scan_to(index, true)?
                    .ok_or(CamError::IndexOutOfRange { index })
            }
        }
    }

    /// Iterate over frames `start, start + step, ...` below `stop`.
    ///
    /// Running out of frames ends the iteration quietly, and so does a
    /// truncated frame: unlike [`get`](Self::get), a corrupt tail is treated
    /// as the end of the range. Other errors are yielded once, after which
    /// the iteration ends.
    pub fn iter_range(&mut self, start: usize, stop: Option<usize>, step: usize) -> CamRangeIter<'_> {
        CamRangeIter {
            reader: self,
            next: Some(start),
            stop,
            step: step.max(1),
        }
    }

    /// Iterate over all frames.
    pub fn iter(&mut self) -> CamRangeIter<'_> {
        self.iter_range(0, None, 1)
    }
}

/// Iterator returned by [`CamReader::iter_range`].
pub struct CamRangeIter<'a> {
    reader: &'a mut CamReader,
    next: Option<usize>,
    stop: Option<usize>,
    step: usize,
}

impl Iterator for CamRangeIter<'_> {
    type Item = Result<Frame, CamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        if self.stop.is_some_and(|stop| index >= stop) {
            self.next = None;
            return None;
        }

        match self.reader.get(index) {
            Ok(frame) => {
                self.next = index.checked_add(self.step);
                Some(Ok(frame))
            }
            Err(CamError::IndexOutOfRange { .. }) => {
                self.next = None;
                None
            }
            Err(e) if e.is_corruption() => {
                debug!(index, error = %e, "range iteration stopped at truncated frame");
                self.next = None;
                None
            }
            Err(e) => {
                self.next = None;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cam::save_cam;

    fn frame(width: u32, height: u32, fill: u16) -> Frame {
        let pixels = (0..width * height).map(|i| fill + i as u16).collect();
        Frame::new(width, height, pixels).unwrap()
    }

    fn write_stream(frames: &[Frame]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.cam");
        save_cam(frames, &path, false).unwrap();
        (dir, path)
    }

    #[test]
    fn test_variable_index_grows_on_access() {
        let frames = vec![frame(2, 3, 0), frame(2, 3, 10), frame(4, 1, 20)];
        let (_dir, path) = write_stream(&frames);
        let mut reader = CamReader::new(&path, false);
        assert_eq!(reader.offsets(), &[0]);

        assert_eq!(reader.get(1).unwrap(), frames[1]);
        assert_eq!(reader.offsets(), &[0, 20, 40]);

        assert_eq!(reader.get(0).unwrap(), frames[0]);
        assert_eq!(reader.offsets(), &[0, 20, 40]);

        assert_eq!(reader.get(2).unwrap(), frames[2]);
        assert_eq!(reader.offsets(), &[0, 20, 40]);

        assert_eq!(reader.size().unwrap(), 3);
        assert_eq!(reader.offsets(), &[0, 20, 40, 56]);
    }

    #[test]
    fn test_variable_size_and_out_of_range() {
        let frames = vec![frame(2, 3, 0), frame(2, 3, 10), frame(4, 1, 20)];
        let (_dir, path) = write_stream(&frames);
        let mut reader = CamReader::new(&path, false);

        assert!(matches!(reader.get(3), Err(CamError::IndexOutOfRange { index: 3 })));
        assert_eq!(reader.size().unwrap(), 3);
        assert!(matches!(reader.get(7), Err(CamError::IndexOutOfRange { index: 7 })));
    }

    #[test]
    fn test_uniform_strategy() {
        let frames: Vec<Frame> = (0..4).map(|i| frame(3, 2, i * 100)).collect();
        let (_dir, path) = write_stream(&frames);
        let mut reader = CamReader::new(&path, true);

        assert_eq!(reader.offset_of(2), None);
        assert_eq!(reader.get(3).unwrap(), frames[3]);
        assert_eq!(reader.strategy(), AccessStrategy::Uniform { stride: Some(20) });
        assert_eq!(reader.offset_of(2), Some(40));
        assert_eq!(reader.size().unwrap(), 4);
        assert!(matches!(reader.get(4), Err(CamError::IndexOutOfRange { index: 4 })));
    }

    #[test]
    fn test_uniform_inconsistent_size() {
        let (_dir, path) = write_stream(&[frame(2, 3, 0), frame(2, 3, 0), frame(4, 1, 0)]);
        let mut reader = CamReader::new(&path, true);
        match reader.size() {
            Err(CamError::InconsistentStreamSize { file_size, stride }) => {
                assert_eq!(file_size, 56);
                assert_eq!(stride, 20);
            }
            other => panic!("expected inconsistent size, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file() {
        let (_dir, path) = write_stream(&[]);
        for same_size in [false, true] {
            let mut reader = CamReader::new(&path, same_size);
            assert_eq!(reader.size().unwrap(), 0);
            assert!(matches!(reader.get(0), Err(CamError::IndexOutOfRange { index: 0 })));
            assert_eq!(reader.iter().count(), 0);
        }
    }

    #[test]
    fn test_iter_range_stops_at_end() {
        let frames: Vec<Frame> = (0..5).map(|i| frame(1, 2, i)).collect();
        let (_dir, path) = write_stream(&frames);
        let mut reader = CamReader::new(&path, false);

        let read: Vec<Frame> = reader.iter_range(1, None, 2).collect::<Result<_, _>>().unwrap();
        assert_eq!(read, vec![frames[1].clone(), frames[3].clone()]);

        let read: Vec<Frame> = reader.iter_range(3, Some(100), 1).collect::<Result<_, _>>().unwrap();
        assert_eq!(read, vec![frames[3].clone(), frames[4].clone()]);

        assert_eq!(reader.iter_range(4, Some(2), 1).count(), 0);
    }

    #[test]
    fn test_truncated_payload_fails_get_but_ends_iteration() {
        let (_dir, path) = write_stream(&[frame(2, 2, 0), frame(2, 2, 5)]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut reader = CamReader::new(&path, false);
        assert!(matches!(reader.get(1), Err(CamError::TruncatedPayload { .. })));

        let mut reader = CamReader::new(&path, false);
        let results: Vec<_> = reader.iter().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn test_oversized_header_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cam");
        let mut bytes = vec![0xFF; 8];
        bytes.extend_from_slice(&[0; 2]);
        std::fs::write(&path, &bytes).unwrap();

        let mut uniform = CamReader::new(&path, true);
        assert!(matches!(uniform.size(), Err(CamError::TruncatedPayload { offset: 8, .. })));
        assert!(matches!(uniform.get(0), Err(CamError::TruncatedPayload { .. })));

        let mut variable = CamReader::new(&path, false);
        assert!(matches!(variable.get(0), Err(CamError::TruncatedPayload { .. })));
        assert!(matches!(variable.size(), Err(CamError::TruncatedPayload { .. })));
        assert_eq!(variable.iter().count(), 0);
    }

    #[test]
    fn test_uniform_truncated_payload() {
        let (_dir, path) = write_stream(&[frame(2, 2, 0), frame(2, 2, 5), frame(2, 2, 9)]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut reader = CamReader::new(&path, true);
        assert_eq!(reader.get(1).unwrap(), frame(2, 2, 5));
        assert!(matches!(reader.get(2), Err(CamError::TruncatedPayload { offset: 40, .. })));
        assert!(matches!(reader.size(), Err(CamError::InconsistentStreamSize { .. })));
    }
}
