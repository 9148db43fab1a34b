//! Frame codec: header + payload encoding and a positioned frame decoder.

use super::frame::Frame;
use super::header::{CamError, FrameHeader};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Outcome of reading one frame from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    /// A fully decoded frame.
    Frame(Frame),
    /// The header was read and the payload skipped.
    Skipped(FrameHeader),
    /// The stream ended exactly on a frame boundary.
    EndOfStream,
}

/// Reads frames from a seekable byte stream, tracking the current offset.
///
/// The stream length is taken once at construction; the stream is assumed
/// not to change while the decoder is alive.
pub struct FrameDecoder<R> {
    reader: R,
    position: u64,
    len: u64,
}

impl FrameDecoder<BufReader<File>> {
    /// Open a .cam file for decoding from offset 0.
    pub fn open(path: &Path) -> Result<Self, CamError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file))?)
    }
}

impl<R: Read + Seek> FrameDecoder<R> {
    pub fn new(mut reader: R) -> io::Result<Self> {
        let position = reader.stream_position()?;
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        Ok(Self {
            reader,
            position,
            len,
        })
    }

    /// Current byte offset in the stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total stream length in bytes.
    pub fn stream_len(&self) -> u64 {
        self.len
    }

    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Read the next header; `None` means a clean end of stream.
    pub fn read_header(&mut self) -> Result<Option<FrameHeader>, CamError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < FrameHeader::SIZE as u64 {
            return Err(CamError::TruncatedHeader {
                offset: self.position,
                available: remaining as usize,
            });
        }

        let mut buf = [0u8; FrameHeader::SIZE];
        self.reader.read_exact(&mut buf)?;
        self.position += FrameHeader::SIZE as u64;
        Ok(Some(FrameHeader::from_bytes(&buf)))
    }

    /// Payload length of `header`, if the rest of the stream holds it.
    ///
    /// A length too large for `u64` can never be satisfied and is reported
    /// as truncation like any other oversized header.
    fn check_payload(&self, header: FrameHeader) -> Result<u64, CamError> {
        let remaining = self.remaining();
        match header.payload_len() {
            Some(len) if len <= remaining => Ok(len),
            _ => Err(CamError::TruncatedPayload {
                offset: self.position,
                expected: header.pixel_count(),
                available: remaining / 2,
            }),
        }
    }

    /// Read the payload described by `header`.
    pub fn read_payload(&mut self, header: FrameHeader) -> Result<Frame, CamError> {
        let payload_len = self.check_payload(header)?;

        let mut bytes = vec![0u8; payload_len as usize];
        self.reader.read_exact(&mut bytes)?;
        self.position += payload_len;

        let mut pixels = vec![0u16; bytes.len() / 2];
        LittleEndian::read_u16_into(&bytes, &mut pixels);
        Ok(Frame::from_header(header, pixels))
    }

    /// Move the cursor past the payload described by `header`.
    ///
    /// Nothing is read, but a payload running past the end of the stream
    /// still fails.
    pub fn skip_payload(&mut self, header: FrameHeader) -> Result<(), CamError> {
        let payload_len = self.check_payload(header)?;
        self.reader.seek(SeekFrom::Current(payload_len as i64))?;
        self.position += payload_len;
        Ok(())
    }

    /// Read one frame, or skip over it when `skip` is set.
    pub fn read_frame(&mut self, skip: bool) -> Result<FrameRead, CamError> {
        let header = match self.read_header()? {
            Some(header) => header,
            None => return Ok(FrameRead::EndOfStream),
        };
        if skip {
            self.skip_payload(header)?;
            Ok(FrameRead::Skipped(header))
        } else {
            Ok(FrameRead::Frame(self.read_payload(header)?))
        }
    }
}

/// Encode a frame as header + little-endian u16 payload.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(FrameHeader::SIZE + frame.pixels().len() * 2);
    out.extend_from_slice(&frame.header().to_bytes());
    let start = out.len();
    out.resize(start + frame.pixels().len() * 2, 0);
    LittleEndian::write_u16_into(frame.pixels(), &mut out[start..]);
    out
}

/// Write one encoded frame to `writer`.
pub fn write_frame<W: Write>(mut writer: W, frame: &Frame) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(frame.width())?;
    writer.write_u32::<LittleEndian>(frame.height())?;
    let mut payload = vec![0u8; frame.pixels().len() * 2];
    LittleEndian::write_u16_into(frame.pixels(), &mut payload);
    writer.write_all(&payload)
}
