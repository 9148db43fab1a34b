//! Writing frames to .cam files.

use super::codec::write_frame;
use super::frame::Frame;
use super::header::CamError;
use std::borrow::Borrow;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `frames` to a .cam file, returning the number written.
///
/// With `append`, frames are added after any existing content; otherwise the
/// file is truncated first.
pub fn save_cam<I>(frames: I, path: &Path, append: bool) -> Result<usize, CamError>
where
    I: IntoIterator,
    I::Item: Borrow<Frame>,
{
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    let mut count = 0;
    for frame in frames {
        write_frame(&mut writer, frame.borrow())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
