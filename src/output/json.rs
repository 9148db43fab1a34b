//! JSON output format.

use crate::cam::{AccessStrategy, CamError, CamReader, Frame, FrameDecoder, FrameRead};
use crate::formats::Info;
use crate::table::DataTable;
use serde::Serialize;
use std::io::Write;

/// Shape of one frame in a stream summary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameShape {
    pub index: usize,
    pub offset: Option<u64>,
    pub width: u32,
    pub height: u32,
}

/// Summary of a .cam stream.
#[derive(Debug, Clone, Serialize)]
pub struct CamSummary {
    pub path: String,
    pub frame_count: usize,
    pub same_size: bool,
    pub frames: Vec<FrameShape>,
    pub metadata: JsonMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonMetadata {
    pub source_format: &'static str,
}

/// JSON wrapper for a single exported frame.
#[derive(Serialize)]
pub struct FrameOutput<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub frame: &'a Frame,
    pub metadata: JsonMetadata,
}

/// JSON wrapper for a table, with the metadata it was loaded with.
#[derive(Serialize)]
pub struct TableOutput<'a> {
    pub columns: &'a DataTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'a Info>,
}

impl CamSummary {
    /// Scan the stream behind `reader` and list every frame's shape.
    ///
    /// Only headers are read; payloads are skipped.
    pub fn collect(reader: &mut CamReader) -> Result<Self, CamError> {
        let frame_count = reader.size()?;
        let mut decoder = FrameDecoder::open(reader.path())?;
        let mut frames = Vec::with_capacity(frame_count);
        loop {
            let offset = decoder.position();
            match decoder.read_frame(true)? {
                FrameRead::Skipped(header) => frames.push(FrameShape {
                    index: frames.len(),
                    offset: Some(offset),
                    width: header.width,
                    height: header.height,
                }),
                FrameRead::Frame(_) | FrameRead::EndOfStream => break,
            }
        }

        Ok(Self {
            path: reader.path().display().to_string(),
            frame_count,
            same_size: reader.strategy() != AccessStrategy::Variable,
            frames,
            metadata: JsonMetadata {
                source_format: "cam_v1",
            },
        })
    }
}

/// Write any serializable value as JSON.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    value: &T,
    writer: W,
    pretty: bool,
) -> Result<(), serde_json::Error> {
    if pretty {
        serde_json::to_writer_pretty(writer, value)
    } else {
        serde_json::to_writer(writer, value)
    }
}

/// Write a single frame as JSON.
pub fn write_json_frame<W: Write>(
    frame: &Frame,
    index: usize,
    writer: W,
    pretty: bool,
) -> Result<(), serde_json::Error> {
    let output = FrameOutput {
        index,
        frame,
        metadata: JsonMetadata {
            source_format: "cam_v1",
        },
    };
    write_json(&output, writer, pretty)
}

/// Write a table as `{"columns": {name: values}}`, plus its info map if given.
pub fn write_json_table<W: Write>(
    table: &DataTable,
    info: Option<&Info>,
    writer: W,
    pretty: bool,
) -> Result<(), serde_json::Error> {
    write_json(&TableOutput { columns: table, info }, writer, pretty)
}

/// Serialize a value as a JSON string.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cam::save_cam;

    #[test]
    fn test_frame_json_layout() {
        let frame = Frame::new(2, 1, vec![5, 6]).unwrap();
        let mut buf = Vec::new();
        write_json_frame(&frame, 3, &mut buf, false).unwrap();
        let json = String::from_utf8(buf).unwrap();
        assert_eq!(
            json,
            r#"{"index":3,"width":2,"height":1,"pixels":[5,6],"metadata":{"source_format":"cam_v1"}}"#
        );
    }

    #[test]
    fn test_table_json_layout() {
        let table = DataTable::from_columns(vec!["Frequency", "T"], vec![vec![1.0, 2.0], vec![0.5, 0.25]]).unwrap();
        let mut info = Info::new();
        info.insert("rep", vec![crate::formats::InfoValue::Int(2)]);

        let mut buf = Vec::new();
        write_json_table(&table, Some(&info), &mut buf, false).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            r#"{"columns":{"Frequency":[1.0,2.0],"T":[0.5,0.25]},"info":{"rep":[2]}}"#
        );

        let bare = to_json_string(&TableOutput { columns: &table, info: None }, false).unwrap();
        assert!(!bare.contains("info"));
    }

    #[test]
    fn test_summary_lists_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.cam");
        let frames = [Frame::new(2, 3, vec![0; 6]).unwrap(), Frame::new(4, 1, vec![1; 4]).unwrap()];
        save_cam(&frames, &path, false).unwrap();

        let mut reader = CamReader::new(&path, false);
        let summary = CamSummary::collect(&mut reader).unwrap();
        assert_eq!(summary.frame_count, 2);
        assert!(!summary.same_size);
        assert_eq!(
            summary.frames[1],
            FrameShape {
                index: 1,
                offset: Some(20),
                width: 4,
                height: 1
            }
        );
        assert!(to_json_string(&summary, true).unwrap().contains("\"frame_count\": 2"));
    }

    #[test]
    fn test_summary_offsets_come_from_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.cam");
        let frames = [Frame::new(3, 1, vec![1, 2, 3]).unwrap(), Frame::new(3, 1, vec![4, 5, 6]).unwrap()];
        save_cam(&frames, &path, false).unwrap();

        // offsets are known even though no frame was fetched through the reader
        let mut reader = CamReader::new(&path, true);
        let summary = CamSummary::collect(&mut reader).unwrap();
        assert!(summary.same_size);
        let offsets: Vec<Option<u64>> = summary.frames.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![Some(0), Some(14)]);
        assert_eq!((summary.frames[1].width, summary.frames[1].height), (3, 1));
    }
}
