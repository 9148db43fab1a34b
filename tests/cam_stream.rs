use lab_formats::cam::{encode_frame, iter_frames, load_cam, save_cam, FrameDecoder, FrameRead};
use lab_formats::{CamError, CamReader, Frame, FrameRange};
use std::path::{Path, PathBuf};

fn ramp(width: u32, height: u32, seed: u16) -> Frame {
    let pixels = (0..width * height).map(|i| seed.wrapping_add(i as u16 * 7)).collect();
    Frame::new(width, height, pixels).unwrap()
}

fn mixed_frames() -> Vec<Frame> {
    vec![ramp(2, 3, 1), ramp(2, 3, 100), ramp(4, 1, 60000)]
}

fn stream(dir: &tempfile::TempDir, frames: &[Frame]) -> PathBuf {
    let path = dir.path().join("stream.cam");
    save_cam(frames, &path, false).unwrap();
    path
}

/// Offsets of every frame header plus the end offset, via a plain sequential scan.
fn scan_offsets(path: &Path) -> Vec<u64> {
    let mut decoder = FrameDecoder::open(path).unwrap();
    let mut offsets = vec![0];
    while let FrameRead::Skipped(_) = decoder.read_frame(true).unwrap() {
        offsets.push(decoder.position());
    }
    offsets
}

#[test]
fn written_frames_read_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let frames = mixed_frames();
    let path = stream(&dir, &frames);

    assert_eq!(load_cam(&path, false).unwrap(), frames);

    let mut reader = CamReader::new(&path, false);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(&reader.get(i).unwrap(), frame);
    }
}

#[test]
fn mixed_shape_stream_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let frames = mixed_frames();
    let path = stream(&dir, &frames);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 56);

    let mut reader = CamReader::new(&path, false);
    assert_eq!(reader.size().unwrap(), 3);
    assert_eq!(reader.get(2).unwrap().shape(), (4, 1));

    let first_two: Vec<Frame> = reader.iter_range(0, Some(2), 1).map(Result::unwrap).collect();
    assert_eq!(first_two, frames[..2]);

    let every_other: Vec<Frame> = reader.iter_range(0, None, 2).map(Result::unwrap).collect();
    assert_eq!(every_other, vec![frames[0].clone(), frames[2].clone()]);

    let mut uniform = CamReader::new(&path, true);
    assert!(matches!(
        uniform.size(),
        Err(CamError::InconsistentStreamSize { file_size: 56, stride: 20 })
    ));
}

#[test]
fn offset_index_matches_sequential_scan() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![ramp(1, 1, 0), ramp(3, 2, 0), ramp(0, 5, 0), ramp(2, 2, 0), ramp(5, 1, 0)];
    let path = stream(&dir, &frames);
    let expected = scan_offsets(&path);

    let mut reader = CamReader::new(&path, false);
    let mut seen = reader.offsets().to_vec();
    for index in [3, 1, 4, 0, 2] {
        reader.get(index).unwrap();
        let now = reader.offsets().to_vec();
        assert!(now.len() >= seen.len());
        assert_eq!(&now[..seen.len()], &seen[..]);
        assert_eq!(&expected[..now.len()], &now[..]);
        seen = now;
    }

    assert_eq!(reader.size().unwrap(), frames.len());
    assert_eq!(reader.offsets(), &expected[..]);
}

#[test]
fn strategies_agree_on_uniform_stream() {
    let dir = tempfile::tempdir().unwrap();
    let frames: Vec<Frame> = (0..5).map(|i| ramp(3, 2, i * 11)).collect();
    let path = stream(&dir, &frames);

    let mut uniform = CamReader::new(&path, true);
    let mut variable = CamReader::new(&path, false);
    assert_eq!(uniform.size().unwrap(), 5);
    assert_eq!(variable.size().unwrap(), 5);

    for index in [4, 0, 2, 3, 1] {
        assert_eq!(uniform.get(index).unwrap(), variable.get(index).unwrap());
    }

    let a: Vec<Frame> = uniform.iter_range(1, Some(4), 2).map(Result::unwrap).collect();
    let b: Vec<Frame> = variable.iter_range(1, Some(4), 2).map(Result::unwrap).collect();
    assert_eq!(a, b);
    assert_eq!(a, vec![frames[1].clone(), frames[3].clone()]);
}

#[test]
fn index_past_the_end_is_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let frames = mixed_frames();
    let path = stream(&dir, &frames);

    for same_size in [false, true] {
        let mut reader = CamReader::new(&path, same_size);
        if !same_size {
            assert!(matches!(reader.get(3), Err(CamError::IndexOutOfRange { index: 3 })));
        }
        assert!(matches!(reader.get(10), Err(CamError::IndexOutOfRange { index: 10 })));
    }

    let mut reader = CamReader::new(&path, false);
    assert_eq!(reader.iter().count(), 3);
    assert_eq!(reader.iter_range(5, None, 1).count(), 0);
}

#[test]
fn truncated_tail_fails_sequential_and_indexed_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.cam");
    let mut bytes = encode_frame(&ramp(2, 2, 0));
    let second = encode_frame(&ramp(2, 2, 5));
    bytes.extend_from_slice(&second[..second.len() - 3]);
    std::fs::write(&path, &bytes).unwrap();

    let results: Vec<_> = iter_frames(&path, FrameRange::default()).unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ref e) if e.is_corruption()));

    let mut reader = CamReader::new(&path, false);
    assert!(reader.get(0).is_ok());
    assert!(matches!(reader.get(1), Err(CamError::TruncatedPayload { offset: 24, .. })));
    assert!(matches!(reader.size(), Err(CamError::TruncatedPayload { .. })));

    // range iteration treats the corrupt tail as the end of the stream
    let mut reader = CamReader::new(&path, false);
    let results: Vec<_> = reader.iter().collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

#[test]
fn appended_frames_extend_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let frames = mixed_frames();
    let path = stream(&dir, &frames[..1]);
    save_cam(&frames[1..], &path, true).unwrap();

    let mut reader = CamReader::new(&path, false);
    assert_eq!(reader.size().unwrap(), 3);
    assert_eq!(reader.get(1).unwrap(), frames[1]);
}
