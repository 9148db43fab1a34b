//! Property-based tests for .cam streams.

use lab_formats::cam::{iter_frames, load_cam, save_cam, FrameDecoder, FrameRead};
use lab_formats::{CamReader, Frame, FrameRange};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn frame_of(width: u32, height: u32) -> impl Strategy<Value = Frame> {
    prop::collection::vec(any::<u16>(), (width * height) as usize)
        .prop_map(move |pixels| Frame::new(width, height, pixels).unwrap())
}

fn any_frame() -> impl Strategy<Value = Frame> {
    (0u32..5, 0u32..5).prop_flat_map(|(w, h)| frame_of(w, h))
}

fn same_shape_frames() -> impl Strategy<Value = Vec<Frame>> {
    (1u32..5, 1u32..5, 1usize..7)
        .prop_flat_map(|(w, h, n)| prop::collection::vec(frame_of(w, h), n))
}

fn stream(dir: &tempfile::TempDir, frames: &[Frame]) -> PathBuf {
    let path = dir.path().join("stream.cam");
    save_cam(frames, &path, false).unwrap();
    path
}

fn scan_offsets(path: &Path) -> Vec<u64> {
    let mut decoder = FrameDecoder::open(path).unwrap();
    let mut offsets = vec![0];
    while let FrameRead::Skipped(_) = decoder.read_frame(true).unwrap() {
        offsets.push(decoder.position());
    }
    offsets
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Whatever is written comes back unchanged and in order, both from the
    // sequential iterator and from the bulk loader.
    #[test]
    fn written_streams_read_back(frames in prop::collection::vec(any_frame(), 0..6)) {
        let dir = tempfile::tempdir().unwrap();
        let path = stream(&dir, &frames);

        let read: Vec<Frame> = iter_frames(&path, FrameRange::default())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        prop_assert_eq!(&read, &frames);
        prop_assert_eq!(load_cam(&path, false).unwrap(), frames);
    }

    // The offset index only grows, keeps its known prefix, and always agrees
    // with a plain sequential scan, whatever order frames are requested in.
    #[test]
    fn offset_index_grows_monotonically(
        frames in prop::collection::vec(any_frame(), 1..6),
        order in prop::collection::vec(0usize..16, 1..12),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = stream(&dir, &frames);
        let expected = scan_offsets(&path);

        let mut reader = CamReader::new(&path, false);
        let mut seen = reader.offsets().to_vec();
        for index in order.into_iter().map(|i| i % frames.len()) {
            prop_assert_eq!(&reader.get(index).unwrap(), &frames[index]);
            let now = reader.offsets().to_vec();
            prop_assert!(now.len() >= seen.len());
            prop_assert_eq!(&now[..seen.len()], &seen[..]);
            prop_assert_eq!(&expected[..now.len()], &now[..]);
            prop_assert!(now.windows(2).all(|w| w[0] < w[1]));
            seen = now;
        }

        prop_assert_eq!(reader.size().unwrap(), frames.len());
        prop_assert_eq!(reader.offsets(), &expected[..]);
    }

    // On a stream of one shape both access strategies see the same frames.
    #[test]
    fn strategies_agree_on_same_shape_streams(
        frames in same_shape_frames(),
        start in 0usize..8,
        stop in prop::option::of(0usize..8),
        step in 1usize..4,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = stream(&dir, &frames);

        let mut uniform = CamReader::new(&path, true);
        let mut variable = CamReader::new(&path, false);
        prop_assert_eq!(uniform.size().unwrap(), frames.len());
        prop_assert_eq!(variable.size().unwrap(), frames.len());

        for index in (0..frames.len()).rev() {
            prop_assert_eq!(uniform.get(index).unwrap(), variable.get(index).unwrap());
        }

        let a: Vec<Frame> = uniform.iter_range(start, stop, step).map(Result::unwrap).collect();
        let b: Vec<Frame> = variable.iter_range(start, stop, step).map(Result::unwrap).collect();
        let end = stop.unwrap_or(frames.len()).min(frames.len());
        let expected: Vec<Frame> = (start..end).step_by(step).map(|i| frames[i].clone()).collect();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a, expected);
    }
}
