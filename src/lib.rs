//! Lab Formats Library
//!
//! Readers and writers for camera frame streams (`.cam`) and loaders for the
//! text and binary files produced by lab acquisition software.

pub mod cam;
pub mod error;
pub mod formats;
pub mod output;
pub mod processing;
pub mod table;

pub use cam::{AccessStrategy, CamError, CamReader, Frame, FrameRange, FrameRead, FrameTotal};
pub use error::DataError;
pub use formats::{Info, InfoValue};
pub use table::DataTable;
