//! Camera frame streams (.cam): a sequence of `[width][height][u16 pixels]` frames.

mod codec;
mod frame;
mod header;
mod iter;
mod reader;
mod writer;

pub use codec::*;
pub use frame::*;
pub use header::*;
pub use iter::*;
pub use reader::*;
pub use writer::*;
