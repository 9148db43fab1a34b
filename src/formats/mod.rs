//! Instrument file formats other than .cam streams.

pub mod info;
pub mod sweep;
pub mod zi;

pub use info::{load_info, parse_info, Info, InfoValue};
pub use zi::{LockInData, ResultFormat};
