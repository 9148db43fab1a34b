//! Output format writers.

mod csv;
mod json;
mod plot;

pub use self::csv::*;
pub use self::json::*;
pub use self::plot::*;
