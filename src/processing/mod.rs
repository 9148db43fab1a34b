//! Numeric helpers for post-processing sweeps.

mod filters;
mod interpolate;

pub use filters::*;
pub use interpolate::*;
