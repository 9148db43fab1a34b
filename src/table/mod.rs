//! Labeled numeric tables and the loaders that produce them.

mod data_table;
mod loader;

pub use data_table::*;
pub use loader::*;
