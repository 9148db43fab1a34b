//! Errors for table loading and the text/sweep formats.

use thiserror::Error;

/// Errors raised while loading or transforming tabular data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Unexpected number of columns: expected {expected}, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("Column {name} has {actual} values, table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid number {value:?} on line {line}")]
    InvalidNumber { line: usize, value: String },

    #[error("Cannot build a grid from {min} to {max} with step {step}")]
    InvalidGrid { min: f64, max: f64, step: f64 },

    #[error("Unrecognized result format: {0}")]
    UnknownFormat(String),

    #[error("Binary data size {size} is not a multiple of {row_size} bytes per row")]
    BinarySize { size: usize, row_size: usize },

    #[error("Unusual line format: {0:?}")]
    MalformedLine(Vec<String>),

    #[error("Key line {0} doesn't have a following value line")]
    MissingValueLine(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("File {0} doesn't exist")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
