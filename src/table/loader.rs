//! Loaders for delimited text tables and raw binary f64 tables.

use super::data_table::DataTable;
use crate::error::DataError;
use byteorder::{ByteOrder, LittleEndian};
use std::path::Path;

/// Load a numeric text table.
///
/// See [`parse_delimited`] for the accepted layout.
pub fn load_delimited(path: &Path) -> Result<DataTable, DataError> {
    let text = std::fs::read_to_string(path)?;
    parse_delimited(&text)
}

/// Split a line on the first separator kind it contains:
/// comma, semicolon, tab, then any whitespace.
fn split_fields(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = if line.contains(',') {
        line.split(',').collect()
    } else if line.contains(';') {
        line.split(';').collect()
    } else if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    };
    fields.into_iter().map(str::trim).collect()
}

fn parse_field(field: &str) -> Option<f64> {
    if field.is_empty() {
        return Some(f64::NAN);
    }
    field.parse().ok()
}

/// Parse a numeric text table.
///
/// Blank lines and lines starting with `#` are skipped. A non-numeric first
/// line is used as the column names; otherwise columns are named by index
/// (`"0"`, `"1"`, ...). Empty fields read as NaN.
pub fn parse_delimited(text: &str) -> Result<DataTable, DataError> {
    let mut names: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<f64>> = Vec::new();
    let mut rows = 0usize;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        let values: Option<Vec<f64>> = fields.iter().map(|f| parse_field(f)).collect();

        let values = match values {
            Some(values) => values,
            None if rows == 0 && names.is_none() => {
                names = Some(fields.iter().map(|f| f.to_string()).collect());
                continue;
            }
            None => {
                let bad = fields
                    .iter()
                    .find(|f| parse_field(f).is_none())
                    .map(|f| f.to_string())
                    .unwrap_or_default();
                return Err(DataError::InvalidNumber {
                    line: line_no + 1,
                    value: bad,
                });
            }
        };

        let expected = names.as_ref().map_or(columns.len(), Vec::len);
        if rows == 0 && columns.is_empty() {
            if names.is_some() && values.len() != expected {
                return Err(DataError::ColumnCount {
                    expected,
                    actual: values.len(),
                });
            }
            columns = vec![Vec::new(); values.len()];
        } else if values.len() != columns.len() {
            return Err(DataError::ColumnCount {
                expected: columns.len(),
                actual: values.len(),
            });
        }

        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
        rows += 1;
    }

    let names = match names {
        Some(names) => names,
        None => (0..columns.len()).map(|i| i.to_string()).collect(),
    };
    if columns.is_empty() {
        columns = vec![Vec::new(); names.len()];
    }
    DataTable::from_columns(names, columns)
}

/// Load raw little-endian f64 samples as a row-major table.
pub fn load_binary_f64(path: &Path, columns: &[String]) -> Result<DataTable, DataError> {
    let bytes = std::fs::read(path)?;
    parse_binary_f64(&bytes, columns)
}

/// Parse raw little-endian f64 samples, row-major with `columns.len()`
/// columns. With no column names, the result is a single column `"0"`.
pub fn parse_binary_f64(bytes: &[u8], columns: &[String]) -> Result<DataTable, DataError> {
    let names: Vec<String> = if columns.is_empty() {
        vec!["0".to_string()]
    } else {
        columns.to_vec()
    };
    let width = names.len();
    let row_size = width * 8;
    if bytes.len() % row_size != 0 {
        return Err(DataError::BinarySize {
            size: bytes.len(),
            row_size,
        });
    }

    let mut samples = vec![0f64; bytes.len() / 8];
    LittleEndian::read_f64_into(bytes, &mut samples);

    let mut data: Vec<Vec<f64>> = vec![Vec::with_capacity(samples.len() / width); width];
    for row in samples.chunks(width) {
        for (column, &value) in data.iter_mut().zip(row) {
            column.push(value);
        }
    }
    DataTable::from_columns(names, data)
}
