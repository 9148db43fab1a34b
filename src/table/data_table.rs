//! Column-labeled numeric table.

use crate::error::DataError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;

/// Numeric table with named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parallel name and column lists.
    pub fn from_columns<S: Into<String>>(names: Vec<S>, columns: Vec<Vec<f64>>) -> Result<Self, DataError> {
        if names.len() != columns.len() {
            return Err(DataError::ColumnCount {
                expected: names.len(),
                actual: columns.len(),
            });
        }
        let mut table = Self::new();
        for (name, values) in names.into_iter().zip(columns) {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn require(&self, name: &str) -> Result<usize, DataError> {
        self.position(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&[f64], DataError> {
        let idx = self.require(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut [f64], DataError> {
        let idx = self.require(name)?;
        Ok(&mut self.columns[idx])
    }

    pub fn column_at(&self, idx: usize) -> Option<&[f64]> {
        self.columns.get(idx).map(Vec::as_slice)
    }

    /// Insert a column before position `at` (clamped to the end).
    pub fn insert_column<S: Into<String>>(&mut self, at: usize, name: S, values: Vec<f64>) -> Result<(), DataError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(DataError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && values.len() != self.len() {
            return Err(DataError::LengthMismatch {
                name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        let at = at.min(self.columns.len());
        self.names.insert(at, name);
        self.columns.insert(at, values);
        Ok(())
    }

    pub fn push_column<S: Into<String>>(&mut self, name: S, values: Vec<f64>) -> Result<(), DataError> {
        self.insert_column(self.columns.len(), name, values)
    }

    pub fn remove_column(&mut self, name: &str) -> Result<Vec<f64>, DataError> {
        let idx = self.require(name)?;
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    pub fn remove_columns(&mut self, names: &[&str]) -> Result<(), DataError> {
        for name in names {
            self.remove_column(name)?;
        }
        Ok(())
    }

    pub fn remove_column_at(&mut self, idx: usize) -> Option<(String, Vec<f64>)> {
        if idx >= self.columns.len() {
            return None;
        }
        Some((self.names.remove(idx), self.columns.remove(idx)))
    }

    /// Keep only the first `width` columns.
    pub fn truncate_columns(&mut self, width: usize) {
        self.names.truncate(width);
        self.columns.truncate(width);
    }

    /// Replace all column names; the count must match.
    pub fn rename_columns(&mut self, names: &[&str]) -> Result<(), DataError> {
        if names.len() != self.names.len() {
            return Err(DataError::ColumnCount {
                expected: self.names.len(),
                actual: names.len(),
            });
        }
        self.names = names.iter().map(|n| n.to_string()).collect();
        Ok(())
    }

    pub fn row(&self, idx: usize) -> Option<Vec<f64>> {
        if idx >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[idx]).collect())
    }

    fn map_columns(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| f(c)).collect(),
        }
    }

    /// Rows where `mask` is true; rows past the end of `mask` are dropped.
    pub fn select_rows(&self, mask: &[bool]) -> Self {
        self.map_columns(|c| {
            c.iter()
                .zip(mask)
                .filter(|&(_, &keep)| keep)
                .map(|(&v, _)| v)
                .collect()
        })
    }

    /// Rows in `start..end`, clamped to the table.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        self.map_columns(|c| c[start..end].to_vec())
    }

    /// Rows reordered by ascending `name` (stable; NaN sorts last).
    pub fn sort_by(&self, name: &str) -> Result<Self, DataError> {
        let key = self.column(name)?;
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| match (key[a].is_nan(), key[b].is_nan()) {
            (false, false) => key[a].total_cmp(&key[b]),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        });
        Ok(self.map_columns(|c| order.iter().map(|&i| c[i]).collect()))
    }
}

impl Serialize for DataTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, values) in self.names.iter().zip(&self.columns) {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Ordering helper shared with the processing code.
pub(crate) fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}
