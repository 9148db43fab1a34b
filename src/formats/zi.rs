//! Exports from the lock-in amplifier control software.
//!
//! Demod scope files hold samples versus time, sweep files hold samples
//! versus drive frequency. Both are plain numeric text tables.

use crate::error::DataError;
use crate::table::{load_delimited, DataTable};
use num_complex::Complex64;
use std::path::Path;
use std::str::FromStr;

/// Number of demodulators a scope folder may hold traces for.
pub const DEMOD_COUNT: usize = 6;

const SCOPE_COLUMNS: [&str; 6] = ["Time", "X", "Y", "Freq", "AuxIn1", "AuxIn2"];
const SWEEP_COLUMNS: [&str; 4] = ["Freq", "R", "Theta", "Bandwidth"];

/// How the demod signal is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Separate `X` and `Y` columns.
    #[default]
    Xy,
    /// One complex column `C = X + iY`.
    Complex,
}

impl FromStr for ResultFormat {
    type Err = DataError;

    /// Accepts `xy` and `comp` (or `complex`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xy" => Ok(ResultFormat::Xy),
            "comp" | "complex" => Ok(ResultFormat::Complex),
            other => Err(DataError::UnknownFormat(other.to_string())),
        }
    }
}

/// A loaded lock-in table.
#[derive(Debug, Clone, PartialEq)]
pub enum LockInData {
    Xy(DataTable),
    /// The real-valued columns plus the complex signal, which sits right
    /// after the first column (`Time` or `Freq`).
    Complex { table: DataTable, signal: Vec<Complex64> },
}

impl LockInData {
    /// The real-valued columns.
    pub fn table(&self) -> &DataTable {
        match self {
            LockInData::Xy(table) | LockInData::Complex { table, .. } => table,
        }
    }

    pub fn signal(&self) -> Option<&[Complex64]> {
        match self {
            LockInData::Xy(_) => None,
            LockInData::Complex { signal, .. } => Some(signal),
        }
    }

    /// Column names in file order, `C` included.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.table().column_names().to_vec();
        if let LockInData::Complex { .. } = self {
            names.insert(names.len().min(1), "C".to_string());
        }
        names
    }

    pub fn into_xy(self) -> Option<DataTable> {
        match self {
            LockInData::Xy(table) => Some(table),
            LockInData::Complex { .. } => None,
        }
    }
}

fn expect_width(table: &DataTable, expected: usize) -> Result<(), DataError> {
    if table.width() != expected {
        return Err(DataError::ColumnCount {
            expected,
            actual: table.width(),
        });
    }
    Ok(())
}

/// Replace the `X`, `Y` columns with the complex signal.
fn into_complex(mut table: DataTable) -> Result<LockInData, DataError> {
    let x = table.remove_column("X")?;
    let y = table.remove_column("Y")?;
    let signal = x.iter().zip(&y).map(|(&re, &im)| Complex64::new(re, im)).collect();
    Ok(LockInData::Complex { table, signal })
}

/// Convert a raw 7-column scope table.
///
/// Column 4 is unused and dropped; time is shifted to start at 0.
pub fn scope_from_table(mut data: DataTable, format: ResultFormat) -> Result<LockInData, DataError> {
    expect_width(&data, 7)?;
    data.remove_column_at(4);
    data.rename_columns(&SCOPE_COLUMNS)?;

    let time = data.column_mut("Time")?;
    if let Some(&t0) = time.first() {
        for t in time.iter_mut() {
            *t -= t0;
        }
    }
    match format {
        ResultFormat::Xy => Ok(LockInData::Xy(data)),
        ResultFormat::Complex => into_complex(data),
    }
}

/// Load a single demod scope file (demod samples vs. time).
///
/// Columns: `Time, X, Y, Freq, AuxIn1, AuxIn2`, or `Time, C, Freq, AuxIn1,
/// AuxIn2` in the complex format.
pub fn load_spectr_file(path: &Path, format: ResultFormat) -> Result<LockInData, DataError> {
    scope_from_table(load_delimited(path)?, format)
}

/// Load a folder of demod scope files (`Freq1.csv` .. `Freq6.csv`).
///
/// Returns one entry per demod, `None` where the file is absent.
pub fn load_spectr_folder(dir: &Path, format: ResultFormat) -> Result<Vec<Option<LockInData>>, DataError> {
    (1..=DEMOD_COUNT)
        .map(|demod| {
            let path = dir.join(format!("Freq{}.csv", demod));
            if path.exists() {
                load_spectr_file(&path, format).map(Some)
            } else {
                Ok(None)
            }
        })
        .collect()
}

/// Convert a raw 8-column sweep table.
///
/// Only the first four columns are kept; polar `R, Theta` (degrees) are
/// replaced by cartesian `X, Y` or by the complex `C = R e^(i Theta)`.
pub fn sweep_from_table(mut data: DataTable, format: ResultFormat) -> Result<LockInData, DataError> {
    expect_width(&data, 8)?;
    data.truncate_columns(SWEEP_COLUMNS.len());
    data.rename_columns(&SWEEP_COLUMNS)?;

    let r = data.remove_column("R")?;
    let theta = data.remove_column("Theta")?;
    let signal = r.iter().zip(&theta).map(|(&r, &deg)| Complex64::from_polar(r, deg.to_radians()));

    match format {
        ResultFormat::Xy => {
            let (x, y): (Vec<f64>, Vec<f64>) = signal.map(|c| (c.re, c.im)).unzip();
            data.insert_column(1, "X", x)?;
            data.insert_column(2, "Y", y)?;
            Ok(LockInData::Xy(data))
        }
        ResultFormat::Complex => Ok(LockInData::Complex {
            table: data,
            signal: signal.collect(),
        }),
    }
}

/// Load a single sweep file (demod samples vs. drive frequency).
///
/// Columns: `Freq, X, Y, Bandwidth`, or `Freq, C, Bandwidth` in the complex
/// format.
pub fn load_sweep_file(path: &Path, format: ResultFormat) -> Result<LockInData, DataError> {
    sweep_from_table(load_delimited(path)?, format)
}

/// Load the sweep file (`Data.csv`) in a sweep folder.
pub fn load_sweep_folder(dir: &Path, format: ResultFormat) -> Result<LockInData, DataError> {
    load_sweep_file(&dir.join("Data.csv"), format)
}
