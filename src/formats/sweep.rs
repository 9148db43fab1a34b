//! Binary laser sweeps from the waveguide setup, and their normalization.
//!
//! A sweep `prefix` consists of `prefix.dat` (raw little-endian f64 rows)
//! and `prefix_info.txt` describing, among other things, the channel names.

use super::info::{load_info, Info, InfoValue};
use crate::error::DataError;
use crate::processing::{collect_into_bins, diff, longest_bin, median, FillPolicy, Interpolator};
use crate::table::{load_binary_f64, DataTable};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Column holding the laser frequency (in THz as recorded).
pub const FREQUENCY_COLUMN: &str = "Wavemeter";

/// Append `suffix` to the final path component.
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Channel names are used as column names: no spaces, `-` becomes `_`.
pub fn filter_channel_name(name: &str) -> String {
    name.replace(' ', "").replace('-', "_")
}

/// Load the sweep at `prefix` together with its info file.
///
/// Columns come from the info file's `channels` entry; without it the table
/// has a single column. With `force_info`, a missing info file is an error.
pub fn load_sweep(prefix: &Path, force_info: bool) -> Result<(DataTable, Info), DataError> {
    let info_path = with_suffix(prefix, "_info.txt");
    let mut info = if info_path.exists() {
        load_info(&info_path)?
    } else if force_info {
        return Err(DataError::MissingFile(info_path.display().to_string()));
    } else {
        Info::new()
    };

    let channels: Vec<String> = match info.get("channels") {
        Some(values) => values
            .iter()
            .map(|v| filter_channel_name(&v.to_string()))
            .collect(),
        None => Vec::new(),
    };
    if !channels.is_empty() {
        info.insert(
            "channels",
            channels.iter().cloned().map(InfoValue::Text).collect(),
        );
    }

    let data = load_binary_f64(&with_suffix(prefix, ".dat"), &channels)?;
    Ok((data, info))
}

/// Which frequency steps count as continuous in [`prepare_sweep_frequency`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AllowedJump {
    /// Keep the whole sweep.
    #[default]
    Any,
    /// `(-10 * median step, 1.1 * max step)` along the sweep direction.
    Auto,
    /// Explicit `(min, max)` step range.
    Range(f64, f64),
}

/// Clean up sweep frequencies.
///
/// With `rescale`, the frequency is converted from THz to Hz. Unless
/// `allowed_jump` is [`AllowedJump::Any`], only the longest contiguous
/// chunk whose steps stay within the allowed range is kept. With
/// `ascending`, rows are sorted by frequency.
pub fn prepare_sweep_frequency(
    mut sweep: DataTable,
    allowed_jump: AllowedJump,
    ascending: bool,
    rescale: bool,
) -> Result<DataTable, DataError> {
    if rescale {
        for f in sweep.column_mut(FREQUENCY_COLUMN)? {
            *f *= 1e12;
        }
    }
    if sweep.len() <= 1 {
        return Ok(sweep);
    }

    let fs = sweep.column(FREQUENCY_COLUMN)?.to_vec();
    let dfs = diff(&fs);
    let rising = dfs.iter().filter(|&&d| d > 0.0).count() > dfs.len() / 2;
    let fdir = if rising { 1.0 } else { -1.0 };

    let allowed = match allowed_jump {
        AllowedJump::Any => None,
        AllowedJump::Range(min, max) => Some((min, max)),
        AllowedJump::Auto => {
            let valid: Vec<f64> = dfs.iter().copied().filter(|d| d * fdir > 0.0).collect();
            median(&valid).map(|mfs| {
                let maxfs = fdir * valid.iter().map(|d| d * fdir).fold(f64::NEG_INFINITY, f64::max);
                let (a, b) = (-10.0 * mfs, 1.1 * maxfs);
                (a.min(b), a.max(b))
            })
        }
    };

    if let Some(range) = allowed {
        if let Some((start, end)) = longest_bin(&collect_into_bins(&fs, range)) {
            debug!(start, end, total = fs.len(), "kept longest continuous sweep chunk");
            sweep = sweep.slice_rows(start, end);
        }
    }
    if ascending {
        sweep = sweep.sort_by(FREQUENCY_COLUMN)?;
    }
    Ok(sweep)
}

fn x_values<'a>(sweep: &'a DataTable, x_column: Option<&str>) -> Result<&'a [f64], DataError> {
    match x_column {
        Some(name) => sweep.column(name),
        None => sweep
            .column_at(0)
            .ok_or_else(|| DataError::MissingColumn("0".to_string())),
    }
}

/// Indices `i` where `|x[i + 1] - x[i]| > jump_size`.
fn jump_locations(xs: &[f64], jump_size: f64) -> Vec<usize> {
    diff(xs)
        .iter()
        .enumerate()
        .filter(|(_, d)| d.abs() > jump_size)
        .map(|(i, _)| i)
        .collect()
}

/// Remove short segments between x jumps.
///
/// Segments bounded by jumps larger than `jump_size` that are shorter than
/// `length` points are dropped, widened by `padding` on both sides. Jumps
/// within the last `ignore_last` points are not considered. `x_column`
/// defaults to the first column.
pub fn cut_outliers(
    sweep: &DataTable,
    jump_size: f64,
    length: usize,
    padding: usize,
    x_column: Option<&str>,
    ignore_last: usize,
) -> Result<DataTable, DataError> {
    let xs = x_values(sweep, x_column)?;
    let n = xs.len();
    if n == 0 {
        return Ok(sweep.clone());
    }

    let mut locations = jump_locations(xs, jump_size);
    locations.push(n - 1);

    let mut include = vec![true; n];
    let mut prev: isize = -1;
    for loc in locations {
        let loc = loc as isize;
        if loc > n as isize - ignore_last as isize {
            break;
        }
        if loc - prev < length as isize {
            let start = (prev + 1 - padding as isize).max(0) as usize;
            let end = ((loc + 1) as usize + padding).min(n);
            include[start..end].fill(false);
        }
        prev = loc;
    }
    Ok(sweep.select_rows(&include))
}

/// Remove points around each x jump larger than `jump_size`.
///
/// `trim = (before, after)`: `before` points up to and including the one
/// preceding the jump, and `after` points following it.
pub fn trim_jumps(
    sweep: &DataTable,
    jump_size: f64,
    trim: (usize, usize),
    x_column: Option<&str>,
) -> Result<DataTable, DataError> {
    let xs = x_values(sweep, x_column)?;
    let n = xs.len();
    let mut include = vec![true; n];
    for loc in jump_locations(xs, jump_size) {
        let start = (loc as isize - trim.0 as isize + 1).max(0) as usize;
        let end = (loc + 1 + trim.1).min(n);
        if start < end {
            include[start..end].fill(false);
        }
    }
    Ok(sweep.select_rows(&include))
}

/// Points `floor(min / step) * step ..= floor(max / step) * step`.
///
/// Non-finite bounds, a step that isn't a positive finite number, or a grid
/// too long to allocate fail with [`DataError::InvalidGrid`].
fn frequency_grid(min: f64, max: f64, step: f64) -> Result<Vec<f64>, DataError> {
    let invalid = || DataError::InvalidGrid { min, max, step };
    if !(min.is_finite() && max.is_finite() && step.is_finite() && step > 0.0) {
        return Err(invalid());
    }
    let start = (min / step).floor() * step;
    let stop = (max / step).floor() * step;
    if stop < start {
        return Ok(Vec::new());
    }

    // `as` saturates, so an out-of-range step count fails the add
    let count = (((stop - start) / step).round() as usize)
        .checked_add(1)
        .ok_or_else(invalid)?;
    let mut grid = Vec::new();
    grid.try_reserve_exact(count).map_err(|_| invalid())?;
    grid.extend((0..count).map(|i| start + i as f64 * step));
    Ok(grid)
}

/// Resample sweep columns onto a regular frequency grid.
///
/// The grid runs from `floor(min / step) * step` to `floor(max / step) * step`
/// inclusive, with `min`/`max` taken from `range` or the data. Each
/// `(source, destination)` pair becomes a column next to `Frequency`;
/// points outside the data are clamped to the boundary values. A sweep with
/// no finite frequencies gives an empty grid.
pub fn interpolate_sweep(
    sweep: &DataTable,
    columns: &[(&str, &str)],
    frequency_step: f64,
    range: (Option<f64>, Option<f64>),
    frequency_column: &str,
) -> Result<DataTable, DataError> {
    let fs = sweep.column(frequency_column)?;
    let finite = || fs.iter().copied().filter(|f| f.is_finite());
    let min = range.0.or_else(|| finite().reduce(f64::min));
    let max = range.1.or_else(|| finite().reduce(f64::max));

    let freqs = match (min, max) {
        (Some(min), Some(max)) => frequency_grid(min, max, frequency_step)?,
        _ => Vec::new(),
    };

    let mut out = DataTable::new();
    out.push_column("Frequency", freqs.clone())?;
    for (src, dst) in columns {
        let interp = Interpolator::new(fs, sweep.column(src)?, FillPolicy::Bounds)?;
        out.push_column(*dst, interp.eval_many(&freqs))?;
    }
    Ok(out)
}

fn load_prepared(
    prefix: &Path,
    rep: usize,
    min_sweep_length: usize,
    extra_info: &Info,
) -> Result<Option<(DataTable, Info)>, DataError> {
    let (sweep, mut info) = load_sweep(prefix, true)?;
    let sweep = prepare_sweep_frequency(sweep, AllowedJump::Any, true, true)?;
    if sweep.len() < min_sweep_length {
        debug!(prefix = %prefix.display(), rows = sweep.len(), "sweep too short, skipped");
        return Ok(None);
    }
    info.insert("rep", vec![InfoValue::Int(rep as i64)]);
    for (key, values) in extra_info.iter() {
        info.insert(key, values.to_vec());
    }
    Ok(Some((sweep, info)))
}

/// Load and normalize the sweeps `prefix_rep_000`, `prefix_rep_001`, ... for
/// each index in `reps` (or just `prefix` when `reps` is empty).
///
/// Each info map gets a `rep` entry plus the entries of `extra_info`. Sweeps
/// shorter than `min_sweep_length` rows, or that fail to load, are left out.
pub fn load_prepared_sweeps(
    prefix: &Path,
    reps: &[usize],
    min_sweep_length: usize,
    extra_info: &Info,
) -> Vec<(DataTable, Info)> {
    let targets: Vec<(PathBuf, usize)> = if reps.is_empty() {
        vec![(prefix.to_path_buf(), 0)]
    } else {
        reps.iter()
            .map(|&rep| (with_suffix(prefix, &format!("_rep_{:03}", rep)), rep))
            .collect()
    };

    let mut sweeps = Vec::new();
    for (path, rep) in targets {
        match load_prepared(&path, rep, min_sweep_length, extra_info) {
            Ok(Some(sweep)) => sweeps.push(sweep),
            Ok(None) => {}
            Err(e) => warn!(prefix = %path.display(), error = %e, "skipping sweep"),
        }
    }
    sweeps
}
