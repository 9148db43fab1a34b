//! Step-based grouping and simple statistics.

use crate::table::cmp_f64;

/// Median of `values`, ignoring NaN. Even counts average the middle pair.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(cmp_f64);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// First differences `values[i + 1] - values[i]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Split `values` into contiguous index ranges `(start, end)` (end
/// exclusive) such that every step inside a range lies within
/// `allowed_step = (min, max)`.
pub fn collect_into_bins(values: &[f64], allowed_step: (f64, f64)) -> Vec<(usize, usize)> {
    if values.is_empty() {
        return Vec::new();
    }
    let (min, max) = allowed_step;
    let mut bins = Vec::new();
    let mut start = 0;
    for (i, step) in diff(values).into_iter().enumerate() {
        if !(min..=max).contains(&step) {
            bins.push((start, i + 1));
            start = i + 1;
        }
    }
    bins.push((start, values.len()));
    bins
}

/// Longest bin; on ties, the later one.
pub fn longest_bin(bins: &[(usize, usize)]) -> Option<(usize, usize)> {
    bins.iter().copied().max_by_key(|(start, end)| end - start)
}
