//! 1-D linear interpolation.

use crate::error::DataError;
use crate::table::cmp_f64;

/// What to return for points outside the sampled x range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FillPolicy {
    /// Clamp to the first/last sample value.
    #[default]
    Bounds,
    /// Return a fixed value.
    Constant(f64),
}

/// Piecewise-linear interpolator over sampled (x, y) points.
#[derive(Debug, Clone)]
pub struct Interpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    fill: FillPolicy,
}

impl Interpolator {
    /// Build from samples in any order. Points with NaN x are dropped.
    pub fn new(xs: &[f64], ys: &[f64], fill: FillPolicy) -> Result<Self, DataError> {
        if xs.len() != ys.len() {
            return Err(DataError::LengthMismatch {
                name: "y".to_string(),
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        let mut points: Vec<(f64, f64)> = xs
            .iter()
            .copied()
            .zip(ys.iter().copied())
            .filter(|(x, _)| !x.is_nan())
            .collect();
        points.sort_by(|a, b| cmp_f64(&a.0, &b.0));

        Ok(Self {
            xs: points.iter().map(|p| p.0).collect(),
            ys: points.iter().map(|p| p.1).collect(),
            fill,
        })
    }

    /// Evaluate at `x`. NaN when there are no samples or `x` is NaN.
    pub fn eval(&self, x: f64) -> f64 {
        let (first, last) = match (self.xs.first(), self.xs.last()) {
            (Some(&first), Some(&last)) if !x.is_nan() => (first, last),
            _ => return f64::NAN,
        };
        let n = self.xs.len();

        if x < first || x > last {
            return match self.fill {
                FillPolicy::Bounds if x < first => self.ys[0],
                FillPolicy::Bounds => self.ys[n - 1],
                FillPolicy::Constant(v) => v,
            };
        }
        if n == 1 || x == last {
            return self.ys[n - 1];
        }

        let i = self.xs.partition_point(|&xi| xi <= x);
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        if x1 == x0 {
            return y0;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_inside_range() {
        let interp = Interpolator::new(&[2.0, 0.0, 1.0], &[20.0, 0.0, 10.0], FillPolicy::Bounds).unwrap();
        assert_eq!(interp.eval(0.5), 5.0);
        assert_eq!(interp.eval(1.0), 10.0);
        assert_eq!(interp.eval(1.75), 17.5);
        assert_eq!(interp.eval(2.0), 20.0);
    }

    #[test]
    fn test_fill_policies() {
        let bounds = Interpolator::new(&[0.0, 1.0], &[3.0, 5.0], FillPolicy::Bounds).unwrap();
        assert_eq!(bounds.eval_many(&[-1.0, 2.0]), vec![3.0, 5.0]);

        let constant = Interpolator::new(&[0.0, 1.0], &[3.0, 5.0], FillPolicy::Constant(-1.0)).unwrap();
        assert_eq!(constant.eval(7.0), -1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(Interpolator::new(&[0.0], &[], FillPolicy::Bounds).is_err());
        let empty = Interpolator::new(&[], &[], FillPolicy::Bounds).unwrap();
        assert!(empty.eval(0.0).is_nan());
        let single = Interpolator::new(&[1.0], &[4.0], FillPolicy::Bounds).unwrap();
        assert_eq!(single.eval(0.0), 4.0);
        assert_eq!(single.eval(1.0), 4.0);
    }

    #[test]
    fn test_nan_query() {
        let interp = Interpolator::new(&[0.0, 1.0], &[3.0, 5.0], FillPolicy::Bounds).unwrap();
        assert!(interp.eval(f64::NAN).is_nan());
        let constant = Interpolator::new(&[0.0, 1.0], &[3.0, 5.0], FillPolicy::Constant(0.0)).unwrap();
        assert!(constant.eval(f64::NAN).is_nan());
        assert_eq!(interp.eval(f64::INFINITY), 5.0);
    }
}
