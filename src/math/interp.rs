//! Piecewise-linear interpolation.
//!
//! - `interp`: 1D linear interpolation with end-value clamping outside the
//!   sampled range (used for time series and for spectra on a native grid).
//! - `GridInterpolator`: bilinear interpolation over a rectilinear 2D grid;
//!   returns `NaN` outside the grid's bounding box rather than extrapolating.

use crate::error::{PwvError, Result};

/// Linearly interpolate `fp(xp)` at `x`.
///
/// `xp` must be non-decreasing. Values below `xp[0]` / above `xp[n-1]` take
/// the first / last sample. An empty table yields `NaN`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // Largest i with xp[i] <= x; xp[i + 1] > x is guaranteed here.
    let i = xp[..n].partition_point(|&v| v <= x) - 1;
    let t = (x - xp[i]) / (xp[i + 1] - xp[i]);
    if t == 0.0 {
        return fp[i];
    }
    fp[i] + t * (fp[i + 1] - fp[i])
}

/// `interp` for every value in `xs`.
pub fn interp_all(xs: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| interp(x, xp, fp)).collect()
}

/// True if `values` never decreases.
pub fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

/// True if `values` strictly increases.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// Bilinear interpolator over the grid `x_axis × y_axis`.
#[derive(Debug, Clone)]
pub struct GridInterpolator {
    x_axis: Vec<f64>,
    y_axis: Vec<f64>,
    /// Row-major: `values[i * y_axis.len() + j]` is the sample at `(x_i, y_j)`.
    values: Vec<f64>,
}

impl GridInterpolator {
    /// Build from axes and one row of samples per `x_axis` entry.
    ///
    /// Both axes must be strictly increasing and `rows` must be
    /// `x_axis.len() × y_axis.len()`.
    pub fn new(x_axis: Vec<f64>, y_axis: Vec<f64>, rows: &[Vec<f64>]) -> Result<Self> {
        if x_axis.is_empty() || y_axis.is_empty() {
            return Err(PwvError::MalformedDimensions("grid axes cannot be empty".into()));
        }
        if rows.len() != x_axis.len() || rows.iter().any(|r| r.len() != y_axis.len()) {
            return Err(PwvError::MalformedDimensions(format!(
                "expected a {}x{} grid of samples",
                x_axis.len(),
                y_axis.len()
            )));
        }
        if !is_strictly_increasing(&x_axis) || !is_strictly_increasing(&y_axis) {
            return Err(PwvError::MalformedDimensions(
                "grid points must be strictly ascending in each dimension".into(),
            ));
        }

        let values = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Ok(Self {
            x_axis,
            y_axis,
            values,
        })
    }

    pub fn x_axis(&self) -> &[f64] {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &[f64] {
        &self.y_axis
    }

    /// Interpolate at `(x, y)`; `NaN` outside the grid.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let (Some((i, tx)), Some((j, ty))) = (locate(&self.x_axis, x), locate(&self.y_axis, y)) else {
            return f64::NAN;
        };

        let ny = self.y_axis.len();
        let mut total = 0.0;
        for (di, wx) in [(0, 1.0 - tx), (1, tx)] {
            if wx == 0.0 {
                continue;
            }
            for (dj, wy) in [(0, 1.0 - ty), (1, ty)] {
                if wy == 0.0 {
                    continue;
                }
                total += wx * wy * self.values[(i + di) * ny + (j + dj)];
            }
        }
        total
    }
}

/// Cell index and fractional offset of `q` on `axis`, or `None` outside it.
fn locate(axis: &[f64], q: f64) -> Option<(usize, f64)> {
    let n = axis.len();
    if !(q >= axis[0] && q <= axis[n - 1]) {
        return None;
    }
    if n == 1 {
        return Some((0, 0.0));
    }
    let i = (axis.partition_point(|&v| v <= q).max(1) - 1).min(n - 2);
    let t = (q - axis[i]) / (axis[i + 1] - axis[i]);
    Some((i, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interp_clamps_and_hits_samples_exactly() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [10.0, 20.0, 40.0];
        assert_eq!(interp(-5.0, &xp, &fp), 10.0);
        assert_eq!(interp(1.0, &xp, &fp), 20.0);
        assert_eq!(interp(3.0, &xp, &fp), 40.0);
        assert_eq!(interp(9.0, &xp, &fp), 40.0);
        assert!((interp(2.0, &xp, &fp) - 30.0).abs() < 1e-12);
        assert!(interp(1.0, &[], &[]).is_nan());
    }

    #[test]
    fn interp_handles_repeated_abscissae() {
        let xp = [0.0, 1.0, 1.0, 2.0];
        let fp = [0.0, 1.0, 5.0, 6.0];
        assert!((interp(1.5, &xp, &fp) - 5.5).abs() < 1e-12);
    }

    #[test]
    fn grid_recovers_samples_and_blends_between_them() {
        let grid = GridInterpolator::new(
            vec![0.0, 1.0],
            vec![10.0, 20.0, 30.0],
            &[vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0]],
        )
        .unwrap();

        assert_eq!(grid.eval(0.0, 20.0), 2.0);
        assert_eq!(grid.eval(1.0, 30.0), 5.0);
        assert!((grid.eval(0.5, 15.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn grid_is_nan_outside_bounds() {
        let grid = GridInterpolator::new(vec![0.0, 1.0], vec![0.0, 1.0], &[vec![0.0, 1.0], vec![1.0, 2.0]]).unwrap();
        assert!(grid.eval(-0.1, 0.5).is_nan());
        assert!(grid.eval(0.5, 1.5).is_nan());
    }

    #[test]
    fn grid_rejects_mismatched_rows() {
        let err = GridInterpolator::new(vec![1.0, 2.0], vec![100.0, 200.0], &[vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(err, PwvError::MalformedDimensions(_)));
    }
}
