//! Dense least-squares solver.
//!
//! The orthogonal distance regression repeatedly solves a tiny, tall linear
//! system for its parameter step:
//!
//! ```text
//! minimize ‖A Δ - b‖²
//! ```
//!
//! where `A` stacks the residual Jacobian on top of the Levenberg–Marquardt
//! damping rows. SVD handles the tall shape directly and stays usable when the
//! Jacobian columns are nearly collinear (e.g. every secondary reading equal).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
/// Callers must check that `a` and `b` are finite first.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Progressively looser singular-value cutoffs before giving up.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(step) = svd.solve(b, tol) {
            if step.iter().all(|v| v.is_finite()) {
                return Some(step);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_overdetermined_line() {
        // y = 10 + 2x sampled at x = [0, 1, 2, 3]
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[10.0, 12.0, 14.0, 16.0]);

        let beta = solve_least_squares(&a, &b).unwrap();
        assert!((beta[0] - 10.0).abs() < 1e-10);
        assert!((beta[1] - 2.0).abs() < 1e-10);
    }
}
