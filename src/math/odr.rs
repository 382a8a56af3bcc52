//! First-order orthogonal distance regression (errors in both variables).
//!
//! For a straight line `y = b + m x` with per-point standard deviations
//! `sx_i`, `sy_i`, the ODR objective
//!
//! ```text
//! Σ [ (y_i - b - m (x_i + δ_i))² / sy_i² + δ_i² / sx_i² ]
//! ```
//!
//! can be minimized over the nuisance shifts `δ_i` in closed form, leaving the
//! effective-variance objective
//!
//! ```text
//! S(b, m) = Σ (y_i - b - m x_i)² / (sy_i² + m² sx_i²)
//! ```
//!
//! which we minimize with a damped Gauss–Newton (Levenberg–Marquardt) loop
//! starting from `b = 0`, `m = 1`. Each step is a 2-parameter least-squares
//! solve (`solve_least_squares`).
//!
//! Like ODRPACK, the fit reports *why* it stopped. Only a numerical error is
//! fatal; reaching the iteration limit still returns the last estimate.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::error::{PwvError, Result};
use crate::math::solve_least_squares;

/// Initial guess `(intercept, slope)`.
pub const BETA0: [f64; 2] = [0.0, 1.0];

const MAX_ITERATIONS: usize = 200;
const SUM_SQUARES_TOL: f64 = 1e-14;
const PARAM_TOL: f64 = 1e-12;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

/// Why the optimizer stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// No data points were supplied; the initial guess is returned.
    EmptyData,
    SumOfSquaresConvergence,
    ParameterConvergence,
    IterationLimit,
    NumericalError(String),
}

impl StopReason {
    pub fn is_numerical_error(&self) -> bool {
        matches!(self, StopReason::NumericalError(_))
    }

    /// True when one of the convergence criteria was met.
    pub fn is_converged(&self) -> bool {
        matches!(self, StopReason::SumOfSquaresConvergence | StopReason::ParameterConvergence)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EmptyData => write!(f, "Empty data"),
            StopReason::SumOfSquaresConvergence => write!(f, "Sum of squares convergence"),
            StopReason::ParameterConvergence => write!(f, "Parameter convergence"),
            StopReason::IterationLimit => write!(f, "Iteration limit reached"),
            StopReason::NumericalError(detail) => write!(f, "Numerical error detected: {detail}"),
        }
    }
}

/// Result of a linear ODR fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Final value of the weighted orthogonal sum of squares.
    pub sum_of_squares: f64,
    pub iterations: usize,
    pub stop_reason: StopReason,
}

impl LinearFit {
    pub fn apply(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Population standard deviation of the vertical residuals `y - f(x)`.
    pub fn residual_std(&self, x: &[f64], y: &[f64]) -> f64 {
        let residuals: Vec<f64> = x.iter().zip(y).map(|(&xi, &yi)| yi - self.apply(xi)).collect();
        population_std(&residuals)
    }
}

/// Fit `y = intercept + slope * x` by orthogonal distance regression.
///
/// Fails with `FitConvergence` when the optimizer stops on a numerical error
/// (e.g. zero combined uncertainty for some point).
pub fn linear_regression(x: &[f64], y: &[f64], sx: &[f64], sy: &[f64]) -> Result<LinearFit> {
    let n = x.len();
    if y.len() != n || sx.len() != n || sy.len() != n {
        return Err(PwvError::MalformedDimensions(format!(
            "regression inputs have lengths x={}, y={}, sx={}, sy={}",
            n,
            y.len(),
            sx.len(),
            sy.len()
        )));
    }

    let fit = run_odr(x, y, sx, sy);
    if fit.stop_reason.is_numerical_error() {
        return Err(PwvError::FitConvergence(fit.stop_reason.to_string()));
    }
    Ok(fit)
}

fn run_odr(x: &[f64], y: &[f64], sx: &[f64], sy: &[f64]) -> LinearFit {
    let [mut b, mut m] = BETA0;

    if x.is_empty() {
        return LinearFit {
            intercept: b,
            slope: m,
            sum_of_squares: 0.0,
            iterations: 0,
            stop_reason: StopReason::EmptyData,
        };
    }

    let inputs_finite = x
        .iter()
        .chain(y)
        .chain(sx)
        .chain(sy)
        .all(|v| v.is_finite());
    if !inputs_finite {
        return numerical_failure(b, m, 0, "non-finite input data");
    }

    let Some(mut cost) = sum_of_squares(x, y, sx, sy, b, m) else {
        return numerical_failure(b, m, 0, "zero combined uncertainty");
    };

    let mut lambda = LAMBDA_INIT;
    for iteration in 1..=MAX_ITERATIONS {
        let Some((jac, res)) = jacobian(x, y, sx, sy, b, m) else {
            return numerical_failure(b, m, iteration, "zero combined uncertainty");
        };

        if cost == 0.0 {
            return converged(b, m, cost, iteration, StopReason::SumOfSquaresConvergence);
        }

        // Marquardt scaling: damp each parameter by its own curvature.
        let jtj = jac.transpose() * &jac;
        let scale = [jtj[(0, 0)].max(f64::MIN_POSITIVE), jtj[(1, 1)].max(f64::MIN_POSITIVE)];

        loop {
            let step = match damped_step(&jac, &res, lambda, scale) {
                Some(step) => step,
                None => return numerical_failure(b, m, iteration, "singular Jacobian"),
            };
            let (b_new, m_new) = (b + step[0], m + step[1]);
            let small_step = step[0].abs() <= PARAM_TOL * (b.abs() + 1.0)
                && step[1].abs() <= PARAM_TOL * (m.abs() + 1.0);

            match sum_of_squares(x, y, sx, sy, b_new, m_new) {
                Some(new_cost) if new_cost <= cost => {
                    let reduction = cost - new_cost;
                    b = b_new;
                    m = m_new;
                    let old_cost = cost;
                    cost = new_cost;
                    lambda = (lambda / 10.0).max(1e-12);

                    if cost == 0.0 || reduction <= SUM_SQUARES_TOL * old_cost {
                        return converged(b, m, cost, iteration, StopReason::SumOfSquaresConvergence);
                    }
                    if small_step {
                        return converged(b, m, cost, iteration, StopReason::ParameterConvergence);
                    }
                    break;
                }
                _ => {
                    if small_step {
                        return converged(b, m, cost, iteration, StopReason::ParameterConvergence);
                    }
                    lambda *= 10.0;
                    // No descent direction left at this precision.
                    if lambda > LAMBDA_MAX {
                        return converged(b, m, cost, iteration, StopReason::ParameterConvergence);
                    }
                }
            }
        }
    }

    converged(b, m, cost, MAX_ITERATIONS, StopReason::IterationLimit)
}

/// Solve `[J; sqrt(λ D)] Δ = [-r; 0]` for the parameter step.
fn damped_step(jac: &DMatrix<f64>, res: &DVector<f64>, lambda: f64, scale: [f64; 2]) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let mut a = DMatrix::<f64>::zeros(n + 2, 2);
    let mut rhs = DVector::<f64>::zeros(n + 2);

    for i in 0..n {
        a[(i, 0)] = jac[(i, 0)];
        a[(i, 1)] = jac[(i, 1)];
        rhs[i] = -res[i];
    }
    a[(n, 0)] = (lambda * scale[0]).sqrt();
    a[(n + 1, 1)] = (lambda * scale[1]).sqrt();

    if a.iter().chain(rhs.iter()).any(|v| !v.is_finite()) {
        return None;
    }
    solve_least_squares(&a, &rhs)
}

/// Effective-variance residuals and their Jacobian with respect to `(b, m)`.
fn jacobian(
    x: &[f64],
    y: &[f64],
    sx: &[f64],
    sy: &[f64],
    b: f64,
    m: f64,
) -> Option<(DMatrix<f64>, DVector<f64>)> {
    let n = x.len();
    let mut jac = DMatrix::<f64>::zeros(n, 2);
    let mut res = DVector::<f64>::zeros(n);

    for i in 0..n {
        let s = (sy[i] * sy[i] + m * m * sx[i] * sx[i]).sqrt();
        if !(s > 0.0 && s.is_finite()) {
            return None;
        }
        let e = y[i] - b - m * x[i];
        res[i] = e / s;
        jac[(i, 0)] = -1.0 / s;
        jac[(i, 1)] = -x[i] / s - e * m * sx[i] * sx[i] / (s * s * s);
    }

    Some((jac, res))
}

fn sum_of_squares(x: &[f64], y: &[f64], sx: &[f64], sy: &[f64], b: f64, m: f64) -> Option<f64> {
    let mut total = 0.0;
    for i in 0..x.len() {
        let var = sy[i] * sy[i] + m * m * sx[i] * sx[i];
        if !(var > 0.0) {
            return None;
        }
        let e = y[i] - b - m * x[i];
        total += e * e / var;
    }
    total.is_finite().then_some(total)
}

fn converged(b: f64, m: f64, cost: f64, iterations: usize, stop_reason: StopReason) -> LinearFit {
    LinearFit {
        intercept: b,
        slope: m,
        sum_of_squares: cost,
        iterations,
        stop_reason,
    }
}

fn numerical_failure(b: f64, m: f64, iterations: usize, detail: &str) -> LinearFit {
    LinearFit {
        intercept: b,
        slope: m,
        sum_of_squares: f64::NAN,
        iterations,
        stop_reason: StopReason::NumericalError(detail.to_string()),
    }
}

/// Standard deviation with `N` in the denominator. `NaN` for empty input.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    var.sqrt()
}
