//! Calibrating one secondary receiver against the primary, and averaging the
//! calibrated estimates of several secondaries.
//!
//! Missing samples are `None`. A sample only counts as present when both its
//! value and its error are known, and every output keeps the value and error
//! masks identical.

use crate::error::{PwvError, Result};
use crate::math::{LinearFit, linear_regression};

/// Primary-equivalent PWV derived from one secondary receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedEstimate {
    pub values: Vec<Option<f64>>,
    pub errors: Vec<Option<f64>>,
    /// `None` when nothing was fitted (primary entirely missing or no overlap).
    pub fit: Option<LinearFit>,
}

impl FittedEstimate {
    fn missing(len: usize) -> Self {
        Self {
            values: vec![None; len],
            errors: vec![None; len],
            fit: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Fit `primary ≈ b + m · secondary` by ODR and apply it to every secondary
/// sample.
///
/// - primary entirely missing: the secondary values and errors are returned
///   as they are
/// - no sample where both are present: an all-missing estimate
/// - fitted values `<= 0` are marked missing
///
/// The error of each estimate is the population standard deviation of the
/// fit residuals, identical for every sample.
pub fn fit_secondary_to_primary(
    secondary: &[Option<f64>],
    primary: &[Option<f64>],
    secondary_err: &[Option<f64>],
    primary_err: &[Option<f64>],
) -> Result<FittedEstimate> {
    let n = secondary.len();
    if primary.len() != n || secondary_err.len() != n || primary_err.len() != n {
        return Err(PwvError::MalformedDimensions(format!(
            "calibration inputs have lengths secondary={}, primary={}, secondary_err={}, primary_err={}",
            n,
            primary.len(),
            secondary_err.len(),
            primary_err.len()
        )));
    }

    let secondary_at = |i: usize| secondary[i].zip(secondary_err[i]);
    let primary_at = |i: usize| primary[i].zip(primary_err[i]);

    if (0..n).all(|i| primary_at(i).is_none()) {
        let (values, errors) = (0..n)
            .map(|i| match secondary_at(i) {
                Some((v, e)) => (Some(v), Some(e)),
                None => (None, None),
            })
            .unzip();
        return Ok(FittedEstimate { values, errors, fit: None });
    }

    let (mut x, mut y, mut sx, mut sy) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for i in 0..n {
        if let (Some((xv, xe)), Some((yv, ye))) = (secondary_at(i), primary_at(i)) {
            x.push(xv);
            y.push(yv);
            sx.push(xe);
            sy.push(ye);
        }
    }

    if x.is_empty() {
        return Ok(FittedEstimate::missing(n));
    }

    let fit = linear_regression(&x, &y, &sx, &sy)?;
    let std = fit.residual_std(&x, &y);

    let mut values = Vec::with_capacity(n);
    let mut errors = Vec::with_capacity(n);
    for i in 0..n {
        let fitted = secondary_at(i)
            .map(|(v, _)| fit.apply(v))
            .filter(|&v| v.is_finite() && v > 0.0);
        values.push(fitted);
        errors.push(fitted.map(|_| std));
    }

    Ok(FittedEstimate {
        values,
        errors,
        fit: Some(fit),
    })
}

/// Unweighted mean of several estimates with quadrature-combined errors.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedEstimate {
    pub values: Vec<Option<f64>>,
    pub errors: Vec<Option<f64>>,
    /// Timestamps where no estimate was available, whether or not the
    /// primary has a sample there.
    pub unfilled: usize,
}

/// Average `estimates` sample by sample.
///
/// With `n` estimates available at a sample, the value is their mean and the
/// error `sqrt(Σ err²) / n`. Samples with no estimate stay missing.
pub fn average_estimates(estimates: &[FittedEstimate]) -> Result<AveragedEstimate> {
    let len = estimates.first().map_or(0, FittedEstimate::len);
    if estimates.iter().any(|e| e.len() != len) {
        return Err(PwvError::MalformedDimensions(
            "estimates being averaged must cover the same timestamps".into(),
        ));
    }

    let mut values = Vec::with_capacity(len);
    let mut errors = Vec::with_capacity(len);
    let mut unfilled = 0;

    for i in 0..len {
        let available: Vec<(f64, f64)> = estimates
            .iter()
            .filter_map(|e| e.values[i].zip(e.errors[i]))
            .collect();

        if available.is_empty() {
            unfilled += 1;
            values.push(None);
            errors.push(None);
            continue;
        }

        let count = available.len() as f64;
        let mean = available.iter().map(|(v, _)| v).sum::<f64>() / count;
        let quad = available.iter().map(|(_, e)| e * e).sum::<f64>().sqrt();
        values.push(Some(mean));
        errors.push(Some(quad / count));
    }

    if unfilled > 0 {
        log::warn!(
            "no secondary receiver has a calibrated estimate at {unfilled} of {len} timestamps; \
             primary gaps at those timestamps cannot be filled"
        );
    }

    Ok(AveragedEstimate {
        values,
        errors,
        unfilled,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn recovers_affine_calibration() {
        // secondary = 2 * primary + 10, so primary = 0.5 * secondary - 5
        let primary: Vec<f64> = (0..10).map(f64::from).collect();
        let secondary: Vec<f64> = primary.iter().map(|p| 2.0 * p + 10.0).collect();

        let est = fit_secondary_to_primary(&some(&secondary), &some(&primary), &vec![Some(0.1); 10], &vec![Some(0.1); 10])
            .unwrap();

        let fit = est.fit.clone().unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-6, "slope {}", fit.slope);
        assert!((fit.intercept + 5.0).abs() < 1e-6, "intercept {}", fit.intercept);

        // primary[0] == 0 is fitted to ~0, which is not a valid PWV.
        assert_eq!(est.values[0], None);
        for i in 1..10 {
            assert!((est.values[i].unwrap() - primary[i]).abs() < 1e-6);
            assert!(est.errors[i].unwrap() < 1e-6);
        }
    }

    #[test]
    fn fills_held_out_primary_values() {
        let primary: Vec<f64> = (1..=20).map(f64::from).collect();
        let secondary: Vec<f64> = primary.iter().map(|p| 2.0 * p + 10.0).collect();
        let mut primary_obs = some(&primary);
        primary_obs[4] = None;
        primary_obs[11] = None;

        let est = fit_secondary_to_primary(&some(&secondary), &primary_obs, &vec![Some(0.2); 20], &vec![Some(0.1); 20])
            .unwrap();

        assert!((est.values[4].unwrap() - 5.0).abs() < 1e-6);
        assert!((est.values[11].unwrap() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn masks_stay_identical_and_positive() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.3).unwrap();

        let n = 200;
        let primary: Vec<Option<f64>> = (0..n)
            .map(|i| if i % 7 == 0 { None } else { Some(0.1 * i as f64) })
            .collect();
        let secondary: Vec<Option<f64>> = (0..n)
            .map(|i| if i % 11 == 0 { None } else { Some(1.1 * 0.1 * i as f64 - 0.5 + noise.sample(&mut rng)) })
            .collect();

        let est =
            fit_secondary_to_primary(&secondary, &primary, &vec![Some(0.3); n], &vec![Some(0.2); n]).unwrap();

        for i in 0..n {
            assert_eq!(est.values[i].is_some(), est.errors[i].is_some(), "index {i}");
            if let Some(v) = est.values[i] {
                assert!(v > 0.0);
            }
            if secondary[i].is_none() {
                assert!(est.values[i].is_none());
            }
        }

        let std = est.errors.iter().flatten().next().copied().unwrap();
        assert!(est.errors.iter().flatten().all(|&e| e == std));
    }

    #[test]
    fn missing_primary_passes_secondary_through() {
        let secondary = vec![Some(1.0), None, Some(3.0)];
        let secondary_err = vec![Some(0.1), Some(0.1), None];
        let est = fit_secondary_to_primary(&secondary, &[None; 3], &secondary_err, &[None; 3]).unwrap();

        assert_eq!(est.values, vec![Some(1.0), None, None]);
        assert_eq!(est.errors, vec![Some(0.1), None, None]);
        assert!(est.fit.is_none());
    }

    #[test]
    fn no_overlap_is_all_missing() {
        let secondary = vec![Some(1.0), None];
        let primary = vec![None, Some(2.0)];
        let est = fit_secondary_to_primary(&secondary, &primary, &[Some(0.1); 2], &[Some(0.1); 2]).unwrap();
        assert_eq!(est.available_count(), 0);
        assert!(est.fit.is_none());
    }

    #[test]
    fn zero_uncertainty_is_a_fit_failure() {
        let values = some(&[1.0, 2.0, 3.0]);
        let err = fit_secondary_to_primary(&values, &values, &[Some(0.0); 3], &[Some(0.0); 3]).unwrap_err();
        assert!(matches!(err, PwvError::FitConvergence(_)));
    }

    #[test]
    fn unfilled_counts_timestamps_without_any_secondary_estimate() {
        // The primary is present at index 1 but the secondary is not, and at
        // index 3 neither is; both are unfilled.
        let primary = vec![Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)];
        let secondary = vec![Some(1.0), None, Some(3.0), None, Some(5.0)];
        let err = |v: &[Option<f64>]| v.iter().map(|x| x.map(|_| 0.1)).collect::<Vec<_>>();

        let estimate = fit_secondary_to_primary(&secondary, &primary, &err(&secondary), &err(&primary)).unwrap();
        let avg = average_estimates(&[estimate]).unwrap();
        assert_eq!(avg.unfilled, 2);
        assert_eq!(avg.values[1], None);
        assert_eq!(avg.values[3], None);
    }

    #[test]
    fn averages_in_quadrature() {
        let a = FittedEstimate {
            values: vec![Some(2.0), Some(1.0), None],
            errors: vec![Some(0.3), Some(0.2), None],
            fit: None,
        };
        let b = FittedEstimate {
            values: vec![Some(4.0), None, None],
            errors: vec![Some(0.4), None, None],
            fit: None,
        };

        let avg = average_estimates(&[a, b]).unwrap();
        assert_eq!(avg.values, vec![Some(3.0), Some(1.0), None]);
        assert!((avg.errors[0].unwrap() - 0.25).abs() < 1e-12);
        assert!((avg.errors[1].unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(avg.errors[2], None);
        assert_eq!(avg.unfilled, 1);
    }

    #[test]
    fn averaging_rejects_ragged_estimates() {
        let a = FittedEstimate::missing(2);
        let b = FittedEstimate::missing(3);
        assert!(average_estimates(&[a, b]).is_err());
    }
}
