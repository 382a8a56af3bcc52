//! Line-of-sight PWV ⇄ effective PWV.
//!
//! ```text
//! pwv_eff = (pwv_los / norm_pwv) ^ exponent
//! pwv_los = norm_pwv * pwv_eff ^ (1 / exponent)
//! ```
//!
//! Absorption responds non-linearly to PWV; tabulated transmission is much
//! closer to linear in `pwv_eff`, so table models interpolate in that space.
//! Negative `pwv_los` has no real image for a fractional exponent (`NaN`).

use serde::{Deserialize, Serialize};

pub const DEFAULT_NORM_PWV: f64 = 2.0;
pub const DEFAULT_EXPONENT: f64 = 0.6;

/// Scalar or element-wise application of a PWV mapping.
pub trait PwvValues {
    type Output;

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> Self::Output;
}

impl PwvValues for f64 {
    type Output = f64;

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> f64 {
        f(self)
    }
}

impl PwvValues for &[f64] {
    type Output = Vec<f64>;

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> Vec<f64> {
        self.iter().map(|&v| f(v)).collect()
    }
}

impl PwvValues for &Vec<f64> {
    type Output = Vec<f64>;

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> Vec<f64> {
        self.as_slice().map_pwv(f)
    }
}

impl PwvValues for Vec<f64> {
    type Output = Vec<f64>;

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> Vec<f64> {
        self.into_iter().map(f).collect()
    }
}

impl<const N: usize> PwvValues for [f64; N] {
    type Output = [f64; N];

    fn map_pwv(self, f: impl Fn(f64) -> f64) -> [f64; N] {
        self.map(f)
    }
}

/// Parameters of the effective-PWV power law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PwvEffective {
    /// Line-of-sight PWV (mm) that maps onto an effective PWV of one.
    pub norm_pwv: f64,
    pub exponent: f64,
}

impl Default for PwvEffective {
    fn default() -> Self {
        Self {
            norm_pwv: DEFAULT_NORM_PWV,
            exponent: DEFAULT_EXPONENT,
        }
    }
}

impl PwvEffective {
    pub fn to_effective<T: PwvValues>(&self, pwv_los: T) -> T::Output {
        calc_pwv_eff(pwv_los, self.norm_pwv, self.exponent)
    }

    pub fn to_line_of_sight<T: PwvValues>(&self, pwv_eff: T) -> T::Output {
        calc_pwv_los(pwv_eff, self.norm_pwv, self.exponent)
    }
}

/// Convert line-of-sight PWV to effective PWV.
pub fn calc_pwv_eff<T: PwvValues>(pwv_los: T, norm_pwv: f64, exponent: f64) -> T::Output {
    pwv_los.map_pwv(|p| (p / norm_pwv).powf(exponent))
}

/// Convert effective PWV back to line-of-sight PWV.
pub fn calc_pwv_los<T: PwvValues>(pwv_eff: T, norm_pwv: f64, exponent: f64) -> T::Output {
    pwv_eff.map_pwv(|p| norm_pwv * p.powf(1.0 / exponent))
}

/// `calc_pwv_eff` with the default normalization and exponent.
pub fn pwv_eff<T: PwvValues>(pwv_los: T) -> T::Output {
    calc_pwv_eff(pwv_los, DEFAULT_NORM_PWV, DEFAULT_EXPONENT)
}

/// `calc_pwv_los` with the default normalization and exponent.
pub fn pwv_los<T: PwvValues>(pwv_eff: T) -> T::Output {
    calc_pwv_los(pwv_eff, DEFAULT_NORM_PWV, DEFAULT_EXPONENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parameters_are_identity() {
        assert_eq!(calc_pwv_eff(16.0, 1.0, 1.0), 16.0);
    }

    #[test]
    fn default_normalization_maps_two_mm_to_one() {
        assert_eq!(pwv_eff(2.0), 1.0);
    }

    #[test]
    fn inverse_round_trips() {
        for x in [0.01, 0.5, 1.0, 2.0, 4.0, 13.7, 30.0] {
            let back = pwv_los(pwv_eff(x));
            assert!((back - x).abs() < 1e-12 * x.max(1.0), "{x} -> {back}");
        }
    }

    #[test]
    fn arrays_match_scalar_results() {
        let expected = [pwv_eff(1.0), pwv_eff(2.0)];
        assert_eq!(pwv_eff([1.0, 2.0]), expected);
        assert_eq!(pwv_eff(vec![1.0, 2.0]), expected.to_vec());
        assert_eq!(pwv_los(&[1.0, 2.0][..]), vec![pwv_los(1.0), pwv_los(2.0)]);
    }

    #[test]
    fn negative_pwv_has_no_effective_value() {
        assert!(pwv_eff(-1.0).is_nan());
    }

    #[test]
    fn struct_uses_its_own_parameters() {
        let params = PwvEffective {
            norm_pwv: 4.0,
            exponent: 0.5,
        };
        assert!((params.to_effective(16.0) - 2.0).abs() < 1e-12);
        assert!((params.to_line_of_sight(2.0) - 16.0).abs() < 1e-12);
    }
}
