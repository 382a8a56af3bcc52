//! The calling contract shared by every transmission model.
//!
//! A model only has to provide its native wavelength grid and the raw
//! transmission for a single PWV value (`transmission_for`). The provided
//! methods layer on the public contract:
//!
//! - `evaluate`: one PWV → one named spectrum (negative PWV rejected)
//! - `evaluate_many`: several PWV values → one column each, in order
//! - `evaluate_with_error`: spectrum plus `|T(pwv + σ) - T(pwv - σ)|`

use crate::error::{PwvError, Result};
use crate::transmission::{CrossSectionTransmission, InterpolatedTransmission, TransmissionSpectrum, TransmissionTable};

pub trait Transmission {
    /// Wavelengths (Å) the model is natively sampled at.
    fn sample_wavelengths(&self) -> &[f64];

    /// Transmission at `wavelengths` for `pwv`, optionally binned to
    /// `resolution` first. No sign check on `pwv`.
    fn transmission_for(&self, pwv: f64, wavelengths: &[f64], resolution: Option<f64>) -> Result<Vec<f64>>;

    fn evaluate(&self, pwv: f64, wavelengths: Option<&[f64]>, resolution: Option<f64>) -> Result<TransmissionSpectrum> {
        if pwv < 0.0 {
            return Err(PwvError::NegativePwv(pwv));
        }
        let wavelengths = wavelengths.unwrap_or(self.sample_wavelengths());
        let transmission = self.transmission_for(pwv, wavelengths, resolution)?;
        Ok(TransmissionSpectrum::new(pwv, wavelengths.to_vec(), transmission))
    }

    fn evaluate_many(
        &self,
        pwv: &[f64],
        wavelengths: Option<&[f64]>,
        resolution: Option<f64>,
    ) -> Result<TransmissionTable> {
        let wavelengths = wavelengths.unwrap_or(self.sample_wavelengths());
        let columns = pwv
            .iter()
            .map(|&p| self.evaluate(p, Some(wavelengths), resolution))
            .collect::<Result<Vec<_>>>()?;

        Ok(TransmissionTable {
            wavelengths: wavelengths.to_vec(),
            columns,
        })
    }

    /// Evaluate and, when `pwv_err` is given, attach the propagated error.
    ///
    /// The perturbed evaluations skip the negative-PWV guard so that a small
    /// PWV with a large error still yields an error estimate.
    fn evaluate_with_error(
        &self,
        pwv: f64,
        pwv_err: Option<f64>,
        wavelengths: Option<&[f64]>,
        resolution: Option<f64>,
    ) -> Result<TransmissionSpectrum> {
        let mut spectrum = self.evaluate(pwv, wavelengths, resolution)?;

        if let Some(err) = pwv_err {
            let upper = self.transmission_for(pwv + err, &spectrum.wavelengths, resolution)?;
            let lower = self.transmission_for(pwv - err, &spectrum.wavelengths, resolution)?;
            spectrum.transmission_err = Some(upper.iter().zip(&lower).map(|(u, l)| (u - l).abs()).collect());
        }

        Ok(spectrum)
    }
}

/// The closed set of transmission models.
#[derive(Debug, Clone)]
pub enum TransmissionModel {
    /// Interpolates a pre-tabulated (PWV, wavelength) grid.
    Interpolated(InterpolatedTransmission),
    /// Beer–Lambert law over per-wavelength cross sections.
    CrossSection(CrossSectionTransmission),
}

impl Transmission for TransmissionModel {
    fn sample_wavelengths(&self) -> &[f64] {
        match self {
            TransmissionModel::Interpolated(m) => m.sample_wavelengths(),
            TransmissionModel::CrossSection(m) => m.sample_wavelengths(),
        }
    }

    fn transmission_for(&self, pwv: f64, wavelengths: &[f64], resolution: Option<f64>) -> Result<Vec<f64>> {
        match self {
            TransmissionModel::Interpolated(m) => m.transmission_for(pwv, wavelengths, resolution),
            TransmissionModel::CrossSection(m) => m.transmission_for(pwv, wavelengths, resolution),
        }
    }
}

impl From<InterpolatedTransmission> for TransmissionModel {
    fn from(model: InterpolatedTransmission) -> Self {
        TransmissionModel::Interpolated(model)
    }
}

impl From<CrossSectionTransmission> for TransmissionModel {
    fn from(model: CrossSectionTransmission) -> Self {
        TransmissionModel::CrossSection(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_section_model() -> TransmissionModel {
        let wave = vec![1000.0, 1500.0, 2000.0];
        let cs = vec![1e-22, 2e-22, 3e-22];
        CrossSectionTransmission::new(wave, cs).unwrap().into()
    }

    #[test]
    fn negative_pwv_is_rejected() {
        let err = cross_section_model().evaluate(-1.0, None, None).unwrap_err();
        assert!(matches!(err, PwvError::NegativePwv(_)));
    }

    #[test]
    fn many_pwv_values_keep_their_order() {
        let table = cross_section_model().evaluate_many(&[4.0, 5.0], None, None).unwrap();
        assert_eq!(table.names(), vec!["4.0 mm", "5.0 mm"]);
        assert_eq!(table.wavelengths, vec![1000.0, 1500.0, 2000.0]);
    }

    #[test]
    fn error_column_only_when_requested() {
        let model = cross_section_model();
        assert!(model.evaluate_with_error(1.0, None, None, None).unwrap().transmission_err.is_none());

        let spectrum = model.evaluate_with_error(1.0, Some(0.5), None, None).unwrap();
        let err = spectrum.transmission_err.unwrap();
        let upper = model.transmission_for(1.5, &spectrum.wavelengths, None).unwrap();
        let lower = model.transmission_for(0.5, &spectrum.wavelengths, None).unwrap();
        for i in 0..err.len() {
            assert!((err[i] - (upper[i] - lower[i]).abs()).abs() < 1e-15);
        }
    }

    #[test]
    fn error_propagation_bypasses_sign_guard() {
        // pwv - err < 0 must still evaluate.
        let spectrum = cross_section_model()
            .evaluate_with_error(0.1, Some(0.5), None, None)
            .unwrap();
        assert!(spectrum.transmission_err.unwrap().iter().all(|v| v.is_finite()));
    }
}
