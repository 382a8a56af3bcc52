//! Beer–Lambert transmission from per-wavelength H2O cross sections.
//!
//! ```text
//! τ(λ) = pwv · σ(λ) · K
//! T(λ) = exp(-τ(λ))
//! ```
//!
//! `K` converts millimetres of precipitable water times a cross section in cm²
//! into a dimensionless optical depth (molecules per cm² per mm of water).

use serde::{Deserialize, Serialize};

use crate::error::{PwvError, Result};
use crate::math::{bin_average, interp_all, is_non_decreasing};
use crate::transmission::Transmission;

pub const AVOGADRO: f64 = 6.02214129e23;
/// g / mol
pub const H2O_MOLAR_MASS: f64 = 18.0152;
/// g / cm³
pub const H2O_DENSITY: f64 = 0.99997;
pub const MM_PER_CM: f64 = 10.0;

/// Number of H2O molecules per cm² for one millimetre of PWV.
pub const NUM_DENSITY_CONVERSION: f64 = AVOGADRO * H2O_DENSITY / (H2O_MOLAR_MASS * MM_PER_CM);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionTransmission {
    wavelengths: Vec<f64>,
    cross_sections: Vec<f64>,
}

impl CrossSectionTransmission {
    /// `wavelengths` in Å (ascending), `cross_sections` in cm².
    pub fn new(wavelengths: Vec<f64>, cross_sections: Vec<f64>) -> Result<Self> {
        if wavelengths.len() != cross_sections.len() {
            return Err(PwvError::MalformedDimensions(format!(
                "{} cross sections for {} wavelengths",
                cross_sections.len(),
                wavelengths.len()
            )));
        }
        if wavelengths.is_empty() {
            return Err(PwvError::MalformedDimensions("cross-section table is empty".into()));
        }
        if !is_non_decreasing(&wavelengths) {
            return Err(PwvError::UnsortedWavelengths);
        }
        if cross_sections.iter().any(|&cs| cs < 0.0) {
            return Err(PwvError::NegativeCrossSection);
        }

        Ok(Self {
            wavelengths,
            cross_sections,
        })
    }

    pub fn cross_sections(&self) -> &[f64] {
        &self.cross_sections
    }

    /// Transmission on the native wavelength grid.
    pub fn native_transmission(&self, pwv: f64) -> Vec<f64> {
        self.cross_sections
            .iter()
            .map(|&cs| (-pwv * cs * NUM_DENSITY_CONVERSION).exp())
            .collect()
    }
}

impl Transmission for CrossSectionTransmission {
    fn sample_wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    fn transmission_for(&self, pwv: f64, wavelengths: &[f64], resolution: Option<f64>) -> Result<Vec<f64>> {
        let native = self.native_transmission(pwv);

        match resolution {
            Some(resolution) => {
                let binned = bin_average(&native, &self.wavelengths, resolution)?;
                Ok(interp_all(wavelengths, &binned.wavelengths, &binned.values))
            }
            None => Ok(interp_all(wavelengths, &self.wavelengths, &native)),
        }
    }
}
