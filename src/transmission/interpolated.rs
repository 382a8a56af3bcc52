//! Transmission interpolated from a pre-tabulated (PWV, wavelength) grid.
//!
//! The grid is interpolated bilinearly in `(pwv_eff, wavelength)` space. Queries
//! outside the tabulated PWV range or wavelength range are `NaN`; no
//! extrapolation is attempted.

use crate::error::{PwvError, Result};
use crate::math::{GridInterpolator, bin_average_rows, is_strictly_increasing};
use crate::transmission::{PwvEffective, Transmission};

#[derive(Debug, Clone)]
pub struct InterpolatedTransmission {
    samp_pwv: Vec<f64>,
    samp_wave: Vec<f64>,
    samp_transmission: Vec<Vec<f64>>,
    pwv_effective: PwvEffective,
    grid: GridInterpolator,
}

impl InterpolatedTransmission {
    /// `samp_transmission[i][j]` is the transmission at `samp_pwv[i]` and
    /// `samp_wave[j]`. Both axes must be ascending.
    pub fn new(samp_pwv: Vec<f64>, samp_wave: Vec<f64>, samp_transmission: Vec<Vec<f64>>) -> Result<Self> {
        Self::with_pwv_effective(samp_pwv, samp_wave, samp_transmission, PwvEffective::default())
    }

    pub fn with_pwv_effective(
        samp_pwv: Vec<f64>,
        samp_wave: Vec<f64>,
        samp_transmission: Vec<Vec<f64>>,
        pwv_effective: PwvEffective,
    ) -> Result<Self> {
        if !is_strictly_increasing(&samp_wave) {
            return Err(PwvError::UnsortedWavelengths);
        }
        if !is_strictly_increasing(&samp_pwv) {
            return Err(PwvError::UnsortedPwv);
        }
        if samp_pwv.iter().any(|&p| p < 0.0) {
            return Err(PwvError::NegativePwv(samp_pwv[0]));
        }

        let grid = GridInterpolator::new(
            pwv_effective.to_effective(&samp_pwv),
            samp_wave.clone(),
            &samp_transmission,
        )?;

        Ok(Self {
            samp_pwv,
            samp_wave,
            samp_transmission,
            pwv_effective,
            grid,
        })
    }

    pub fn sample_pwv(&self) -> &[f64] {
        &self.samp_pwv
    }

    pub fn pwv_effective(&self) -> PwvEffective {
        self.pwv_effective
    }

    /// Grid with every PWV row binned to `resolution`.
    fn binned_grid(&self, resolution: f64) -> Result<GridInterpolator> {
        let (centers, rows) = bin_average_rows(&self.samp_transmission, &self.samp_wave, resolution)?;
        GridInterpolator::new(self.grid.x_axis().to_vec(), centers, &rows)
    }
}

impl Transmission for InterpolatedTransmission {
    fn sample_wavelengths(&self) -> &[f64] {
        &self.samp_wave
    }

    /// With a `resolution`, the grid is binned first and only spans the bin
    /// centres, which start half a bin inside the native range. Wavelengths
    /// closer than that to either end (the first and last native samples
    /// included) come back `NaN`.
    fn transmission_for(&self, pwv: f64, wavelengths: &[f64], resolution: Option<f64>) -> Result<Vec<f64>> {
        let pwv_eff = self.pwv_effective.to_effective(pwv);

        let binned;
        let grid = match resolution {
            Some(resolution) => {
                binned = self.binned_grid(resolution)?;
                &binned
            }
            None => &self.grid,
        };

        Ok(wavelengths.iter().map(|&w| grid.eval(pwv_eff, w)).collect())
    }
}
