//! Transmission query results.

/// Transmission evaluated for one PWV value.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionSpectrum {
    /// Column label, e.g. `"4.0 mm"`.
    pub name: String,
    pub pwv: f64,
    pub wavelengths: Vec<f64>,
    pub transmission: Vec<f64>,
    /// `|T(pwv + err) - T(pwv - err)|`, present only when a PWV error was given.
    pub transmission_err: Option<Vec<f64>>,
}

impl TransmissionSpectrum {
    pub fn new(pwv: f64, wavelengths: Vec<f64>, transmission: Vec<f64>) -> Self {
        Self {
            name: pwv_label(pwv),
            pwv,
            wavelengths,
            transmission,
            transmission_err: None,
        }
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Transmission at an exact wavelength label.
    pub fn at(&self, wavelength: f64) -> Option<f64> {
        self.wavelengths
            .iter()
            .position(|&w| w == wavelength)
            .map(|i| self.transmission[i])
    }
}

/// One column per PWV value, all sharing the wavelength index.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionTable {
    pub wavelengths: Vec<f64>,
    pub columns: Vec<TransmissionSpectrum>,
}

impl TransmissionTable {
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&TransmissionSpectrum> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// `"{pwv} mm"` with the PWV rounded to four decimals.
pub fn pwv_label(pwv: f64) -> String {
    let rounded = (pwv * 1e4).round() / 1e4;
    format!("{rounded:?} mm")
}
