//! Model tables in and transmission spectra out.
//!
//! - cross sections: `wavelength,cross_section`
//! - transmission grid: `pwv,<wavelength>,<wavelength>,...` (one row per PWV)
//! - spectra: `wavelength,<name>[,transmission_err]`

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PwvError, Result};
use crate::transmission::{CrossSectionTransmission, InterpolatedTransmission, TransmissionSpectrum, TransmissionTable};

#[derive(Debug, Deserialize)]
struct CrossSectionRow {
    wavelength: f64,
    cross_section: f64,
}

pub fn read_cross_sections(path: &Path) -> Result<CrossSectionTransmission> {
    let file = File::open(path).map_err(|e| PwvError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut wavelengths = Vec::new();
    let mut cross_sections = Vec::new();
    for row in reader.deserialize() {
        let row: CrossSectionRow = row.map_err(|e| PwvError::csv(path, e))?;
        wavelengths.push(row.wavelength);
        cross_sections.push(row.cross_section);
    }

    CrossSectionTransmission::new(wavelengths, cross_sections)
}

pub fn read_transmission_grid(path: &Path) -> Result<InterpolatedTransmission> {
    let file = File::open(path).map_err(|e| PwvError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers = reader.headers().map_err(|e| PwvError::csv(path, e))?.clone();
    let wavelengths = headers
        .iter()
        .skip(1)
        .map(|h| parse_cell(h, path, "wavelength header"))
        .collect::<Result<Vec<f64>>>()?;

    let mut pwv = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PwvError::csv(path, e))?;
        let mut cells = record.iter().map(|c| parse_cell(c, path, "transmission cell"));
        let Some(first) = cells.next() else { continue };
        pwv.push(first?);
        rows.push(cells.collect::<Result<Vec<f64>>>()?);
    }

    InterpolatedTransmission::new(pwv, wavelengths, rows)
}

pub fn write_spectrum(path: &Path, spectrum: &TransmissionSpectrum) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PwvError::csv(path, e))?;

    let mut header = vec!["wavelength".to_string(), spectrum.name.clone()];
    if spectrum.transmission_err.is_some() {
        header.push("transmission_err".into());
    }
    writer.write_record(&header).map_err(|e| PwvError::csv(path, e))?;

    for (i, (w, t)) in spectrum.wavelengths.iter().zip(&spectrum.transmission).enumerate() {
        let mut row = vec![w.to_string(), t.to_string()];
        if let Some(err) = &spectrum.transmission_err {
            row.push(err[i].to_string());
        }
        writer.write_record(&row).map_err(|e| PwvError::csv(path, e))?;
    }

    writer.flush().map_err(|e| PwvError::io(path, e))
}

pub fn write_table(path: &Path, table: &TransmissionTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PwvError::csv(path, e))?;

    let header = std::iter::once("wavelength").chain(table.names());
    writer.write_record(header).map_err(|e| PwvError::csv(path, e))?;

    for (i, w) in table.wavelengths.iter().enumerate() {
        let row = std::iter::once(w.to_string()).chain(table.columns.iter().map(|c| c.transmission[i].to_string()));
        writer.write_record(row).map_err(|e| PwvError::csv(path, e))?;
    }

    writer.flush().map_err(|e| PwvError::io(path, e))
}

fn parse_cell(cell: &str, path: &Path, what: &str) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| {
        PwvError::MalformedDimensions(format!("{}: invalid {what} '{cell}'", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::transmission::Transmission;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pwv-atm-{}-{name}", std::process::id()))
    }

    #[test]
    fn reads_cross_sections() {
        let path = temp_path("cs.csv");
        fs::write(&path, "wavelength,cross_section\n7000,1e-23\n7001,2e-23\n").unwrap();
        let model = read_cross_sections(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(model.sample_wavelengths(), &[7000.0, 7001.0]);
        assert_eq!(model.cross_sections(), &[1e-23, 2e-23]);
    }

    #[test]
    fn reads_transmission_grid() {
        let path = temp_path("grid.csv");
        fs::write(&path, "pwv,7000,7001\n0,1,1\n2,0.5,0.4\n4,0.2,0.1\n").unwrap();
        let model = read_transmission_grid(&path).unwrap();
        fs::remove_file(&path).ok();

        let spectrum = model.evaluate(2.0, None, None).unwrap();
        assert_eq!(spectrum.transmission, vec![0.5, 0.4]);
    }

    #[test]
    fn spectrum_csv_has_error_column_when_present() {
        let path = temp_path("spectrum.csv");
        let mut spectrum = TransmissionSpectrum::new(4.0, vec![7000.0, 7001.0], vec![0.9, 0.8]);
        spectrum.transmission_err = Some(vec![0.01, 0.02]);

        write_spectrum(&path, &spectrum).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("wavelength,4.0 mm,transmission_err"));
        assert_eq!(lines.next(), Some("7000,0.9,0.01"));
    }
}
