//! CSV persistence for measurement and composite series.
//!
//! Both files share the header `date,pwv,pwv_err`; dates are RFC 3339 and a
//! blank cell in a measurement file means "missing".

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{CompositeRecord, CompositeSeries, Measurement, MeasurementSeries, ReceiverId};
use crate::error::{PwvError, Result};

/// Read one receiver's measurements.
///
/// Rows are sorted by date. Repeated identical rows collapse into one; dates
/// reported with conflicting values are dropped entirely.
pub fn read_measurements(path: &Path, receiver: ReceiverId) -> Result<MeasurementSeries> {
    let mut records: Vec<Measurement> = read_rows(path)?;
    records.sort_by_key(|m| m.date);
    records.dedup();

    let mut unique = Vec::with_capacity(records.len());
    let mut conflicts = 0usize;
    for group in records.chunk_by(|a, b| a.date == b.date) {
        if let [only] = group {
            unique.push(*only);
        } else {
            conflicts += 1;
        }
    }
    if conflicts > 0 {
        log::warn!("{receiver}: dropped {conflicts} dates with contradictory measurements");
    }

    MeasurementSeries::new(receiver, unique)
}

pub fn write_measurements(path: &Path, series: &MeasurementSeries) -> Result<()> {
    write_rows(path, series.records())
}

/// Read a composite series. Negative rows are dropped on load.
pub fn read_composite(path: &Path) -> Result<CompositeSeries> {
    let records: Vec<CompositeRecord> = read_rows(path)?;
    let n = records.len();
    let series = CompositeSeries::new(records);
    if series.len() < n {
        log::warn!("{}: dropped {} invalid rows", path.display(), n - series.len());
    }
    Ok(series)
}

pub fn write_composite(path: &Path, series: &CompositeSeries) -> Result<()> {
    write_rows(path, series.records())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| PwvError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| PwvError::csv(path, e))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PwvError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| PwvError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PwvError::io(path, e))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pwv-atm-{}-{name}", std::process::id()))
    }

    #[test]
    fn blank_cells_are_missing() {
        let path = temp_path("kitt.csv");
        fs::write(
            &path,
            "date,pwv,pwv_err\n\
             2020-01-01T00:30:00Z,2.5,0.1\n\
             2020-01-01T00:00:00Z,,\n",
        )
        .unwrap();

        let series = read_measurements(&path, ReceiverId::new("kitt")).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[0].value, None);
        assert_eq!(series.records()[1].value, Some(2.5));
        assert_eq!(series.present_count(), 1);
    }

    #[test]
    fn composite_survives_a_file() {
        let path = temp_path("composite.csv");
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = CompositeSeries::new(vec![CompositeRecord { date, pwv: 1.234, pwv_err: 0.05 }]);

        write_composite(&path, &series).unwrap();
        let back = read_composite(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(back, series);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_composite(Path::new("/nonexistent/pwv.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pwv.csv"));
        assert_eq!(err.exit_code(), 2);
    }
}
