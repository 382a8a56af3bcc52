//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the calibration/transmission code stays free of presentation
//! - output changes are localized

use chrono::{DateTime, Utc};

use crate::calibration::AlignedMeasurements;
use crate::domain::{CompositeSeries, SiteConfig};
use crate::pwv::LineOfSightPwv;
use crate::transmission::{TransmissionSpectrum, TransmissionTable};

/// Summary printed after `pwv model`.
pub fn format_composite_summary(config: &SiteConfig, series: &CompositeSeries) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== pwv - composite model ({}) ===\n", config.site_name));
    out.push_str(&format!("Primary: {}\n", config.primary));
    let secondaries: Vec<&str> = config.secondaries.iter().map(|s| s.as_str()).collect();
    out.push_str(&format!(
        "Secondaries: {}\n",
        if secondaries.is_empty() { "-".to_string() } else { secondaries.join(", ") }
    ));

    match (series.first(), series.last()) {
        (Some(first), Some(last)) => {
            let pwv = series.pwv();
            let (lo, hi) = pwv
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
            out.push_str(&format!("Rows: {}\n", series.len()));
            out.push_str(&format!("Span: {} .. {}\n", first.date.to_rfc3339(), last.date.to_rfc3339()));
            out.push_str(&format!("PWV: [{lo:.3}, {hi:.3}] mm"));
        }
        _ => out.push_str("Rows: 0"),
    }

    out
}

pub fn format_composite_rows(series: &CompositeSeries) -> String {
    let mut out = format!("{:<26} {:>8} {:>8}", "date", "pwv", "pwv_err");
    for r in series.records() {
        out.push_str(&format!("\n{:<26} {:>8.3} {:>8.3}", r.date.to_rfc3339(), r.pwv, r.pwv_err));
    }
    out
}

/// Per-receiver measurements, one `<ID> <ID>_err` column pair per receiver.
/// Missing samples print as `-`.
pub fn format_measured_rows(measured: &AlignedMeasurements) -> String {
    let mut out = format!("{:<26}", "date");
    for column in &measured.columns {
        out.push_str(&format!(" {:>8} {:>8}", column.receiver.as_str(), format!("{}_err", column.receiver)));
    }

    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
    for (i, date) in measured.dates.iter().enumerate() {
        out.push_str(&format!("\n{:<26}", date.to_rfc3339()));
        for column in &measured.columns {
            out.push_str(&format!(" {:>8} {:>8}", cell(column.values[i]), cell(column.errors[i])));
        }
    }
    out
}

pub fn format_line_of_sight(date: DateTime<Utc>, airmass: f64, los: &LineOfSightPwv) -> String {
    format!(
        "{} airmass={airmass:.3}: pwv = {:.3} ± {:.3} mm",
        date.to_rfc3339(),
        los.pwv,
        los.pwv_err
    )
}

pub fn format_spectrum(spectrum: &TransmissionSpectrum) -> String {
    let mut out = format!("{:>12} {:>12}", "wavelength", spectrum.name);
    if spectrum.transmission_err.is_some() {
        out.push_str(&format!(" {:>12}", "err"));
    }

    for (i, (w, t)) in spectrum.wavelengths.iter().zip(&spectrum.transmission).enumerate() {
        out.push_str(&format!("\n{w:>12.2} {t:>12.6}"));
        if let Some(err) = &spectrum.transmission_err {
            out.push_str(&format!(" {:>12.6}", err[i]));
        }
    }
    out
}

pub fn format_table(table: &TransmissionTable) -> String {
    let mut out = format!("{:>12}", "wavelength");
    for name in table.names() {
        out.push_str(&format!(" {name:>12}"));
    }

    for (i, w) in table.wavelengths.iter().enumerate() {
        out.push_str(&format!("\n{w:>12.2}"));
        for column in &table.columns {
            out.push_str(&format!(" {:>12.6}", column.transmission[i]));
        }
    }
    out
}
