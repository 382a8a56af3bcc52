//! PWV at an arbitrary date and airmass.
//!
//! The composite series is interpolated linearly in absolute time. A query is
//! only answered when it lies inside the series and no further than
//! `max_gap_secs` from the nearest sample, so long receiver blackouts are
//! never bridged.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{CompositeSeries, SiteConfig, epoch_seconds};
use crate::error::{PwvError, Result};
use crate::math::interp;
use crate::transmission::{Transmission, TransmissionSpectrum};

/// Empirical power of the airmass scaling of zenith PWV.
pub const AIRMASS_EXPONENT: f64 = 0.6;

/// PWV along the line of sight with its uncertainty (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOfSightPwv {
    pub pwv: f64,
    pub pwv_err: f64,
}

/// Interpolate `series` at `date` and scale to `airmass`.
pub fn pwv_at(date: DateTime<Utc>, airmass: f64, series: &CompositeSeries, max_gap_secs: f64) -> Result<LineOfSightPwv> {
    pwv_at_timestamp(epoch_seconds(&date), airmass, series, max_gap_secs)
}

/// `pwv_at` for a Unix timestamp in seconds.
pub fn pwv_at_timestamp(
    timestamp: f64,
    airmass: f64,
    series: &CompositeSeries,
    max_gap_secs: f64,
) -> Result<LineOfSightPwv> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(PwvError::EmptySeries);
    };

    let times = series.timestamps();
    let (t_first, t_last) = (times[0], times[times.len() - 1]);
    if !(timestamp >= t_first && timestamp <= t_last) {
        return Err(PwvError::DateOutOfRange {
            date: format_timestamp(timestamp),
            first: first.date.to_rfc3339(),
            last: last.date.to_rfc3339(),
        });
    }

    let distance = nearest_sample_distance(&times, timestamp);
    if distance > max_gap_secs {
        return Err(PwvError::DataGap {
            date: format_timestamp(timestamp),
            distance_secs: distance,
            max_gap_secs,
        });
    }

    let scale = airmass.powf(AIRMASS_EXPONENT);
    let pwv = interp(timestamp, &times, &series.pwv());
    let pwv_err = interp(timestamp, &times, &series.pwv_err());

    Ok(LineOfSightPwv {
        pwv: pwv * scale,
        pwv_err: pwv_err * scale,
    })
}

/// Transmission (with its propagated error) for the PWV modelled at `date`.
pub fn transmission_for_date<M: Transmission>(
    model: &M,
    series: &CompositeSeries,
    config: &SiteConfig,
    date: DateTime<Utc>,
    airmass: f64,
    wavelengths: Option<&[f64]>,
    resolution: Option<f64>,
) -> Result<TransmissionSpectrum> {
    let los = pwv_at(date, airmass, series, config.max_gap_secs)?;
    log::debug!("{date}: line-of-sight pwv {:.3} ± {:.3} mm", los.pwv, los.pwv_err);
    model.evaluate_with_error(los.pwv, Some(los.pwv_err), wavelengths, resolution)
}

/// Distance to the closest of the samples bracketing `t` (`times` sorted).
fn nearest_sample_distance(times: &[f64], t: f64) -> f64 {
    let i = times.partition_point(|&v| v < t);
    let after = times.get(i).map_or(f64::INFINITY, |&v| v - t);
    let before = i.checked_sub(1).map_or(f64::INFINITY, |j| t - times[j]);
    after.min(before)
}

fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match Utc.timestamp_opt(secs as i64, nanos).single() {
        Some(date) => date.to_rfc3339(),
        None => format!("{timestamp} s"),
    }
}
