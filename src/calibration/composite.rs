//! Building the composite PWV series from a primary receiver and its
//! secondaries.
//!
//! Pipeline (`update_composite_series`):
//!
//! 1) apply each receiver's data cuts
//! 2) align all receivers on one time grid
//! 3) calibrate every secondary against the primary and average the estimates
//! 4) fill primary gaps with the average, drop what is still missing
//! 5) round to instrument precision (3 decimals); a filled sample that rounds
//!    to zero is dropped too

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::calibration::{average_estimates, fit_secondary_to_primary};
use crate::domain::{CalendarQuery, CompositeRecord, CompositeSeries, MeasurementSeries, ReceiverId, SiteConfig};
use crate::error::{PwvError, Result};

/// Decimal places kept in the composite series.
pub const PWV_DECIMALS: i32 = 3;

/// One receiver's samples on the shared time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedColumn {
    pub receiver: ReceiverId,
    pub values: Vec<Option<f64>>,
    pub errors: Vec<Option<f64>>,
}

/// Several receivers outer-joined on timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMeasurements {
    pub dates: Vec<DateTime<Utc>>,
    pub columns: Vec<AlignedColumn>,
}

impl AlignedMeasurements {
    pub fn column(&self, receiver: &ReceiverId) -> Option<&AlignedColumn> {
        self.columns.iter().find(|c| &c.receiver == receiver)
    }

    /// Timestamps whose UTC date matches every given calendar component,
    /// with every column kept in its original order.
    pub fn select(&self, year: Option<i32>, month: Option<u32>, day: Option<u32>, hour: Option<u32>) -> Result<Self> {
        let query = CalendarQuery::new(year, month, day, hour)?;
        let keep: Vec<usize> = (0..self.dates.len()).filter(|&i| query.matches(&self.dates[i])).collect();

        let columns = self
            .columns
            .iter()
            .map(|c| AlignedColumn {
                receiver: c.receiver.clone(),
                values: keep.iter().map(|&i| c.values[i]).collect(),
                errors: keep.iter().map(|&i| c.errors[i]).collect(),
            })
            .collect();

        Ok(Self {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            columns,
        })
    }
}

/// Outer-join `series` on date; a receiver without a sample at some date gets
/// an explicit missing entry there.
pub fn align_receivers(series: &[&MeasurementSeries]) -> Result<AlignedMeasurements> {
    let mut seen = BTreeSet::new();
    for s in series {
        if !seen.insert(&s.receiver) {
            return Err(PwvError::MalformedDimensions(format!(
                "receiver {} appears more than once",
                s.receiver
            )));
        }
    }

    let dates: Vec<DateTime<Utc>> = series
        .iter()
        .flat_map(|s| s.records().iter().map(|m| m.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|s| {
            let mut values = vec![None; dates.len()];
            let mut errors = vec![None; dates.len()];
            // Both sides are sorted, so a single forward walk suffices.
            let mut k = 0;
            for m in s.records() {
                while dates[k] < m.date {
                    k += 1;
                }
                values[k] = m.value;
                errors[k] = m.value_err;
            }
            AlignedColumn {
                receiver: s.receiver.clone(),
                values,
                errors,
            }
        })
        .collect();

    Ok(AlignedMeasurements { dates, columns })
}

/// Gap-fill `primary` from `secondaries` on the aligned grid.
pub fn build_composite(
    dates: &[DateTime<Utc>],
    primary: &AlignedColumn,
    secondaries: &[&AlignedColumn],
) -> Result<CompositeSeries> {
    let primary_at = |i: usize| primary.values[i].zip(primary.errors[i]);

    if secondaries.is_empty() {
        let records = (0..dates.len())
            .filter_map(|i| primary_at(i).map(|(pwv, err)| record(dates[i], pwv, err)))
            .collect();
        return Ok(CompositeSeries::new(records));
    }

    let mut estimates = Vec::with_capacity(secondaries.len());
    for secondary in secondaries {
        let estimate =
            fit_secondary_to_primary(&secondary.values, &primary.values, &secondary.errors, &primary.errors)?;

        match &estimate.fit {
            Some(fit) if !fit.stop_reason.is_converged() => log::warn!(
                "{} -> {}: calibration did not converge ({} after {} iterations); \
                 applying pwv = {:.4} * x + {:.4} anyway",
                secondary.receiver,
                primary.receiver,
                fit.stop_reason,
                fit.iterations,
                fit.slope,
                fit.intercept
            ),
            Some(fit) => log::info!(
                "{} -> {}: pwv = {:.4} * x + {:.4} ({}, {} iterations)",
                secondary.receiver,
                primary.receiver,
                fit.slope,
                fit.intercept,
                fit.stop_reason,
                fit.iterations
            ),
            None if estimate.available_count() == 0 => log::warn!(
                "{} shares no samples with primary receiver {}; it cannot fill any gaps",
                secondary.receiver,
                primary.receiver
            ),
            None => log::debug!(
                "primary receiver {} has no data; using {} as is",
                primary.receiver,
                secondary.receiver
            ),
        }
        estimates.push(estimate);
    }

    let average = average_estimates(&estimates)?;

    let mut filled = 0usize;
    let mut dropped = 0usize;
    let records: Vec<CompositeRecord> = (0..dates.len())
        .filter_map(|i| match primary_at(i) {
            Some((pwv, err)) => Some(record(dates[i], pwv, err)),
            None => {
                let Some((pwv, err)) = average.values[i].zip(average.errors[i]) else {
                    dropped += 1;
                    return None;
                };
                let row = record(dates[i], pwv, err);
                if row.pwv <= 0.0 {
                    dropped += 1;
                    return None;
                }
                filled += 1;
                Some(row)
            }
        })
        .collect();

    log::debug!(
        "filled {filled} primary gaps from {} secondaries, {dropped} left unfilled",
        secondaries.len()
    );
    Ok(CompositeSeries::new(records))
}

/// Produce the composite PWV series for the site described by `config`.
///
/// `secondaries` may omit configured receivers (they are skipped with a
/// warning) but must not include receivers foreign to the site.
pub fn update_composite_series(
    config: &SiteConfig,
    primary: &MeasurementSeries,
    secondaries: &[MeasurementSeries],
) -> Result<CompositeSeries> {
    if primary.receiver != config.primary {
        return Err(PwvError::InvalidConfig(format!(
            "expected primary receiver {}, got {}",
            config.primary, primary.receiver
        )));
    }
    if let Some(s) = secondaries.iter().find(|s| !config.secondaries.contains(&s.receiver)) {
        return Err(PwvError::InvalidConfig(format!(
            "{} is not a secondary receiver of site {}",
            s.receiver, config.site_name
        )));
    }
    for id in &config.secondaries {
        if !secondaries.iter().any(|s| &s.receiver == id) {
            log::warn!("no measurements supplied for secondary receiver {id}; skipping");
        }
    }

    let cut_primary = primary.apply_cuts(config.cuts_for(&primary.receiver));
    let cut_secondaries: Vec<MeasurementSeries> = secondaries
        .iter()
        .map(|s| s.apply_cuts(config.cuts_for(&s.receiver)))
        .collect();

    let mut all = vec![&cut_primary];
    all.extend(&cut_secondaries);
    let aligned = align_receivers(&all)?;

    let (primary_column, secondary_columns) = aligned
        .columns
        .split_first()
        .ok_or_else(|| PwvError::MalformedDimensions("no receivers to align".into()))?;
    let secondary_columns: Vec<&AlignedColumn> = secondary_columns.iter().collect();

    let composite = build_composite(&aligned.dates, primary_column, &secondary_columns)?;
    log::info!(
        "{}: composite series has {} rows ({} aligned timestamps)",
        config.site_name,
        composite.len(),
        aligned.dates.len()
    );
    Ok(composite)
}

fn record(date: DateTime<Utc>, pwv: f64, pwv_err: f64) -> CompositeRecord {
    CompositeRecord {
        date,
        pwv: round_to(pwv, PWV_DECIMALS),
        pwv_err: round_to(pwv_err, PWV_DECIMALS),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
