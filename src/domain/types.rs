//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - aligned and fitted in-memory
//! - exported to CSV
//! - reloaded later for date interpolation

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PwvError, Result};

/// A GPS receiver identifier, e.g. `KITT`.
///
/// Stored upper-case; `ReceiverId::new` normalizes the case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiverId(String);

impl ReceiverId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds(date: &DateTime<Utc>) -> f64 {
    date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) * 1e-9
}

/// One receiver sample. Missing values stay in the series as `None` so every
/// receiver can share a common time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub date: DateTime<Utc>,
    #[serde(rename = "pwv")]
    pub value: Option<f64>,
    #[serde(rename = "pwv_err")]
    pub value_err: Option<f64>,
}

impl Measurement {
    pub fn new(date: DateTime<Utc>, value: Option<f64>, value_err: Option<f64>) -> Self {
        Self { date, value, value_err }
    }

    pub fn missing(date: DateTime<Utc>) -> Self {
        Self::new(date, None, None)
    }

    /// Value and error are both present.
    pub fn is_present(&self) -> bool {
        self.value.is_some() && self.value_err.is_some()
    }
}

/// The time series reported by one receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    pub receiver: ReceiverId,
    records: Vec<Measurement>,
}

impl MeasurementSeries {
    /// Fails with `MalformedDimensions` unless dates strictly increase.
    pub fn new(receiver: ReceiverId, records: Vec<Measurement>) -> Result<Self> {
        if let Some(pair) = records.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(PwvError::MalformedDimensions(format!(
                "{receiver}: timestamps must strictly increase ({} then {})",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { receiver, records })
    }

    pub fn records(&self) -> &[Measurement] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of samples with both a value and an error.
    pub fn present_count(&self) -> usize {
        self.records.iter().filter(|m| m.is_present()).count()
    }

    /// Mark samples excluded by `cuts` as missing; the time grid is kept.
    pub fn apply_cuts(&self, cuts: &[DataCut]) -> Self {
        let records = self
            .records
            .iter()
            .map(|m| {
                if cuts.iter().all(|cut| cut.keeps(m)) {
                    *m
                } else {
                    Measurement::missing(m.date)
                }
            })
            .collect();

        Self {
            receiver: self.receiver.clone(),
            records,
        }
    }
}

/// Which quantity a data cut applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutParam {
    /// Exclusive: samples dated inside `[start, end]` are removed.
    Date,
    /// Inclusive: only values inside `[start, end]` are kept.
    Pwv,
    /// Inclusive, applied to the measurement error.
    PwvErr,
}

/// A user-defined inclusion/exclusion range for one receiver.
///
/// `Date` bounds are epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataCut {
    pub param: CutParam,
    pub start: f64,
    pub end: f64,
}

impl DataCut {
    pub fn new(param: CutParam, start: f64, end: f64) -> Self {
        Self { param, start, end }
    }

    pub fn between_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(CutParam::Date, epoch_seconds(&start), epoch_seconds(&end))
    }

    fn inside(&self, x: f64) -> bool {
        self.start <= x && x <= self.end
    }

    /// Whether `m` survives this cut.
    pub fn keeps(&self, m: &Measurement) -> bool {
        match self.param {
            CutParam::Date => !self.inside(epoch_seconds(&m.date)),
            CutParam::Pwv => m.value.is_some_and(|v| self.inside(v)),
            CutParam::PwvErr => m.value_err.is_some_and(|v| self.inside(v)),
        }
    }
}

/// One row of the modelled PWV series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    pub date: DateTime<Utc>,
    pub pwv: f64,
    pub pwv_err: f64,
}

/// The single gap-filled PWV series used for date queries.
///
/// Rows are sorted by date and never carry a negative PWV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeSeries {
    records: Vec<CompositeRecord>,
}

impl CompositeSeries {
    /// Sorts by date and drops rows with negative or non-finite PWV.
    pub fn new(mut records: Vec<CompositeRecord>) -> Self {
        records.retain(|r| r.pwv.is_finite() && r.pwv >= 0.0 && r.pwv_err.is_finite());
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[CompositeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&CompositeRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&CompositeRecord> {
        self.records.last()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.records.iter().map(|r| epoch_seconds(&r.date)).collect()
    }

    pub fn pwv(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.pwv).collect()
    }

    pub fn pwv_err(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.pwv_err).collect()
    }

    /// Rows whose UTC date matches every given calendar component.
    pub fn select(&self, year: Option<i32>, month: Option<u32>, day: Option<u32>, hour: Option<u32>) -> Result<Self> {
        let query = CalendarQuery::new(year, month, day, hour)?;
        let records = self.records.iter().filter(|r| query.matches(&r.date)).copied().collect();
        Ok(Self { records })
    }
}

/// Optional UTC calendar components used to narrow a table by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
}

impl CalendarQuery {
    pub fn new(year: Option<i32>, month: Option<u32>, day: Option<u32>, hour: Option<u32>) -> Result<Self> {
        if let Some(m) = month.filter(|m| !(1..=12).contains(m)) {
            return Err(PwvError::InvalidDate(format!("month {m} is not in 1..=12")));
        }
        if let Some(d) = day.filter(|d| !(1..=31).contains(d)) {
            return Err(PwvError::InvalidDate(format!("day {d} is not in 1..=31")));
        }
        if let Some(h) = hour.filter(|h| *h > 23) {
            return Err(PwvError::InvalidDate(format!("hour {h} is not in 0..=23")));
        }
        Ok(Self { year, month, day, hour })
    }

    pub fn matches(&self, date: &DateTime<Utc>) -> bool {
        self.year.is_none_or(|y| date.year() == y)
            && self.month.is_none_or(|m| date.month() == m)
            && self.day.is_none_or(|d| date.day() == d)
            && self.hour.is_none_or(|h| date.hour() == h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn receiver_ids_are_upper_case() {
        assert_eq!(ReceiverId::new(" kitt ").as_str(), "KITT");
    }

    #[test]
    fn series_requires_increasing_dates() {
        let records = vec![Measurement::missing(at(2)), Measurement::missing(at(1))];
        assert!(matches!(
            MeasurementSeries::new(ReceiverId::new("KITT"), records),
            Err(PwvError::MalformedDimensions(_))
        ));

        let records = vec![Measurement::missing(at(1)), Measurement::missing(at(1))];
        assert!(MeasurementSeries::new(ReceiverId::new("KITT"), records).is_err());
    }

    #[test]
    fn date_cuts_are_exclusive_and_value_cuts_inclusive() {
        let records = (0..5)
            .map(|h| Measurement::new(at(h), Some(h as f64), Some(0.1)))
            .collect();
        let series = MeasurementSeries::new(ReceiverId::new("KITT"), records).unwrap();

        let cut = series.apply_cuts(&[DataCut::between_dates(at(1), at(2))]);
        let kept: Vec<_> = cut.records().iter().map(|m| m.value).collect();
        assert_eq!(kept, vec![Some(0.0), None, None, Some(3.0), Some(4.0)]);
        assert_eq!(cut.len(), 5);

        let cut = series.apply_cuts(&[DataCut::new(CutParam::Pwv, 1.0, 3.0)]);
        let kept: Vec<_> = cut.records().iter().map(|m| m.value).collect();
        assert_eq!(kept, vec![None, Some(1.0), Some(2.0), Some(3.0), None]);
        assert!(cut.records()[0].value_err.is_none());
    }

    #[test]
    fn missing_values_fail_value_cuts() {
        let m = Measurement::new(at(0), None, Some(0.1));
        assert!(!DataCut::new(CutParam::Pwv, 0.0, 10.0).keeps(&m));
        assert!(DataCut::new(CutParam::PwvErr, 0.0, 10.0).keeps(&m));
    }

    #[test]
    fn composite_drops_negative_rows_and_sorts() {
        let series = CompositeSeries::new(vec![
            CompositeRecord { date: at(3), pwv: 1.0, pwv_err: 0.1 },
            CompositeRecord { date: at(1), pwv: -0.5, pwv_err: 0.1 },
            CompositeRecord { date: at(2), pwv: 2.0, pwv_err: 0.1 },
        ]);
        assert_eq!(series.pwv(), vec![2.0, 1.0]);
    }

    #[test]
    fn select_by_calendar_components() {
        let records = (0..24)
            .map(|h| CompositeRecord { date: at(h), pwv: h as f64, pwv_err: 0.1 })
            .collect();
        let series = CompositeSeries::new(records);

        assert_eq!(series.select(Some(2020), None, None, None).unwrap().len(), 24);
        assert_eq!(series.select(Some(2021), None, None, None).unwrap().len(), 0);
        assert_eq!(series.select(None, Some(1), Some(1), Some(5)).unwrap().pwv(), vec![5.0]);
        assert_eq!(series.select(None, None, None, None).unwrap().len(), 24);

        assert!(matches!(series.select(None, Some(13), None, None), Err(PwvError::InvalidDate(_))));
        assert!(matches!(series.select(None, None, Some(0), None), Err(PwvError::InvalidDate(_))));
        assert!(matches!(series.select(None, None, None, Some(24)), Err(PwvError::InvalidDate(_))));
    }
}
