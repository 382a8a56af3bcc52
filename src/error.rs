//! Error type shared by the library and the `pwv` binary.
//!
//! Every variant maps onto a stable process exit code so the binary can stay
//! a thin wrapper around `app::run()`:
//!
//! - `2`: caller input (shapes, domains, config, files)
//! - `3`: the composite PWV series cannot answer the query
//! - `4`: numerical failure while calibrating receivers

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PwvError {
    #[error("Dimensions of model arguments do not match: {0}")]
    MalformedDimensions(String),

    #[error("Input wavelengths must be sorted in ascending order.")]
    UnsortedWavelengths,

    #[error("Sampled PWV values must be sorted in ascending order.")]
    UnsortedPwv,

    #[error("Cross sections cannot be negative.")]
    NegativeCrossSection,

    #[error(
        "Requested resolution {resolution} exceeds resolution of underlying model (minimum spacing {min_spacing})."
    )]
    InvalidResolution { resolution: f64, min_spacing: f64 },

    #[error("PWV concentration cannot be negative (got {0}).")]
    NegativePwv(f64),

    #[error("No PWV data available in the composite series.")]
    EmptySeries,

    #[error("No PWV data found for {date} (available data spans {first} to {last}).")]
    DateOutOfRange {
        date: String,
        first: String,
        last: String,
    },

    #[error(
        "{date} falls within an interval of missing PWV data; nearest measurement is {distance_secs:.0} s away (limit {max_gap_secs:.0} s)."
    )]
    DataGap {
        date: String,
        distance_secs: f64,
        max_gap_secs: f64,
    },

    #[error("Orthogonal distance regression failed: {0}")]
    FitConvergence(String),

    #[error("Invalid site configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid date selection: {0}")]
    InvalidDate(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PwvError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PwvError::EmptySeries | PwvError::DateOutOfRange { .. } | PwvError::DataGap { .. } => 3,
            PwvError::FitConvergence(_) => 4,
            _ => 2,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PwvError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PwvError::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PwvError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PwvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_failure_class() {
        assert_eq!(PwvError::UnsortedWavelengths.exit_code(), 2);
        assert_eq!(PwvError::EmptySeries.exit_code(), 3);
        assert_eq!(PwvError::FitConvergence("Numerical error detected".into()).exit_code(), 4);
    }

    #[test]
    fn resolution_message_names_both_values() {
        let msg = PwvError::InvalidResolution {
            resolution: 0.01,
            min_spacing: 1.0,
        }
        .to_string();
        assert!(msg.contains("0.01"));
        assert!(msg.contains("minimum spacing 1"));
    }
}
