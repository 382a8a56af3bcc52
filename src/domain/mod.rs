//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - receiver measurements and their per-receiver series (`MeasurementSeries`)
//! - data cuts (`DataCut`, `CutParam`)
//! - the gap-filled composite PWV series (`CompositeSeries`)
//! - explicit site configuration (`SiteConfig`, `SiteConfigBuilder`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
