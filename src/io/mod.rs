//! Input/output helpers.
//!
//! - measurement and composite series CSV (`series`)
//! - model tables in, spectra out (`tables`)

pub mod series;
pub mod tables;

pub use series::*;
pub use tables::*;
