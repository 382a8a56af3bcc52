//! Querying the composite PWV series by date.

pub mod date_interp;

pub use date_interp::*;
