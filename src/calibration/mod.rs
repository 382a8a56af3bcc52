//! Cross-calibrating secondary receivers against the primary receiver and
//! building the gap-filled composite PWV series.

pub mod composite;
pub mod regression;

pub use composite::*;
pub use regression::*;
