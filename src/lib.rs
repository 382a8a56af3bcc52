//! `pwv-atm` library crate.
//!
//! The binary (`pwv`) is a thin wrapper around this library so that:
//!
//! - the numerical core is testable without spawning processes
//! - calibration and transmission models are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calibration;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod pwv;
pub mod report;
pub mod transmission;
