//! Numerical building blocks: least squares, ODR, interpolation and binning.

pub mod binning;
pub mod interp;
pub mod odr;
pub mod ols;

pub use binning::*;
pub use interp::*;
pub use odr::*;
pub use ols::*;
