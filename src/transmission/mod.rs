//! PWV → atmospheric transmission.
//!
//! Two models share the `Transmission` contract:
//!
//! - `InterpolatedTransmission`: a tabulated (PWV, wavelength) grid
//! - `CrossSectionTransmission`: Beer–Lambert over H2O cross sections

pub mod cross_section;
pub mod interpolated;
pub mod model;
pub mod pwv_eff;
pub mod spectrum;

pub use cross_section::*;
pub use interpolated::*;
pub use model::*;
pub use pwv_eff::*;
pub use spectrum::*;
