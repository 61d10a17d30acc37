//! Parameter system: registered fit parameters and their box bounds.

pub mod bounds;
pub mod parameter;

pub use bounds::{Bounds, BoundsError};
pub use parameter::Parameter;
