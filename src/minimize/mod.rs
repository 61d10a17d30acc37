//! Bounded derivative-free minimization.
//!
//! The minimizer is reached only through the [`Objective`] contract: a
//! concrete type holding its table and histogram dependencies implements
//! `eval`, and the search treats it as a black box. No gradients are
//! computed anywhere in this module.

pub mod config;
pub mod simplex;

pub use config::MinimizeConfig;
pub use simplex::{MinimizeResult, NelderMead};

use ndarray::Array1;

use crate::error::Result;

/// A scalar objective function over a fixed-length parameter vector.
///
/// Implementations must be pure: repeated evaluation at the same point must
/// return bit-identical values, which the simplex ordering (and any caller
/// caching) relies on.
pub trait Objective {
    /// Evaluate the objective at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<f64>;

    /// Number of parameters the objective expects.
    fn parameter_count(&self) -> usize;
}
