//! # levyfit-rs
//!
//! `levyfit-rs` fits a Levy-stable Bose-Einstein correlation model to
//! measured per-direction correlation histograms with a binned
//! maximum-likelihood method.
//!
//! The library provides:
//! - A tabulated-distribution engine ([`table::LevyTable`]) replacing the
//!   expensive Fourier-integral evaluation of the Levy-stable density with
//!   bilinear interpolation on a precomputed grid
//! - A binned Poisson-deviance likelihood
//!   ([`likelihood::PoissonDeviance`]) joining three per-direction
//!   histograms that share the stability index and normalization
//! - A bounded derivative-free minimizer behind a black-box objective
//!   contract ([`minimize::Objective`])
//! - Standard errors from the curvature at the minimum and a chi-square
//!   confidence level ([`report::confidence_level`])
//!
//! ## Basic Usage
//!
//! ```no_run
//! use levyfit_rs::{LevyFitter, LevyTable};
//! use levyfit_rs::histogram::{Histogram, HistogramSet};
//!
//! # fn main() -> levyfit_rs::Result<()> {
//! let table = LevyTable::load("levy_proj3D_values.dat")?;
//! # let bins = vec![1.0];
//! let out = Histogram::from_uniform(0.0, 1.0, &bins)?;
//! let side = out.clone();
//! let long = out.clone();
//! let histograms = HistogramSet::new(out, side, long);
//!
//! let result = LevyFitter::new().fit(&table, &histograms)?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fit;
pub mod histogram;
pub mod likelihood;
pub mod minimize;
pub mod model;
pub mod parameters;
pub mod report;
pub mod table;

// Re-exports for convenience
pub use error::{LevyFitError, Result};
pub use fit::{FitConfig, FitResult, LevyFitter};
pub use histogram::{Direction, Histogram, HistogramSet};
pub use likelihood::{FitRange, ModelParams, PoissonDeviance};
pub use model::LevyProjModel;
pub use table::{LevyTable, Projection};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
