//! Levy-stable correlation model.
//!
//! Maps physical fit parameters (stability index `alpha`, direction radius
//! `R`, normalization `N`) and a momentum-difference value `q` into a
//! predicted correlation-function value through the tabulated density. The
//! table is injected explicitly; the model holds no ambient state.

use crate::error::{LevyFitError, Result};
use crate::table::{LevyTable, Projection};

/// Predicts correlation-function values from a shared [`LevyTable`].
///
/// The model is a pure function of its inputs: `predict` with identical
/// arguments always returns the identical value, which the likelihood and
/// the minimizer both rely on.
#[derive(Debug, Clone, Copy)]
pub struct LevyProjModel<'a> {
    table: &'a LevyTable,
    projection: Projection,
}

impl<'a> LevyProjModel<'a> {
    /// Create a model reading the given tabulation of `table`.
    pub fn new(table: &'a LevyTable, projection: Projection) -> Self {
        Self { table, projection }
    }

    /// The table this model reads.
    pub fn table(&self) -> &'a LevyTable {
        self.table
    }

    /// Which tabulation the model reads.
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Predicted pair-separation distribution value.
    ///
    /// Computes `Rcc = R * 2^(1/alpha)` and returns
    /// `(2N / Rcc) * table(alpha, q / Rcc)`.
    ///
    /// # Arguments
    ///
    /// * `alpha` - Stability index, must be positive and finite
    /// * `r` - Direction radius, must be positive
    /// * `n` - Normalization
    /// * `q` - Momentum difference / pair separation coordinate
    ///
    /// # Returns
    ///
    /// The model value, or a `Domain` error for `alpha <= 0` or `r <= 0`.
    pub fn predict(&self, alpha: f64, r: f64, n: f64, q: f64) -> Result<f64> {
        check_shape(alpha, r)?;
        let rcc = r * 2f64.powf(1.0 / alpha);
        Ok(2.0 * n / rcc * self.table.value(self.projection, alpha, q / rcc))
    }

    /// Correlation-function form `1 + lambda * table(alpha, q * R)`.
    ///
    /// The shape used for example curves of the measured correlation
    /// function, with intercept parameter `lambda`.
    pub fn correlation(&self, lambda: f64, r: f64, alpha: f64, q: f64) -> Result<f64> {
        check_shape(alpha, r)?;
        Ok(1.0 + lambda * self.table.value(self.projection, alpha, q * r))
    }
}

fn check_shape(alpha: f64, r: f64) -> Result<()> {
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(LevyFitError::Domain(format!(
            "stability index alpha must be positive and finite, got {}",
            alpha
        )));
    }
    if !r.is_finite() || r <= 0.0 {
        return Err(LevyFitError::Domain(format!(
            "radius R must be positive and finite, got {}",
            r
        )));
    }
    Ok(())
}
