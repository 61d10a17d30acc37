//! Goodness-of-fit reporting.
//!
//! Purely derived quantities: converts a minimized deviance statistic and
//! its degrees of freedom into a confidence level. No fit logic lives here.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{LevyFitError, Result};

/// Upper-tail chi-square survival probability.
///
/// The probability, under the null model, of observing a deviance statistic
/// at least as large as `statistic` with `ndf` degrees of freedom.
///
/// # Returns
///
/// The confidence level in `[0, 1]`, or a `Domain` error for `ndf <= 0` or
/// a negative / non-finite statistic.
pub fn confidence_level(statistic: f64, ndf: i64) -> Result<f64> {
    if ndf <= 0 {
        return Err(LevyFitError::Domain(format!(
            "confidence level needs positive degrees of freedom, got {}",
            ndf
        )));
    }
    if !statistic.is_finite() || statistic < 0.0 {
        return Err(LevyFitError::Domain(format!(
            "confidence level needs a non-negative finite statistic, got {}",
            statistic
        )));
    }

    let dist = ChiSquared::new(ndf as f64)
        .map_err(|e| LevyFitError::Domain(format!("chi-square distribution: {}", e)))?;
    Ok(dist.sf(statistic))
}
