//! Fit driver: parameter registration, minimization, and error estimation.
//!
//! [`LevyFitter`] is the adapter between the physics objective and the
//! minimizer. It registers the five fit parameters with their initial
//! values, steps, and box bounds, maps them into the minimizer's internal
//! coordinates, runs the search, and extracts final values, standard
//! errors, and the goodness of fit.

use std::fmt;

use nalgebra::DMatrix;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{LevyFitError, Result};
use crate::histogram::HistogramSet;
use crate::likelihood::{FitRange, ModelParams, PoissonDeviance};
use crate::minimize::{MinimizeConfig, NelderMead, Objective};
use crate::model::LevyProjModel;
use crate::parameters::{Bounds, Parameter};
use crate::report::confidence_level;
use crate::table::{LevyTable, Projection};

/// Initial value, step, and bounds for one registered parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSetting {
    /// Starting value.
    pub initial: f64,
    /// Initial step size.
    pub step: f64,
    /// Box bounds (unbounded for the normalization).
    pub bounds: Bounds,
}

impl ParamSetting {
    /// A bounded setting.
    pub fn bounded(initial: f64, step: f64, min: f64, max: f64) -> Self {
        Self {
            initial,
            step,
            bounds: Bounds { min, max },
        }
    }

    /// An unbounded setting.
    pub fn free(initial: f64, step: f64) -> Self {
        Self {
            initial,
            step,
            bounds: Bounds::unbounded(),
        }
    }
}

/// Full configuration surface of a fit.
///
/// Everything is explicit: fit range, per-parameter initial
/// values/steps/bounds, which tabulation the model reads, and the minimizer
/// budget. No global state is consulted anywhere.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Bin-center window entering the likelihood.
    pub range: FitRange,
    /// Which tabulated density the model reads.
    pub projection: Projection,
    /// Stability index alpha.
    pub alpha: ParamSetting,
    /// Out-direction radius.
    pub r_out: ParamSetting,
    /// Side-direction radius.
    pub r_side: ParamSetting,
    /// Long-direction radius.
    pub r_long: ParamSetting,
    /// Normalization (unbounded by default).
    pub norm: ParamSetting,
    /// Minimizer budget and tolerance.
    pub minimize: MinimizeConfig,
}

impl Default for FitConfig {
    /// Typical analysis defaults: alpha 1.5 in [0.5, 2.0], radii 5.0 fm in
    /// [2.0, 12.0], normalization 1.0 free, all with step 0.01, and a fit
    /// range of [1, 50].
    fn default() -> Self {
        Self {
            range: FitRange {
                min: 1.0,
                max: 50.0,
            },
            projection: Projection::AngularAverage,
            alpha: ParamSetting::bounded(1.5, 0.01, 0.5, 2.0),
            r_out: ParamSetting::bounded(5.0, 0.01, 2.0, 12.0),
            r_side: ParamSetting::bounded(5.0, 0.01, 2.0, 12.0),
            r_long: ParamSetting::bounded(5.0, 0.01, 2.0, 12.0),
            norm: ParamSetting::free(1.0, 0.01),
            minimize: MinimizeConfig::default(),
        }
    }
}

/// Outcome of a completed fit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Best-fit parameters.
    pub params: ModelParams,
    /// Standard errors, parallel to `[alpha, R_out, R_side, R_long, N]`.
    pub errors: [f64; 5],
    /// Minimized deviance statistic.
    pub statistic: f64,
    /// Degrees of freedom (used bins minus free parameters).
    pub ndf: i64,
    /// Upper-tail chi-square survival probability.
    pub confidence_level: f64,
    /// Minimizer iterations performed.
    pub iterations: usize,
    /// Objective evaluations performed.
    pub func_evals: usize,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "alpha = {:.4} +/- {:.4}",
            self.params.alpha, self.errors[0]
        )?;
        for (i, label) in ["out", "side", "long"].iter().enumerate() {
            writeln!(
                f,
                "R_{} = ({:.4} +/- {:.4}) fm",
                label,
                self.params.radii[i],
                self.errors[i + 1]
            )?;
        }
        writeln!(f, "N = {:.4} +/- {:.4}", self.params.norm, self.errors[4])?;
        writeln!(
            f,
            "chi^2/NDF = {:.2}/{} -> C.L. = {:.2}%",
            self.statistic,
            self.ndf,
            self.confidence_level * 100.0
        )?;
        Ok(())
    }
}

/// Objective adapter running the search in internal (bounds-transformed)
/// coordinates.
struct TransformedObjective<'a, O> {
    inner: &'a O,
    bounds: Vec<Bounds>,
}

impl<'a, O: Objective> TransformedObjective<'a, O> {
    fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(
            internal
                .iter()
                .zip(&self.bounds)
                .map(|(&v, b)| b.to_external(v)),
        )
    }
}

impl<'a, O: Objective> Objective for TransformedObjective<'a, O> {
    fn eval(&self, params: &Array1<f64>) -> Result<f64> {
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }
}

/// Drives a complete fit: registration, search, errors, goodness of fit.
#[derive(Debug, Clone)]
pub struct LevyFitter {
    config: FitConfig,
}

impl LevyFitter {
    /// Create a fitter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FitConfig::default(),
        }
    }

    /// Create a fitter with the given configuration.
    pub fn with_config(config: FitConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Run the fit against the given table and histograms.
    ///
    /// # Returns
    ///
    /// The completed [`FitResult`], or:
    /// - `Convergence` (carrying the best estimate and statistic) when the
    ///   minimizer exhausts its budget before satisfying the tolerance;
    /// - `Domain` when the resulting degrees of freedom are non-positive
    ///   (too few usable bins for five free parameters).
    pub fn fit(&self, table: &LevyTable, histograms: &HistogramSet) -> Result<FitResult> {
        let model = LevyProjModel::new(table, self.config.projection);
        let engine = PoissonDeviance::new(model, histograms, self.config.range);

        let parameters = self.register_parameters()?;

        let mut initial = Vec::with_capacity(parameters.len());
        let mut steps = Vec::with_capacity(parameters.len());
        for p in &parameters {
            initial.push(p.to_internal()?);
            steps.push(p.internal_step()?);
        }
        let initial = Array1::from(initial);
        let steps = Array1::from(steps);

        let transformed = TransformedObjective {
            inner: &engine,
            bounds: parameters.iter().map(|p| *p.bounds()).collect(),
        };

        let optimizer = NelderMead::with_config(self.config.minimize);
        let search = optimizer.minimize(&transformed, &initial, &steps)?;

        let external = transformed.to_external(&search.params);
        let best = ModelParams::from_array(&external)?;
        let (statistic, ndf) = engine.evaluate(&best)?;

        if !search.converged {
            return Err(LevyFitError::Convergence {
                params: external.to_vec(),
                statistic,
                iterations: search.iterations,
                func_evals: search.func_evals,
            });
        }

        let errors = standard_errors(&engine, &external)?;
        let cl = confidence_level(statistic, ndf)?;

        Ok(FitResult {
            params: best,
            errors,
            statistic,
            ndf,
            confidence_level: cl,
            iterations: search.iterations,
            func_evals: search.func_evals,
        })
    }

    fn register_parameters(&self) -> Result<Vec<Parameter>> {
        let c = &self.config;
        let specs = [
            ("alpha", c.alpha),
            ("R_out", c.r_out),
            ("R_side", c.r_side),
            ("R_long", c.r_long),
            ("N", c.norm),
        ];
        specs
            .iter()
            .map(|(name, s)| {
                Parameter::with_bounds(name, s.initial, s.step, s.bounds.min, s.bounds.max)
                    .map_err(LevyFitError::from)
            })
            .collect()
    }
}

impl Default for LevyFitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard errors from the curvature of the statistic at the minimum.
///
/// The statistic is a -2 log-likelihood ratio, so the parameter covariance
/// is `2 * H^-1` with `H` the Hessian. The Hessian is taken by central
/// finite differences in external coordinates and inverted by Cholesky
/// decomposition; if the numerical Hessian is not positive definite, the
/// per-parameter diagonal approximation `sqrt(2 / H_ii)` is used instead.
fn standard_errors<O: Objective>(objective: &O, at: &Array1<f64>) -> Result<[f64; 5]> {
    let n = at.len();
    if n != 5 {
        return Err(LevyFitError::DimensionMismatch(format!(
            "standard errors expect 5 parameters, got {}",
            n
        )));
    }
    let steps: Vec<f64> = at.iter().map(|&p| (1e-3 * p.abs()).max(1e-4)).collect();

    let f0 = objective.eval(at)?;
    let eval_shifted = |offsets: &[(usize, f64)]| -> Result<f64> {
        let mut point = at.clone();
        for &(index, delta) in offsets {
            point[index] += delta;
        }
        objective.eval(&point)
    };

    let mut hessian = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        let hi = steps[i];
        let plus = eval_shifted(&[(i, hi)])?;
        let minus = eval_shifted(&[(i, -hi)])?;
        hessian[(i, i)] = (plus - 2.0 * f0 + minus) / (hi * hi);

        for j in (i + 1)..n {
            let hj = steps[j];
            let pp = eval_shifted(&[(i, hi), (j, hj)])?;
            let pm = eval_shifted(&[(i, hi), (j, -hj)])?;
            let mp = eval_shifted(&[(i, -hi), (j, hj)])?;
            let mm = eval_shifted(&[(i, -hi), (j, -hj)])?;
            let mixed = (pp - pm - mp + mm) / (4.0 * hi * hj);
            hessian[(i, j)] = mixed;
            hessian[(j, i)] = mixed;
        }
    }

    let mut errors = [0.0; 5];
    match hessian.clone().cholesky() {
        Some(chol) => {
            let covariance = chol.inverse() * 2.0;
            for i in 0..n {
                errors[i] = covariance[(i, i)].max(0.0).sqrt();
            }
        }
        None => {
            for i in 0..n {
                let h = hessian[(i, i)];
                errors[i] = if h > 0.0 { (2.0 / h).sqrt() } else { f64::NAN };
            }
        }
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Paraboloid;

    impl Objective for Paraboloid {
        fn eval(&self, params: &Array1<f64>) -> Result<f64> {
            // Independent quadratic wells with curvatures 2, 4, 8, 16, 32,
            // i.e. Hessian diag (4, 8, 16, 32, 64) for 2*x^2 style terms.
            Ok(params
                .iter()
                .enumerate()
                .map(|(i, &x)| 2f64.powi(i as i32 + 1) * x * x)
                .sum())
        }

        fn parameter_count(&self) -> usize {
            5
        }
    }

    #[test]
    fn test_standard_errors_of_quadratic() {
        // For f = c*x^2 treated as -2logL, error = sqrt(2 / (2c)) = 1/sqrt(c).
        let at = array![0.0, 0.0, 0.0, 0.0, 0.0];
        let errors = standard_errors(&Paraboloid, &at).unwrap();
        for (i, &e) in errors.iter().enumerate() {
            let c = 2f64.powi(i as i32 + 1);
            assert_relative_eq!(e, (1.0 / c).sqrt(), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_default_config() {
        let config = FitConfig::default();
        assert_eq!(config.alpha.initial, 1.5);
        assert_eq!(config.alpha.bounds.min, 0.5);
        assert_eq!(config.alpha.bounds.max, 2.0);
        assert_eq!(config.r_out.bounds.min, 2.0);
        assert_eq!(config.r_out.bounds.max, 12.0);
        assert!(!config.norm.bounds.has_lower_bound());
        assert_eq!(config.range.min, 1.0);
        assert_eq!(config.range.max, 50.0);
    }

    #[test]
    fn test_fit_result_display() {
        let result = FitResult {
            params: ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0),
            errors: [0.01, 0.1, 0.1, 0.1, 0.005],
            statistic: 140.0,
            ndf: 142,
            confidence_level: 0.53,
            iterations: 500,
            func_evals: 900,
        };
        let text = format!("{}", result);
        assert!(text.contains("alpha = 1.2000"));
        assert!(text.contains("R_side = (5.0000"));
        assert!(text.contains("chi^2/NDF = 140.00/142"));
        assert!(text.contains("C.L. = 53.00%"));
    }
}
