//! Adaptive Nelder-Mead simplex search.
//!
//! A derivative-free direct search over a scalar objective. The fitter runs
//! it in the internal (bounds-transformed) coordinate space, so box bounds
//! never need clipping here; this module knows nothing about bounds.

use ndarray::Array1;
use std::fmt;

use crate::error::{LevyFitError, Result};
use crate::minimize::config::MinimizeConfig;
use crate::minimize::Objective;

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    /// Best parameter vector found (in the coordinates the search ran in).
    pub params: Array1<f64>,

    /// Objective value at the best point.
    pub value: f64,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Number of objective evaluations.
    pub func_evals: usize,

    /// Whether the tolerance was satisfied within the budget.
    pub converged: bool,

    /// A message describing how the run ended.
    pub message: String,
}

impl fmt::Display for MinimizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Minimization Result:")?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Value: {:.6e}", self.value)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Nelder-Mead optimizer.
///
/// Uses the dimension-adaptive expansion/contraction/shrink coefficients,
/// which behave noticeably better than the classic constants once the
/// dimension grows past two or three.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    config: MinimizeConfig,
}

impl NelderMead {
    /// Create an optimizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: MinimizeConfig::default(),
        }
    }

    /// Create an optimizer with the given configuration.
    pub fn with_config(config: MinimizeConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &MinimizeConfig {
        &self.config
    }

    /// Minimize `objective` starting from `initial` with per-coordinate
    /// initial `steps`.
    ///
    /// # Arguments
    ///
    /// * `objective` - The scalar objective to minimize
    /// * `initial` - Starting point
    /// * `steps` - Per-coordinate offsets spanning the initial simplex;
    ///   every entry must be non-zero
    ///
    /// # Returns
    ///
    /// The best point found. Budget exhaustion is reported through
    /// `MinimizeResult::converged == false`, not as an error, so the caller
    /// still sees the final estimate.
    pub fn minimize<O: Objective>(
        &self,
        objective: &O,
        initial: &Array1<f64>,
        steps: &Array1<f64>,
    ) -> Result<MinimizeResult> {
        let n = objective.parameter_count();
        if initial.len() != n {
            return Err(LevyFitError::DimensionMismatch(format!(
                "expected {} parameters, got {}",
                n,
                initial.len()
            )));
        }
        if steps.len() != n || steps.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(LevyFitError::DimensionMismatch(format!(
                "need {} non-zero finite step sizes, got {:?}",
                n, steps
            )));
        }

        // Adaptive coefficients (reflection, expansion, contraction, shrink).
        let nf = n as f64;
        let rho = 1.0;
        let chi = 1.0 + 2.0 / nf;
        let gamma = 0.75 - 1.0 / (2.0 * nf);
        let sigma = 1.0 - 1.0 / nf;

        let mut func_evals = 0usize;
        let budget = self.config.max_function_calls;

        let eval = |point: &Array1<f64>, evals: &mut usize| -> Result<f64> {
            *evals += 1;
            objective.eval(point)
        };

        // Initial simplex: the start plus one vertex per coordinate offset.
        let mut simplex: Vec<Array1<f64>> = Vec::with_capacity(n + 1);
        let mut values: Vec<f64> = Vec::with_capacity(n + 1);
        simplex.push(initial.clone());
        values.push(eval(initial, &mut func_evals)?);
        for i in 0..n {
            let mut vertex = initial.clone();
            vertex[i] += steps[i];
            values.push(eval(&vertex, &mut func_evals)?);
            simplex.push(vertex);
        }

        let mut iterations = 0usize;
        let mut converged = false;
        let mut message = String::new();

        loop {
            // Order vertices best-to-worst.
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let simplex_sorted: Vec<Array1<f64>> =
                order.iter().map(|&i| simplex[i].clone()).collect();
            let values_sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
            simplex = simplex_sorted;
            values = values_sorted;

            let best = values[0];
            let worst = values[n];
            // Relative spread, with an absolute check so objectives whose
            // minimum sits at zero can still converge.
            let spread_abs = (worst - best).abs();
            let spread = 2.0 * spread_abs / (worst.abs() + best.abs() + 1e-30);
            if spread <= self.config.tolerance || spread_abs <= self.config.tolerance {
                converged = true;
                message = format!("simplex spread {:.3e} within tolerance", spread_abs);
                break;
            }
            if iterations >= self.config.max_iterations {
                message = format!("iteration budget {} exhausted", self.config.max_iterations);
                break;
            }
            if func_evals >= budget {
                message = format!("function-call budget {} exhausted", budget);
                break;
            }
            iterations += 1;

            // Centroid of all but the worst vertex.
            let mut centroid = Array1::<f64>::zeros(n);
            for vertex in simplex.iter().take(n) {
                centroid = centroid + vertex;
            }
            centroid.mapv_inplace(|v| v / nf);

            // Reflection.
            let reflected = &centroid + &((&centroid - &simplex[n]) * rho);
            let f_reflected = eval(&reflected, &mut func_evals)?;

            if f_reflected < values[0] {
                // Expansion.
                let expanded = &centroid + &((&reflected - &centroid) * chi);
                let f_expanded = eval(&expanded, &mut func_evals)?;
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            // Contraction, outside or inside of the worst vertex.
            let (contracted, f_contracted) = if f_reflected < values[n] {
                let point = &centroid + &((&reflected - &centroid) * gamma);
                let f = eval(&point, &mut func_evals)?;
                (point, f)
            } else {
                let point = &centroid - &((&centroid - &simplex[n]) * gamma);
                let f = eval(&point, &mut func_evals)?;
                (point, f)
            };

            if f_contracted < values[n].min(f_reflected) {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            // Shrink toward the best vertex.
            for i in 1..=n {
                let shrunk = &simplex[0] + &((&simplex[i] - &simplex[0]) * sigma);
                values[i] = eval(&shrunk, &mut func_evals)?;
                simplex[i] = shrunk;
            }
        }

        Ok(MinimizeResult {
            params: simplex[0].clone(),
            value: values[0],
            iterations,
            func_evals,
            converged,
            message,
        })
    }
}

impl Default for NelderMead {
    fn default() -> Self {
        Self::new()
    }
}
