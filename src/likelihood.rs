//! Binned Poisson-deviance likelihood.
//!
//! Assembles the joint objective across the three per-direction histograms:
//! alpha and the normalization are shared, each direction carries its own
//! radius. The statistic is the -2 log-likelihood ratio against the
//! saturated Poisson model, chi-square distributed under the null.

use ndarray::{array, Array1};
use serde::{Deserialize, Serialize};

use crate::error::{LevyFitError, Result};
use crate::histogram::{Direction, HistogramSet};
use crate::minimize::Objective;
use crate::model::LevyProjModel;

/// Physical fit parameters of the Levy correlation model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Stability index, domain (0, 2].
    pub alpha: f64,
    /// Per-direction radii in `[out, side, long]` order.
    pub radii: [f64; 3],
    /// Normalization.
    pub norm: f64,
}

impl ModelParams {
    /// Number of free parameters (alpha, three radii, normalization).
    pub const COUNT: usize = 5;

    /// Create the parameter set.
    pub fn new(alpha: f64, r_out: f64, r_side: f64, r_long: f64, norm: f64) -> Self {
        Self {
            alpha,
            radii: [r_out, r_side, r_long],
            norm,
        }
    }

    /// Radius for one direction.
    pub fn radius(&self, direction: Direction) -> f64 {
        self.radii[direction.index()]
    }

    /// Flatten to the minimizer ordering `[alpha, R_out, R_side, R_long, N]`.
    pub fn to_array(&self) -> Array1<f64> {
        array![
            self.alpha,
            self.radii[0],
            self.radii[1],
            self.radii[2],
            self.norm
        ]
    }

    /// Rebuild from the minimizer ordering.
    pub fn from_array(params: &Array1<f64>) -> Result<Self> {
        if params.len() != Self::COUNT {
            return Err(LevyFitError::DimensionMismatch(format!(
                "expected {} parameters, got {}",
                Self::COUNT,
                params.len()
            )));
        }
        Ok(Self {
            alpha: params[0],
            radii: [params[1], params[2], params[3]],
            norm: params[4],
        })
    }
}

/// Inclusive bin-center window selecting which bins enter the fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitRange {
    /// Smallest bin center used.
    pub min: f64,
    /// Largest bin center used.
    pub max: f64,
}

impl FitRange {
    /// Create a fit range, rejecting an empty or inverted window.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(LevyFitError::Domain(format!(
                "invalid fit range [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Whether a bin center falls inside the window.
    pub fn contains(&self, center: f64) -> bool {
        center >= self.min && center <= self.max
    }
}

/// The joint binned-likelihood objective.
///
/// Holds its model and histogram dependencies explicitly (no ambient
/// state), so it can be handed to the minimizer as a plain value and called
/// repeatedly, or concurrently, with bit-identical results for identical
/// inputs.
#[derive(Debug, Clone, Copy)]
pub struct PoissonDeviance<'a> {
    model: LevyProjModel<'a>,
    histograms: &'a HistogramSet,
    range: FitRange,
}

impl<'a> PoissonDeviance<'a> {
    /// Assemble the objective from its collaborators.
    pub fn new(model: LevyProjModel<'a>, histograms: &'a HistogramSet, range: FitRange) -> Self {
        Self {
            model,
            histograms,
            range,
        }
    }

    /// The fit range bins are selected against.
    pub fn range(&self) -> FitRange {
        self.range
    }

    /// Evaluate the deviance statistic and degrees of freedom.
    ///
    /// For every in-range bin, `expected = predict * width * integral`.
    /// Bins with `expected <= 0` are excluded from both the statistic and
    /// the degrees-of-freedom count rather than erroring, so the minimizer
    /// always receives a well-defined scalar. A bin with zero observed
    /// count contributes `expected` alone, with the log term dropped.
    /// The degrees of freedom are recomputed
    /// from scratch on every call because the bin selection depends on the
    /// candidate parameters.
    ///
    /// # Returns
    ///
    /// `(statistic, ndf)` with `statistic = 2 * sum` and
    /// `ndf = used_bins - 5`.
    pub fn evaluate(&self, params: &ModelParams) -> Result<(f64, i64)> {
        let mut sum = 0.0;
        let mut used: i64 = 0;

        for (direction, histogram) in self.histograms.iter() {
            let integral = histogram.integral();
            let radius = params.radius(direction);

            for bin in histogram.bins() {
                if !self.range.contains(bin.center) {
                    continue;
                }
                let expected = self
                    .model
                    .predict(params.alpha, radius, params.norm, bin.center)?
                    * bin.width
                    * integral;
                if expected <= 0.0 {
                    continue;
                }
                let observed = bin.content;
                sum += if observed != 0.0 {
                    expected + observed * (observed / expected).ln() - observed
                } else {
                    expected
                };
                used += 1;
            }
        }

        Ok((2.0 * sum, used - Self::free_parameters()))
    }

    /// Number of free parameters subtracted from the used-bin count.
    pub fn free_parameters() -> i64 {
        ModelParams::COUNT as i64
    }
}

impl Objective for PoissonDeviance<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<f64> {
        let params = ModelParams::from_array(params)?;
        Ok(self.evaluate(&params)?.0)
    }

    fn parameter_count(&self) -> usize {
        ModelParams::COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram;
    use crate::table::{LevyTable, Projection};
    use approx::assert_relative_eq;

    fn test_table() -> LevyTable {
        // Smooth alpha-dependent decay so the objective is nontrivial.
        let alpha: Vec<f64> = (0..16).map(|i| 0.5 + i as f64 * 0.1).collect();
        let x: Vec<f64> = (0..201).map(|i| i as f64 * 0.1).collect();
        let mut grid = Vec::with_capacity(alpha.len() * x.len());
        for &a in &alpha {
            for &xv in &x {
                grid.push((-xv.powf(a)).exp());
            }
        }
        LevyTable::from_parts(alpha.clone(), x.clone(), grid.clone(), x, grid).unwrap()
    }

    fn histogram_from_model(
        table: &LevyTable,
        params: &ModelParams,
        direction: Direction,
        integral: f64,
    ) -> Histogram {
        let model = LevyProjModel::new(table, Projection::AngularAverage);
        let width = 1.0;
        let contents: Vec<f64> = (0..50)
            .map(|i| {
                let center = (i as f64 + 0.5) * width;
                model
                    .predict(params.alpha, params.radius(direction), params.norm, center)
                    .unwrap()
                    * width
                    * integral
            })
            .collect();
        Histogram::from_uniform(0.0, width, &contents).unwrap()
    }

    fn make_fixture(params: &ModelParams) -> (LevyTable, HistogramSet) {
        let table = test_table();
        let set = HistogramSet::new(
            histogram_from_model(&table, params, Direction::Out, 1.0e4),
            histogram_from_model(&table, params, Direction::Side, 1.0e4),
            histogram_from_model(&table, params, Direction::Long, 1.0e4),
        );
        (table, set)
    }

    #[test]
    fn test_statistic_small_at_truth() {
        let truth = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (table, set) = make_fixture(&truth);

        let model = LevyProjModel::new(&table, Projection::AngularAverage);
        let range = FitRange::new(1.0, 40.0).unwrap();
        let engine = PoissonDeviance::new(model, &set, range);

        let (stat, ndf) = engine.evaluate(&truth).unwrap();
        // Generation and evaluation use slightly different integrals (the
        // histogram integral includes out-of-range bins), so the statistic
        // is small but not exactly zero at the injected parameters.
        assert!(stat.is_finite());
        assert!(stat >= 0.0);
        assert!(ndf > 0);
    }

    #[test]
    fn test_objective_purity() {
        let truth = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (table, set) = make_fixture(&truth);
        let model = LevyProjModel::new(&table, Projection::AngularAverage);
        let engine = PoissonDeviance::new(model, &set, FitRange::new(1.0, 40.0).unwrap());

        let probe = ModelParams::new(1.4, 5.0, 5.5, 4.5, 0.9);
        let (s1, n1) = engine.evaluate(&probe).unwrap();
        let (s2, n2) = engine.evaluate(&probe).unwrap();
        assert_eq!(s1.to_bits(), s2.to_bits());
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_zero_expected_excluded() {
        let truth = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (table, set) = make_fixture(&truth);
        let model = LevyProjModel::new(&table, Projection::AngularAverage);
        let engine = PoissonDeviance::new(model, &set, FitRange::new(1.0, 40.0).unwrap());

        // norm = 0 makes every expected count 0: all bins skipped.
        let degenerate = ModelParams::new(1.2, 6.0, 5.0, 4.0, 0.0);
        let (stat, ndf) = engine.evaluate(&degenerate).unwrap();
        assert_eq!(stat, 0.0);
        assert_eq!(ndf, -PoissonDeviance::free_parameters());
    }

    #[test]
    fn test_all_zero_histogram_is_finite() {
        let table = test_table();
        let empty = || Histogram::from_uniform(0.0, 1.0, &[0.0; 50]).unwrap();
        let set = HistogramSet::new(empty(), empty(), empty());
        let model = LevyProjModel::new(&table, Projection::AngularAverage);
        let engine = PoissonDeviance::new(model, &set, FitRange::new(1.0, 40.0).unwrap());

        // integral == 0 makes expected == 0 everywhere: no log, no NaN.
        let params = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (stat, ndf) = engine.evaluate(&params).unwrap();
        assert!(stat.is_finite());
        assert_eq!(stat, 0.0);
        assert_eq!(ndf, -PoissonDeviance::free_parameters());
    }

    #[test]
    fn test_fit_range_controls_ndf() {
        let truth = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (table, set) = make_fixture(&truth);
        let model = LevyProjModel::new(&table, Projection::AngularAverage);

        // Bin centers are 0.5, 1.5, ..., 49.5; [1, 10] keeps 9 per direction.
        let narrow = PoissonDeviance::new(model, &set, FitRange::new(1.0, 10.0).unwrap());
        let (_, ndf) = narrow.evaluate(&truth).unwrap();
        assert_eq!(ndf, 3 * 9 - 5);

        let wide = PoissonDeviance::new(model, &set, FitRange::new(1.0, 40.0).unwrap());
        let (_, ndf_wide) = wide.evaluate(&truth).unwrap();
        assert!(ndf_wide > ndf);
    }

    #[test]
    fn test_statistic_grows_away_from_truth() {
        let truth = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let (table, set) = make_fixture(&truth);
        let model = LevyProjModel::new(&table, Projection::AngularAverage);
        let engine = PoissonDeviance::new(model, &set, FitRange::new(1.0, 40.0).unwrap());

        let (at_truth, _) = engine.evaluate(&truth).unwrap();
        let off = ModelParams::new(1.2, 7.5, 5.0, 4.0, 1.0);
        let (off_truth, _) = engine.evaluate(&off).unwrap();
        assert!(off_truth > at_truth);
    }

    #[test]
    fn test_params_array_round_trip() {
        let p = ModelParams::new(1.2, 6.0, 5.0, 4.0, 1.0);
        let arr = p.to_array();
        assert_eq!(arr.len(), ModelParams::COUNT);
        let back = ModelParams::from_array(&arr).unwrap();
        assert_eq!(back, p);

        let short = array![1.0, 2.0];
        assert!(ModelParams::from_array(&short).is_err());
    }

    #[test]
    fn test_fit_range_validation() {
        assert!(FitRange::new(1.0, 50.0).is_ok());
        assert!(FitRange::new(50.0, 1.0).is_err());
        assert!(FitRange::new(1.0, 1.0).is_err());
        assert!(FitRange::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_deviance_term_value() {
        // Deviance of a single known bin: expected 4, observed 2.
        // term = e + o*ln(o/e) - o = 4 + 2*ln(0.5) - 2.
        let expected = 4.0_f64;
        let observed = 2.0_f64;
        let term = expected + observed * (observed / expected).ln() - observed;
        assert_relative_eq!(term, 2.0 + 2.0 * 0.5_f64.ln(), epsilon = 1e-12);
    }
}
