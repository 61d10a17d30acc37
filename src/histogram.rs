//! Binned correlation-function samples.
//!
//! Histograms arrive pre-binned from an external storage collaborator; this
//! module only carries their bin-level arrays (center, content, error,
//! width) plus the derived integral the likelihood needs. Nothing here
//! knows about files or rendering.

use serde::{Deserialize, Serialize};

use crate::error::{LevyFitError, Result};

/// Spatial direction of a correlation-function projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Out,
    Side,
    Long,
}

impl Direction {
    /// All three directions, in the parameter-vector order.
    pub const ALL: [Direction; 3] = [Direction::Out, Direction::Side, Direction::Long];

    /// Index of this direction in per-direction arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::Out => 0,
            Direction::Side => 1,
            Direction::Long => 2,
        }
    }

    /// Short label used in reports ("out", "side", "long").
    pub fn label(self) -> &'static str {
        match self {
            Direction::Out => "out",
            Direction::Side => "side",
            Direction::Long => "long",
        }
    }
}

/// A single histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Bin-center coordinate (momentum difference or pair separation).
    pub center: f64,
    /// Bin content (counts before any density rescale).
    pub content: f64,
    /// Statistical error on the content.
    pub error: f64,
    /// Bin width.
    pub width: f64,
}

/// An ordered sequence of bins for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<Bin>,
}

impl Histogram {
    /// Create a histogram from its bins.
    ///
    /// # Returns
    ///
    /// The histogram, or a `Load` error if the bins are empty, have
    /// non-positive width, non-finite fields, or non-increasing centers.
    pub fn new(bins: Vec<Bin>) -> Result<Self> {
        if bins.is_empty() {
            return Err(LevyFitError::Load("histogram has no bins".to_string()));
        }
        for bin in &bins {
            if !bin.center.is_finite()
                || !bin.content.is_finite()
                || !bin.error.is_finite()
                || !bin.width.is_finite()
            {
                return Err(LevyFitError::Load(format!(
                    "histogram bin has a non-finite field: {:?}",
                    bin
                )));
            }
            if bin.width <= 0.0 {
                return Err(LevyFitError::Load(format!(
                    "histogram bin at {} has non-positive width {}",
                    bin.center, bin.width
                )));
            }
        }
        for pair in bins.windows(2) {
            if pair[1].center <= pair[0].center {
                return Err(LevyFitError::Load(format!(
                    "histogram bin centers not increasing ({} then {})",
                    pair[0].center, pair[1].center
                )));
            }
        }
        Ok(Self { bins })
    }

    /// Build a histogram with uniform binning from raw contents.
    ///
    /// Bin `i` is centered at `x_min + (i + 0.5) * width`; errors default to
    /// `sqrt(content)`, the Poisson expectation for raw counts.
    pub fn from_uniform(x_min: f64, width: f64, contents: &[f64]) -> Result<Self> {
        let bins = contents
            .iter()
            .enumerate()
            .map(|(i, &content)| Bin {
                center: x_min + (i as f64 + 0.5) * width,
                content,
                error: content.max(0.0).sqrt(),
                width,
            })
            .collect();
        Self::new(bins)
    }

    /// The bins, in increasing-center order.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True if the histogram has no bins (never for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Sum of bin contents.
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|b| b.content).sum()
    }

    /// Normalize contents and errors to a probability density.
    ///
    /// Divides each content and error by its bin width, then scales by the
    /// reciprocal of the pre-rescale integral. Intended as a one-shot
    /// display normalization after fitting; the likelihood itself consumes
    /// raw contents. Applying it a second time would rescale again, so
    /// callers own the single invocation.
    pub fn rescale_to_density(&mut self) {
        let integral = self.integral();
        if integral == 0.0 {
            return;
        }
        for bin in &mut self.bins {
            bin.content /= bin.width * integral;
            bin.error /= bin.width * integral;
        }
    }
}

/// One histogram per spatial direction, the unit the likelihood consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSet {
    histograms: [Histogram; 3],
}

impl HistogramSet {
    /// Assemble the per-direction set in `[out, side, long]` order.
    pub fn new(out: Histogram, side: Histogram, long: Histogram) -> Self {
        Self {
            histograms: [out, side, long],
        }
    }

    /// Histogram for one direction.
    pub fn get(&self, direction: Direction) -> &Histogram {
        &self.histograms[direction.index()]
    }

    /// Iterate `(direction, histogram)` pairs in the canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Histogram)> {
        Direction::ALL.iter().map(move |&d| (d, self.get(d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_construction() {
        let h = Histogram::from_uniform(0.0, 2.0, &[4.0, 9.0, 16.0]).unwrap();
        assert_eq!(h.len(), 3);
        assert_eq!(h.bins()[0].center, 1.0);
        assert_eq!(h.bins()[2].center, 5.0);
        assert_eq!(h.bins()[1].error, 3.0);
        assert_relative_eq!(h.integral(), 29.0);
    }

    #[test]
    fn test_rejects_bad_bins() {
        assert!(Histogram::new(vec![]).is_err());

        let bad_width = vec![Bin {
            center: 1.0,
            content: 1.0,
            error: 1.0,
            width: 0.0,
        }];
        assert!(Histogram::new(bad_width).is_err());

        let unsorted = vec![
            Bin {
                center: 2.0,
                content: 1.0,
                error: 1.0,
                width: 1.0,
            },
            Bin {
                center: 1.0,
                content: 1.0,
                error: 1.0,
                width: 1.0,
            },
        ];
        assert!(Histogram::new(unsorted).is_err());
    }

    #[test]
    fn test_rescale_to_density() {
        let mut h = Histogram::from_uniform(0.0, 2.0, &[6.0, 4.0]).unwrap();
        h.rescale_to_density();
        // content / (width * integral), integral taken before the rescale
        assert_relative_eq!(h.bins()[0].content, 6.0 / (2.0 * 10.0));
        assert_relative_eq!(h.bins()[1].content, 4.0 / (2.0 * 10.0));
        // Densities times widths sum to one.
        let total: f64 = h.bins().iter().map(|b| b.content * b.width).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rescale_all_zero_is_noop() {
        let mut h = Histogram::from_uniform(0.0, 1.0, &[0.0, 0.0]).unwrap();
        let before = h.clone();
        h.rescale_to_density();
        assert_eq!(h, before);
    }

    #[test]
    fn test_set_indexing() {
        let h = |c| Histogram::from_uniform(0.0, 1.0, &[c]).unwrap();
        let set = HistogramSet::new(h(1.0), h(2.0), h(3.0));
        assert_eq!(set.get(Direction::Out).bins()[0].content, 1.0);
        assert_eq!(set.get(Direction::Side).bins()[0].content, 2.0);
        assert_eq!(set.get(Direction::Long).bins()[0].content, 3.0);

        let order: Vec<_> = set.iter().map(|(d, _)| d.label()).collect();
        assert_eq!(order, ["out", "side", "long"]);
    }
}
