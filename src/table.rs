//! Tabulated Levy-stable distribution values.
//!
//! The Levy-stable density has no closed form; evaluating it means an
//! expensive numerical Fourier integral. This module substitutes a
//! precomputed grid of density values, indexed by the stability index
//! `alpha` and a rescaled radial variable `x`, together with bilinear
//! interpolation for off-grid queries. Two tabulations are carried: the
//! 1-D angular-averaged density and the 3-D projected density.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LevyFitError, Result};

/// Which of the two tabulated densities a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Angular average of the 3-D Levy distribution (1-D tabulation).
    AngularAverage,
    /// Single-direction projection of the 3-D Levy distribution.
    Projected3d,
}

/// A precomputed grid of Levy-stable density values.
///
/// Immutable after construction and `Send + Sync`, so a single table can be
/// shared read-only across any number of objective evaluations.
///
/// Invariants (enforced by every constructor):
/// - each axis holds at least two strictly increasing, finite samples;
/// - each value grid is dense: `alpha.len() * x.len()` finite entries,
///   stored row-major with `alpha` as the slow index.
#[derive(Debug, Clone)]
pub struct LevyTable {
    alpha: Vec<f64>,
    x_1d: Vec<f64>,
    x_3d: Vec<f64>,
    grid_1d: Vec<f64>,
    grid_3d: Vec<f64>,
}

impl LevyTable {
    /// Build a table from already-parsed axes and row-major value grids.
    ///
    /// # Arguments
    ///
    /// * `alpha` - Stability-index sample points, shared by both tabulations
    /// * `x_1d` - Scaled-radius sample points of the 1-D tabulation
    /// * `grid_1d` - Row-major 1-D density values, `alpha.len() * x_1d.len()` entries
    /// * `x_3d` - Scaled-radius sample points of the 3-D tabulation
    /// * `grid_3d` - Row-major 3-D density values, `alpha.len() * x_3d.len()` entries
    ///
    /// # Returns
    ///
    /// The table, or a `Load` error if any invariant is violated.
    pub fn from_parts(
        alpha: Vec<f64>,
        x_1d: Vec<f64>,
        grid_1d: Vec<f64>,
        x_3d: Vec<f64>,
        grid_3d: Vec<f64>,
    ) -> Result<Self> {
        check_axis("alpha", &alpha)?;
        check_axis("x1d", &x_1d)?;
        check_axis("x3d", &x_3d)?;
        check_grid("grid1d", &grid_1d, alpha.len(), x_1d.len())?;
        check_grid("grid3d", &grid_3d, alpha.len(), x_3d.len())?;

        Ok(Self {
            alpha,
            x_1d,
            x_3d,
            grid_1d,
            grid_3d,
        })
    }

    /// Load a table from a sectioned whitespace text file.
    ///
    /// The format is `#`-commented, whitespace-separated:
    ///
    /// ```text
    /// alpha  <n>  a_0 ... a_{n-1}
    /// x1d    <m>  x_0 ... x_{m-1}
    /// grid1d      n*m values, alpha-major
    /// x3d    <k>  x_0 ... x_{k-1}
    /// grid3d      n*k values, alpha-major
    /// ```
    ///
    /// Line breaks are insignificant beyond comment handling; grids may be
    /// laid out one alpha-row per line or free-form.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read(BufReader::new(file))
    }

    /// Parse a table from any buffered reader in the format of [`Self::load`].
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut tokens = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let data = match line.find('#') {
                Some(pos) => &line[..pos],
                None => &line[..],
            };
            tokens.extend(data.split_whitespace().map(str::to_string));
        }

        let mut cursor = Cursor::new(&tokens);
        let alpha = cursor.axis_section("alpha")?;
        let x_1d = cursor.axis_section("x1d")?;
        let grid_1d = cursor.grid_section("grid1d", alpha.len() * x_1d.len())?;
        let x_3d = cursor.axis_section("x3d")?;
        let grid_3d = cursor.grid_section("grid3d", alpha.len() * x_3d.len())?;
        cursor.finish()?;

        Self::from_parts(alpha, x_1d, grid_1d, x_3d, grid_3d)
    }

    /// Interpolated density of the 1-D angular-averaged tabulation.
    ///
    /// Off-grid `alpha` or `x` values are clamped to the nearest boundary
    /// sample; the table never extrapolates. Queries coinciding with a grid
    /// knot return the stored value exactly.
    pub fn value_1d(&self, alpha: f64, x: f64) -> f64 {
        bilinear(&self.alpha, &self.x_1d, &self.grid_1d, alpha, x)
    }

    /// Interpolated density of the 3-D projected tabulation.
    ///
    /// Same edge policy as [`Self::value_1d`].
    pub fn value_3d(&self, alpha: f64, x: f64) -> f64 {
        bilinear(&self.alpha, &self.x_3d, &self.grid_3d, alpha, x)
    }

    /// Interpolated density for the given projection.
    pub fn value(&self, projection: Projection, alpha: f64, x: f64) -> f64 {
        match projection {
            Projection::AngularAverage => self.value_1d(alpha, x),
            Projection::Projected3d => self.value_3d(alpha, x),
        }
    }

    /// Stability-index sample points.
    pub fn alpha_axis(&self) -> &[f64] {
        &self.alpha
    }

    /// Scaled-radius sample points of the 1-D tabulation.
    pub fn x_axis_1d(&self) -> &[f64] {
        &self.x_1d
    }

    /// Scaled-radius sample points of the 3-D tabulation.
    pub fn x_axis_3d(&self) -> &[f64] {
        &self.x_3d
    }

    /// Covered `[min, max]` range of the alpha axis.
    pub fn alpha_range(&self) -> (f64, f64) {
        (self.alpha[0], self.alpha[self.alpha.len() - 1])
    }
}

/// Bilinear interpolation on a dense row-major grid with boundary clamping.
///
/// The bracketing cell along each axis is located by binary search. The
/// interpolation weights are exactly 0 or 1 when the query coincides with a
/// sample point, so grid knots reproduce stored values bit-exactly.
fn bilinear(rows: &[f64], cols: &[f64], grid: &[f64], row_v: f64, col_v: f64) -> f64 {
    let (i0, i1, s) = bracket(rows, row_v);
    let (j0, j1, t) = bracket(cols, col_v);
    let ncols = cols.len();

    let f00 = grid[i0 * ncols + j0];
    let f01 = grid[i0 * ncols + j1];
    let f10 = grid[i1 * ncols + j0];
    let f11 = grid[i1 * ncols + j1];

    let top = (1.0 - t) * f00 + t * f01;
    let bottom = (1.0 - t) * f10 + t * f11;
    (1.0 - s) * top + s * bottom
}

/// Locate the cell of `axis` bracketing `v`, clamping out-of-range queries
/// to the boundary sample. Returns `(lo, hi, weight)` with
/// `axis[lo] <= v' <= axis[hi]` for the clamped value `v'`.
fn bracket(axis: &[f64], v: f64) -> (usize, usize, f64) {
    let first = axis[0];
    let last = axis[axis.len() - 1];
    let v = v.max(first).min(last);

    // First index with axis[hi] >= v, pinned to a valid upper cell corner.
    let hi = axis.partition_point(|&a| a < v).clamp(1, axis.len() - 1);
    let lo = hi - 1;

    let w = if v == axis[lo] {
        0.0
    } else if v == axis[hi] {
        1.0
    } else {
        (v - axis[lo]) / (axis[hi] - axis[lo])
    };
    (lo, hi, w)
}

fn check_axis(name: &str, axis: &[f64]) -> Result<()> {
    if axis.len() < 2 {
        return Err(LevyFitError::Load(format!(
            "axis '{}' needs at least 2 samples, got {}",
            name,
            axis.len()
        )));
    }
    for pair in axis.windows(2) {
        if !pair[0].is_finite() || !pair[1].is_finite() || pair[1] <= pair[0] {
            return Err(LevyFitError::Load(format!(
                "axis '{}' is not strictly increasing ({} then {})",
                name, pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

fn check_grid(name: &str, grid: &[f64], nrows: usize, ncols: usize) -> Result<()> {
    if grid.len() != nrows * ncols {
        return Err(LevyFitError::Load(format!(
            "grid '{}' has {} values, expected {} ({} rows of {})",
            name,
            grid.len(),
            nrows * ncols,
            nrows,
            ncols
        )));
    }
    if let Some(bad) = grid.iter().find(|v| !v.is_finite()) {
        return Err(LevyFitError::Load(format!(
            "grid '{}' contains a non-finite value: {}",
            name, bad
        )));
    }
    Ok(())
}

/// Token cursor over the flattened table file contents.
struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn keyword(&mut self, expected: &str) -> Result<()> {
        match self.tokens.get(self.pos) {
            Some(tok) if tok == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => Err(LevyFitError::Load(format!(
                "expected section '{}', found '{}'",
                expected, tok
            ))),
            None => Err(LevyFitError::Load(format!(
                "missing section '{}' (unexpected end of file)",
                expected
            ))),
        }
    }

    fn number(&mut self, context: &str) -> Result<f64> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                let value = tok.parse::<f64>().map_err(|_| {
                    LevyFitError::Load(format!("non-numeric value '{}' in {}", tok, context))
                })?;
                self.pos += 1;
                Ok(value)
            }
            None => Err(LevyFitError::Load(format!(
                "unexpected end of file while reading {}",
                context
            ))),
        }
    }

    fn count(&mut self, context: &str) -> Result<usize> {
        let raw = self.number(context)?;
        if raw.fract() != 0.0 || raw < 0.0 {
            return Err(LevyFitError::Load(format!(
                "invalid sample count {} in {}",
                raw, context
            )));
        }
        Ok(raw as usize)
    }

    fn axis_section(&mut self, name: &str) -> Result<Vec<f64>> {
        self.keyword(name)?;
        let n = self.count(name)?;
        (0..n).map(|_| self.number(name)).collect()
    }

    fn grid_section(&mut self, name: &str, len: usize) -> Result<Vec<f64>> {
        self.keyword(name)?;
        (0..len).map(|_| self.number(name)).collect()
    }

    fn finish(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(tok) => Err(LevyFitError::Load(format!(
                "trailing data after grid3d, starting at '{}'",
                tok
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_table() -> LevyTable {
        // 2 alpha samples x 3 x samples, distinct values per knot.
        LevyTable::from_parts(
            vec![1.0, 2.0],
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.5, 0.25, 0.8, 0.4, 0.2],
            vec![0.0, 2.0, 4.0],
            vec![2.0, 1.0, 0.5, 1.6, 0.8, 0.4],
        )
        .unwrap()
    }

    #[test]
    fn test_knot_exactness() {
        let table = small_table();
        let alphas = [1.0, 2.0];
        let xs = [0.0, 1.0, 2.0];
        let expected = [[1.0, 0.5, 0.25], [0.8, 0.4, 0.2]];

        for (i, &a) in alphas.iter().enumerate() {
            for (j, &x) in xs.iter().enumerate() {
                // Bit-exact, not approximately equal.
                assert_eq!(table.value_1d(a, x), expected[i][j]);
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let table = small_table();
        // Center of the first cell: average of its four corners.
        let v = table.value_1d(1.5, 0.5);
        assert_relative_eq!(v, (1.0 + 0.5 + 0.8 + 0.4) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_continuity_across_cell_boundary() {
        let table = small_table();
        let eps = 1e-9;
        let left = table.value_1d(1.3, 1.0 - eps);
        let at = table.value_1d(1.3, 1.0);
        let right = table.value_1d(1.3, 1.0 + eps);
        assert_relative_eq!(left, at, epsilon = 1e-6);
        assert_relative_eq!(right, at, epsilon = 1e-6);
    }

    #[test]
    fn test_boundary_clamping() {
        let table = small_table();
        // Below/above the alpha range, outside the x range: same as nearest edge.
        assert_eq!(table.value_1d(0.5, 1.0), table.value_1d(1.0, 1.0));
        assert_eq!(table.value_1d(3.0, 1.0), table.value_1d(2.0, 1.0));
        assert_eq!(table.value_1d(1.5, -1.0), table.value_1d(1.5, 0.0));
        assert_eq!(table.value_1d(1.5, 10.0), table.value_1d(1.5, 2.0));
    }

    #[test]
    fn test_projection_dispatch() {
        let table = small_table();
        assert_eq!(
            table.value(Projection::AngularAverage, 1.0, 0.0),
            table.value_1d(1.0, 0.0)
        );
        assert_eq!(
            table.value(Projection::Projected3d, 1.0, 0.0),
            table.value_3d(1.0, 0.0)
        );
        assert_ne!(table.value_1d(1.0, 0.0), table.value_3d(1.0, 0.0));
    }

    #[test]
    fn test_read_sectioned_text() {
        let text = "\
# Levy projection tables
alpha 2  1.0 2.0
x1d   3  0.0 1.0 2.0
grid1d
  1.0 0.5 0.25   # alpha = 1.0
  0.8 0.4 0.2    # alpha = 2.0
x3d   2  0.0 4.0
grid3d
  2.0 0.5
  1.6 0.4
";
        let table = LevyTable::read(text.as_bytes()).unwrap();
        assert_eq!(table.alpha_axis(), &[1.0, 2.0]);
        assert_eq!(table.value_1d(1.0, 1.0), 0.5);
        assert_eq!(table.value_3d(2.0, 4.0), 0.4);
    }

    #[test]
    fn test_read_rejects_non_monotonic_axis() {
        let text = "alpha 2 2.0 1.0 x1d 2 0.0 1.0 grid1d 1 2 3 4 x3d 2 0.0 1.0 grid3d 1 2 3 4";
        let err = LevyTable::read(text.as_bytes()).unwrap_err();
        assert!(format!("{}", err).contains("strictly increasing"));
    }

    #[test]
    fn test_read_rejects_missing_section() {
        let text = "alpha 2 1.0 2.0 x1d 2 0.0 1.0 grid1d 1 2 3 4";
        let err = LevyTable::read(text.as_bytes()).unwrap_err();
        assert!(format!("{}", err).contains("x3d"));
    }

    #[test]
    fn test_read_rejects_short_grid() {
        let text = "alpha 2 1.0 2.0 x1d 2 0.0 1.0 grid1d 1 2 3";
        let err = LevyTable::read(text.as_bytes()).unwrap_err();
        assert!(format!("{}", err).contains("unexpected end of file"));
    }

    #[test]
    fn test_read_rejects_non_numeric() {
        let text = "alpha 2 1.0 banana x1d 2 0.0 1.0 grid1d 1 2 3 4 x3d 2 0.0 1.0 grid3d 1 2 3 4";
        let err = LevyTable::read(text.as_bytes()).unwrap_err();
        assert!(format!("{}", err).contains("banana"));
    }

    #[test]
    fn test_read_rejects_trailing_data() {
        let text = "alpha 2 1.0 2.0 x1d 2 0.0 1.0 grid1d 1 2 3 4 x3d 2 0.0 1.0 grid3d 1 2 3 4 5";
        let err = LevyTable::read(text.as_bytes()).unwrap_err();
        assert!(format!("{}", err).contains("trailing data"));
    }

    #[test]
    fn test_from_parts_rejects_wrong_grid_size() {
        let err = LevyTable::from_parts(
            vec![1.0, 2.0],
            vec![0.0, 1.0],
            vec![1.0, 2.0, 3.0],
            vec![0.0, 1.0],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("grid1d"));
    }
}
