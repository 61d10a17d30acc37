//! Configuration options for the bounded minimizer.

/// Budget and tolerance settings for a minimization run.
///
/// The ceilings are explicit and configurable; the search never runs
/// indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct MinimizeConfig {
    /// Maximum number of simplex iterations. Default: 10 000
    pub max_iterations: usize,

    /// Maximum number of objective evaluations. Default: 10 000
    pub max_function_calls: usize,

    /// Convergence tolerance on the simplex value spread. Default: 1e-7
    pub tolerance: f64,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_function_calls: 10_000,
            tolerance: 1e-7,
        }
    }
}

impl MinimizeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the maximum number of objective evaluations.
    pub fn with_max_function_calls(mut self, max_function_calls: usize) -> Self {
        self.max_function_calls = max_function_calls;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}
