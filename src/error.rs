use thiserror::Error;

/// Error types for the levyfit-rs library.
#[derive(Error, Debug)]
pub enum LevyFitError {
    /// Malformed or incomplete distribution-table / histogram source.
    /// Fatal: reported before any fitting starts.
    #[error("Load error: {0}")]
    Load(String),

    /// Parameter or table-query value outside its mathematically valid domain.
    #[error("Domain error: {0}")]
    Domain(String),

    /// The minimizer exhausted its call/iteration budget without satisfying
    /// the tolerance. Carries the best estimate found so the caller can
    /// inspect it rather than receiving nothing.
    #[error(
        "Minimizer failed to converge after {iterations} iterations \
         ({func_evals} function calls); best statistic {statistic:.6e}"
    )]
    Convergence {
        /// Last (best) parameter estimate, in the order [alpha, R_out, R_side, R_long, N].
        params: Vec<f64>,
        /// Statistic at the last estimate.
        statistic: f64,
        /// Iterations performed before giving up.
        iterations: usize,
        /// Objective evaluations performed before giving up.
        func_evals: usize,
    },

    /// Mismatch between an expected and an actual vector length.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] crate::parameters::bounds::BoundsError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for levyfit-rs operations.
pub type Result<T> = std::result::Result<T, LevyFitError>;
