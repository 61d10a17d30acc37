//! Fit parameter registration.
//!
//! A [`Parameter`] is what the fit adapter registers with the minimizer:
//! a name, an initial value, an initial step size, optional box bounds,
//! and (after fitting) a standard error.

use serde::{Deserialize, Serialize};

use crate::parameters::bounds::{Bounds, BoundsError};

/// A single registered fit parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter.
    pub name: String,

    /// Current value.
    value: f64,

    /// Initial step size for the minimizer's first simplex.
    step: f64,

    /// Box bounds (unbounded by default).
    bounds: Bounds,

    /// Standard error, set after fitting.
    stderr: Option<f64>,
}

impl Parameter {
    /// Create an unbounded parameter.
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter name
    /// * `value` - Initial value
    /// * `step` - Initial step size (must be positive to move the simplex)
    pub fn new(name: &str, value: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            step,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Create a parameter with box bounds.
    ///
    /// The initial value is clamped into the box, matching how the
    /// minimizer registers limited variables.
    pub fn with_bounds(
        name: &str,
        value: f64,
        step: f64,
        min: f64,
        max: f64,
    ) -> Result<Self, BoundsError> {
        let bounds = Bounds::new(min, max)?;
        Ok(Self {
            name: name.to_string(),
            value: bounds.clamp(value),
            step,
            bounds,
            stderr: None,
        })
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value, rejecting values outside the bounds.
    pub fn set_value(&mut self, value: f64) -> Result<(), BoundsError> {
        if !self.bounds.is_within_bounds(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Initial step size.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Box bounds.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Standard error, if the fit has set one.
    pub fn stderr(&self) -> Option<f64> {
        self.stderr
    }

    /// Record a standard error after fitting.
    pub fn set_stderr(&mut self, stderr: Option<f64>) {
        self.stderr = stderr;
    }

    /// Current value in the minimizer's internal coordinate.
    pub fn to_internal(&self) -> Result<f64, BoundsError> {
        self.bounds.to_internal(self.value)
    }

    /// External value corresponding to an internal coordinate.
    pub fn from_internal(&self, internal: f64) -> f64 {
        self.bounds.to_external(internal)
    }

    /// Internal-space step matching the external step at the current value.
    ///
    /// The sine transform compresses steps near a bound; taking the forward
    /// difference of the transform keeps the initial simplex a sensible
    /// size in internal coordinates.
    pub fn internal_step(&self) -> Result<f64, BoundsError> {
        let internal = self.to_internal()?;
        let stepped = self.bounds.clamp(self.value + self.step);
        let stepped_internal = self.bounds.to_internal(stepped)?;
        let diff = (stepped_internal - internal).abs();
        // Degenerate when value + step hits the clamp; fall back to the raw step.
        Ok(if diff > 0.0 { diff } else { self.step.abs() })
    }
}
