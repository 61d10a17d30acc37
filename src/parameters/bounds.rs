//! Box bounds and the Minuit-style bounds transform.
//!
//! The minimizer searches an unbounded internal space; bounded fit
//! parameters (alpha, the radii) are mapped in and out of that space with
//! the same transformations Minuit uses, so the simplex never proposes a
//! point outside its box.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Box constraint on a fit parameter. Either side may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        // Infinite bounds serialize as null so JSON round-trips them.
        let mut state = serializer.serialize_struct("Bounds", 2)?;
        if self.min.is_finite() {
            state.serialize_field("min", &self.min)?;
        } else {
            state.serialize_field("min", &Option::<f64>::None)?;
        }
        if self.max.is_finite() {
            state.serialize_field("max", &self.max)?;
        } else {
            state.serialize_field("max", &Option::<f64>::None)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,
            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Ok(Bounds {
            min: helper.min.unwrap_or(f64::NEG_INFINITY),
            max: helper.max.unwrap_or(f64::INFINITY),
        })
    }
}

impl Bounds {
    /// Create bounds, rejecting `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Unbounded on both sides.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounded from below only.
    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    /// Bounded from above only.
    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    /// Whether `value` lies inside the box (inclusive).
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether there is a finite lower bound.
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Whether there is a finite upper bound.
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp `value` into the box.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map an internal (unbounded) coordinate to the bounded external value.
    ///
    /// Two-sided bounds use the sine transform
    /// `min + (sin(i) + 1) * (max - min) / 2`; one-sided bounds use the
    /// sqrt-shift `bound -/+ 1 +/- sqrt(i^2 + 1)`; unbounded parameters pass
    /// through unchanged.
    pub fn to_external(&self, internal: f64) -> f64 {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => internal,
            (true, false) => self.min - 1.0 + (internal * internal + 1.0).sqrt(),
            (false, true) => self.max + 1.0 - (internal * internal + 1.0).sqrt(),
            (true, true) => {
                let half_range = (self.max - self.min) / 2.0;
                self.min + (internal.sin() + 1.0) * half_range
            }
        }
    }

    /// Map an external value inside the box to an internal coordinate.
    ///
    /// Inverse of [`Self::to_external`]; fails if the value is non-finite or
    /// outside the box.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        if !external.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        if !self.is_within_bounds(external) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external,
                min: self.min,
                max: self.max,
            });
        }

        let internal = match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => external,
            (true, false) => ((external - self.min + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            (false, true) => ((self.max - external + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external - self.min) / (self.max - self.min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };
        Ok(internal)
    }
}
