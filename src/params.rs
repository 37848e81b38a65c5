//! # Inverse-transform parameters
//!
//! The observed → catalog direction of the pipeline contains three fixed-point
//! iterations: removal of refraction, removal of light deflection and removal of
//! proper motion/parallax. [`InverseParams`] controls when they stop.
//!
//! ```rust
//! use starplace::params::InverseParams;
//!
//! let params = InverseParams::builder()
//!     .tolerance(1e-13)
//!     .max_iterations(20)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.max_iterations, 20);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::astrometry_errors::AstrometryError;
use crate::constants::Radian;

/// Stopping rules of the inverse iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InverseParams {
    /// Successive corrections smaller than this are considered converged (radians).
    pub tolerance: Radian,
    /// Iteration cap; reaching it raises a `*NotConverged` warning.
    pub max_iterations: usize,
}

impl InverseParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`InverseParamsBuilder`] initialized with the default values.
    pub fn builder() -> InverseParamsBuilder {
        InverseParamsBuilder::new()
    }
}

impl Default for InverseParams {
    fn default() -> Self {
        InverseParams {
            tolerance: 1e-12,
            max_iterations: 10,
        }
    }
}

impl fmt::Display for InverseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InverseParams(tolerance = {:e} rad, max_iterations = {})",
            self.tolerance, self.max_iterations
        )
    }
}

/// Builder for [`InverseParams`], with validation.
#[derive(Debug, Clone)]
pub struct InverseParamsBuilder {
    params: InverseParams,
}

impl Default for InverseParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InverseParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: InverseParams::default(),
        }
    }

    pub fn tolerance(mut self, v: Radian) -> Self {
        self.params.tolerance = v;
        self
    }

    pub fn max_iterations(mut self, v: usize) -> Self {
        self.params.max_iterations = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Errors
    /// ------
    /// * [`AstrometryError::InvalidParameter`] if `tolerance` is not a finite positive number
    ///   or `max_iterations` is zero.
    pub fn build(self) -> Result<InverseParams, AstrometryError> {
        let p = &self.params;

        if !(p.tolerance.is_finite() && p.tolerance > 0.0) {
            return Err(AstrometryError::InvalidParameter(
                "tolerance must be finite and > 0".into(),
            ));
        }
        if p.max_iterations == 0 {
            return Err(AstrometryError::InvalidParameter(
                "max_iterations must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}
