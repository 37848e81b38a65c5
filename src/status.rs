//! # Warning-carrying results
//!
//! Every step of the astrometry pipeline either fails hard (an
//! [`AstrometryError`](crate::astrometry_errors::AstrometryError) returned as `Err`) or
//! succeeds with a value that may be **dubious**: the date is outside the range where the
//! supplier is accurate, the geometry was clamped near a singularity, or an iteration
//! stopped before reaching its tolerance.
//!
//! [`Flagged`] wraps such a value together with the warnings raised while computing it.
//! It is `#[must_use]`, so a caller cannot silently drop the status: the value is reached
//! through [`Flagged::value`], [`Flagged::into_value`] or [`Flagged::into_parts`].
//!
//! ## Composition
//!
//! When a step consumes the output of another one, the warnings are merged
//! ([`Flagged::absorb`], [`Flagged::and_then`]). The overall [`Severity`] is the most
//! severe of all merged warnings; hard failures short-circuit through `?`.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Non-fatal conditions raised while computing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstrometryWarning {
    /// The date lies outside the interval where the supplier is known to be accurate.
    DubiousYear,
    /// Parallax was below the floor of the space-motion model and has been raised to it.
    ParallaxFloored,
    /// Space velocity exceeded half the speed of light and was set to zero.
    ExcessiveSpeed,
    /// The relativistic Doppler correction did not converge.
    RelativisticNotConverged,
    /// Removal of light deflection stopped at the iteration cap.
    DeflectionNotConverged { iterations: usize },
    /// Removal of refraction stopped at the iteration cap.
    RefractionNotConverged { iterations: usize },
    /// Removal of proper motion and parallax stopped at the iteration cap.
    ProperMotionNotConverged { iterations: usize },
    /// A near-zero denominator was clamped (object close to the zenith or below the horizon).
    DegenerateGeometry,
}

impl fmt::Display for AstrometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AstrometryWarning::*;
        match self {
            DubiousYear => write!(f, "dubious year"),
            ParallaxFloored => write!(f, "parallax raised to the model floor"),
            ExcessiveSpeed => write!(f, "excessive space velocity, set to zero"),
            RelativisticNotConverged => write!(f, "relativistic correction not converged"),
            DeflectionNotConverged { iterations } => {
                write!(f, "light deflection not removed after {iterations} iterations")
            }
            RefractionNotConverged { iterations } => {
                write!(f, "refraction not removed after {iterations} iterations")
            }
            ProperMotionNotConverged { iterations } => {
                write!(f, "proper motion not removed after {iterations} iterations")
            }
            DegenerateGeometry => write!(f, "degenerate geometry, denominator clamped"),
        }
    }
}

/// Overall trust level of a [`Flagged`] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Ok,
    Dubious,
}

impl AstrometryWarning {
    pub fn severity(&self) -> Severity {
        Severity::Dubious
    }
}

/// A value along with the warnings raised while computing it.
#[must_use = "the warnings of a Flagged result must be inspected or explicitly discarded"]
#[derive(Debug, Clone, PartialEq)]
pub struct Flagged<T> {
    value: T,
    warnings: SmallVec<[AstrometryWarning; 2]>,
}

impl<T> Flagged<T> {
    /// A value without any warning.
    pub fn ok(value: T) -> Self {
        Flagged {
            value,
            warnings: SmallVec::new(),
        }
    }

    /// A value carrying a single warning.
    pub fn warn(value: T, warning: AstrometryWarning) -> Self {
        let mut flagged = Flagged::ok(value);
        flagged.push_warning(warning);
        flagged
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn warnings(&self) -> &[AstrometryWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (T, SmallVec<[AstrometryWarning; 2]>) {
        (self.value, self.warnings)
    }

    /// Most severe condition attached to the value.
    pub fn severity(&self) -> Severity {
        self.warnings
            .iter()
            .map(AstrometryWarning::severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    pub fn is_ok(&self) -> bool {
        self.severity() == Severity::Ok
    }

    pub fn has_warning(&self, warning: &AstrometryWarning) -> bool {
        self.warnings.contains(warning)
    }

    /// Record a warning. Identical warnings are kept once.
    pub fn push_warning(&mut self, warning: AstrometryWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Take over the warnings of `other` and hand back its value.
    ///
    /// This is the building block used by the pipeline to chain steps:
    ///
    /// ```rust
    /// use starplace::status::{AstrometryWarning, Flagged};
    ///
    /// let mut status = Flagged::ok(());
    /// let x = status.absorb(Flagged::warn(1.0, AstrometryWarning::DegenerateGeometry));
    /// assert_eq!(x, 1.0);
    /// assert!(!status.is_ok());
    /// ```
    pub fn absorb<U>(&mut self, other: Flagged<U>) -> U {
        for w in other.warnings {
            self.push_warning(w);
        }
        other.value
    }

    /// Replace the value, keeping the collected warnings.
    pub fn with_value<U>(self, value: U) -> Flagged<U> {
        Flagged {
            value,
            warnings: self.warnings,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Flagged<U> {
        Flagged {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Chain a step that may itself raise warnings; both sets are merged.
    pub fn and_then<U, F: FnOnce(T) -> Flagged<U>>(self, f: F) -> Flagged<U> {
        let mut next = f(self.value);
        for w in self.warnings.into_iter().rev() {
            if !next.warnings.contains(&w) {
                next.warnings.insert(0, w);
            }
        }
        next
    }
}

impl<T> From<T> for Flagged<T> {
    fn from(value: T) -> Self {
        Flagged::ok(value)
    }
}
