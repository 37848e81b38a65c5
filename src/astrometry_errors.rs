use thiserror::Error;

use crate::time::JulianDate;

/// Hard failures of the astrometry pipeline.
///
/// Any of these aborts the transform for the given epoch or star: no usable position
/// is produced. Non-fatal conditions (dubious dates, clamped geometry, iterations that
/// stopped short of the tolerance) are reported through
/// [`Flagged`](crate::status::Flagged) instead.
#[derive(Error, Debug, Clone)]
pub enum AstrometryError {
    #[error("Unacceptable date for the ephemeris or time-scale supplier: {0:?}")]
    UnacceptableDate(JulianDate),

    #[error("Space velocity reaches or exceeds the speed of light (v/c = {speed_over_c})")]
    Superluminal { speed_over_c: f64 },

    #[error("Light-time equation has no solution (c² - v² <= 0)")]
    NoLightTimeSolution,

    #[error("Null position vector: direction is undefined")]
    NullPosition,

    #[error("Invalid reference ellipsoid: {0}")]
    InvalidEllipsoid(String),

    #[error("Invalid astrometry parameter: {0}")]
    InvalidParameter(String),

    #[error("Ephemeris supplier error: {0}")]
    Ephemeris(String),
}

impl PartialEq for AstrometryError {
    fn eq(&self, other: &Self) -> bool {
        use AstrometryError::*;
        match (self, other) {
            (UnacceptableDate(a), UnacceptableDate(b)) => a == b,
            // The measured speed is diagnostic only: equality if same variant
            (Superluminal { .. }, Superluminal { .. }) => true,
            (InvalidEllipsoid(a), InvalidEllipsoid(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (Ephemeris(a), Ephemeris(b)) => a == b,

            (NoLightTimeSolution, NoLightTimeSolution) => true,
            (NullPosition, NullPosition) => true,

            _ => false,
        }
    }
}
