//! # Ephemeris and Earth-orientation suppliers
//!
//! The astrometry core does not evaluate planetary ephemerides nor precession-nutation
//! series itself. It consumes their output through the small traits defined here, so that
//! any provider (JPL kernels, analytic series, a table read from disk, a test fixture) can
//! be plugged in:
//!
//! - [`EarthEphemeris`]: barycentric position/velocity and heliocentric position of the
//!   Earth at a TDB date,
//! - [`CelestialPoleModel`]: CIP coordinates `X`, `Y` and the CIO locator `s` at a TT date,
//! - [`SiteMotion`]: geocentric position/velocity of a terrestrial site, given the Earth
//!   rotation angle and the TIO locator.
//!
//! Implementations of [`SiteMotion`] for the WGS84 ellipsoid and for an observer at the
//! geocenter live in [`crate::observers`].

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::astrometry_errors::AstrometryError;
use crate::constants::Radian;
use crate::observers::Site;
use crate::state_vector::StateVector;
use crate::status::Flagged;
use crate::time::JulianDate;

/// State of the Earth at one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthState {
    /// Barycentric position (au) and velocity (au/day), BCRS.
    pub barycentric: StateVector,
    /// Heliocentric position (au), BCRS.
    pub heliocentric_position: Vector3<f64>,
}

impl EarthState {
    pub fn new(barycentric: StateVector, heliocentric_position: Vector3<f64>) -> Self {
        EarthState {
            barycentric,
            heliocentric_position,
        }
    }
}

/// Celestial intermediate pole coordinates and CIO locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CipCoordinates {
    pub x: f64,
    pub y: f64,
    /// CIO locator (radians)
    pub s: Radian,
}

impl CipCoordinates {
    pub fn new(x: f64, y: f64, s: Radian) -> Self {
        CipCoordinates { x, y, s }
    }
}

/// Orientation of the Earth at one epoch: celestial pole, rotation angle and TIO locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthOrientation {
    pub cip: CipCoordinates,
    /// Earth rotation angle θ (radians)
    pub era: Radian,
    /// TIO locator s′ (radians)
    pub sp: Radian,
}

impl EarthOrientation {
    pub fn new(cip: CipCoordinates, era: Radian, sp: Radian) -> Self {
        EarthOrientation { cip, era, sp }
    }
}

/// Source of the Earth's barycentric and heliocentric state.
pub trait EarthEphemeris {
    /// Earth state at the TDB date `tdb`.
    ///
    /// Returns
    /// -------
    /// * `Ok(Flagged<EarthState>)`, flagged with
    ///   [`DubiousYear`](crate::status::AstrometryWarning::DubiousYear) when the date is outside
    ///   the nominal accuracy range of the ephemeris.
    /// * `Err(AstrometryError::UnacceptableDate)` when no state can be produced for the date.
    fn earth_state(&self, tdb: JulianDate) -> Result<Flagged<EarthState>, AstrometryError>;
}

/// Source of the CIP coordinates (precession-nutation model).
pub trait CelestialPoleModel {
    /// CIP `X`, `Y` and CIO locator `s` at the TT date `tt`.
    fn cip(&self, tt: JulianDate) -> CipCoordinates;
}

/// Geocentric position and velocity of a terrestrial site.
pub trait SiteMotion {
    /// Site state in the CIRS, in meters and meters/second.
    ///
    /// Arguments
    /// ---------
    /// * `site`: geodetic coordinates and polar motion.
    /// * `theta`: Earth rotation angle (radians).
    /// * `sp`: TIO locator s′ (radians).
    fn site_state(
        &self,
        site: &Site,
        theta: Radian,
        sp: Radian,
    ) -> Result<StateVector, AstrometryError>;
}
