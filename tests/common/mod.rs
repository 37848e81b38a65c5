#![allow(dead_code)]

use approx::assert_relative_eq;
use nalgebra::Vector3;
use starplace::astrometry::{AstrometryContext, RefractionCoefficients};
use starplace::astrometry_errors::AstrometryError;
use starplace::catalog::CatalogStar;
use starplace::ephemeris::{
    CelestialPoleModel, CipCoordinates, EarthEphemeris, EarthOrientation, EarthState,
};
use starplace::observers::{Site, Wgs84Site};
use starplace::ref_system::{angular_separation, radec_to_cartesian};
use starplace::state_vector::StateVector;
use starplace::status::{AstrometryWarning, Flagged};
use starplace::time::JulianDate;

/// TDB date of the reference Earth state (2013 April 2).
pub fn reference_tdb() -> JulianDate {
    JulianDate::new(2456384.5, 0.970031644)
}

pub fn reference_earth() -> EarthState {
    EarthState::new(
        StateVector::new(
            Vector3::new(-0.974170438, -0.211520082, -0.0917583024),
            Vector3::new(0.00364365824, -0.0154287319, -0.00668922024),
        ),
        Vector3::new(-0.973458265, -0.209215307, -0.0906996477),
    )
}

pub fn reference_cip() -> CipCoordinates {
    CipCoordinates::new(0.0013122272, -2.92808623e-5, 3.05749468e-8)
}

pub fn reference_site() -> Site {
    Site::new(-0.527800806, -1.2345856, 2738.0).with_polar_motion(2.47230737e-7, 1.82640464e-6)
}

pub fn reference_refraction() -> RefractionCoefficients {
    RefractionCoefficients::new(0.000201418779, -2.36140831e-7)
}

/// Full ICRS ↔ observed context for a site in the Chilean Andes.
pub fn terrestrial_context() -> AstrometryContext {
    let orientation = EarthOrientation::new(reference_cip(), 3.14540971, -3.01974337e-11);
    AstrometryContext::terrestrial(
        reference_tdb(),
        &reference_earth(),
        &orientation,
        &reference_site(),
        reference_refraction(),
        &Wgs84Site,
    )
    .unwrap()
}

/// Earth ephemeris returning the same state at every date.
///
/// Dates more than `nominal_years` away from J2000 are flagged as dubious, dates more
/// than `limit_years` away are refused.
pub struct FrozenEphemeris {
    pub earth: EarthState,
    pub nominal_years: f64,
    pub limit_years: f64,
}

impl Default for FrozenEphemeris {
    fn default() -> Self {
        FrozenEphemeris {
            earth: reference_earth(),
            nominal_years: 100.0,
            limit_years: 1000.0,
        }
    }
}

impl EarthEphemeris for FrozenEphemeris {
    fn earth_state(&self, tdb: JulianDate) -> Result<Flagged<EarthState>, AstrometryError> {
        let years = tdb.julian_years_since_j2000().abs();
        if years > self.limit_years {
            Err(AstrometryError::UnacceptableDate(tdb))
        } else if years > self.nominal_years {
            Ok(Flagged::warn(self.earth, AstrometryWarning::DubiousYear))
        } else {
            Ok(Flagged::ok(self.earth))
        }
    }
}

/// Precession-nutation model returning the reference CIP at every date.
pub struct FrozenPole;

impl CelestialPoleModel for FrozenPole {
    fn cip(&self, _tt: JulianDate) -> CipCoordinates {
        reference_cip()
    }
}

/// Assert that two catalog stars have the same position (within `epsilon` radians on
/// the sky) and the same space motion.
pub fn assert_star_close(actual: &CatalogStar, expected: &CatalogStar, epsilon: f64) {
    let separation = angular_separation(
        &radec_to_cartesian(actual.ra, actual.dec),
        &radec_to_cartesian(expected.ra, expected.dec),
    );
    assert!(
        separation < epsilon,
        "positions differ by {separation:e} rad: {actual:?} vs {expected:?}"
    );
    assert_relative_eq!(actual.pm_ra, expected.pm_ra, epsilon = epsilon);
    assert_relative_eq!(actual.pm_dec, expected.pm_dec, epsilon = epsilon);
    assert_relative_eq!(actual.parallax, expected.parallax, epsilon = epsilon);
    assert_relative_eq!(
        actual.radial_velocity,
        expected.radial_velocity,
        epsilon = epsilon
    );
}
