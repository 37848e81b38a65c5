//! # Observer & Site Geometry
//!
//! This module gathers **terrestrial site handling** for the observed-place transforms:
//!
//! - A [`Site`](crate::observers::Site) type storing geodetic longitude, latitude and height
//!   together with the polar-motion coordinates of the date.
//! - The geodetic → geocentric conversion on a reference [`Ellipsoid`](crate::observers::Ellipsoid)
//!   ([`geodetic_to_geocentric`](crate::observers::geodetic_to_geocentric)).
//! - The CIRS position and velocity of a site
//!   ([`terrestrial_site_state`](crate::observers::terrestrial_site_state)), which accounts for
//!   polar motion and Earth rotation.
//! - Two [`SiteMotion`](crate::ephemeris::SiteMotion) suppliers:
//!   [`Wgs84Site`](crate::observers::Wgs84Site) for real observatories and
//!   [`Geocenter`](crate::observers::Geocenter) for a fictitious observer at the center of
//!   the Earth (no diurnal motion).
//!
//! ## Frames & conventions
//!
//! ```text
//! ITRS (site on ellipsoid) --(polar motion W^T)--> TIRS --(Earth rotation R3(-θ))--> CIRS
//! ```
//!
//! ## Units
//!
//! - Longitudes (east positive) and latitudes (geodetic): **radians**.
//! - Heights above the ellipsoid and geocentric positions: **meters**.
//! - Velocities: **meters/second**, from `ω × r` with ω the IAU 2000 Earth rotation rate.
//! - `xp`, `yp`: **radians**.
//!
//! ## Errors
//!
//! [`geodetic_to_geocentric`](crate::observers::geodetic_to_geocentric) returns
//! [`AstrometryError::InvalidEllipsoid`](crate::astrometry_errors::AstrometryError::InvalidEllipsoid)
//! for a non-physical ellipsoid (non-positive radius, flattening outside [0, 1)).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::astrometry_errors::AstrometryError;
use crate::constants::{
    Degree, Meter, Radian, EARTH_FLATTENING, EARTH_MAJOR_AXIS, EARTH_ROTATION_RATE, RADEG,
};
use crate::ephemeris::SiteMotion;
use crate::ref_system::polar_motion_matrix;
use crate::state_vector::StateVector;

/// Terrestrial observing site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Longitude (radians, east positive)
    pub longitude: Radian,
    /// Geodetic latitude (radians)
    pub latitude: Radian,
    /// Height above the reference ellipsoid (meters)
    pub height: Meter,
    /// Polar motion x coordinate (radians)
    #[serde(default)]
    pub xp: Radian,
    /// Polar motion y coordinate (radians)
    #[serde(default)]
    pub yp: Radian,
}

impl Site {
    /// Site from geodetic coordinates in radians, without polar motion.
    pub fn new(longitude: Radian, latitude: Radian, height: Meter) -> Self {
        Site {
            longitude,
            latitude,
            height,
            xp: 0.0,
            yp: 0.0,
        }
    }

    /// Site from geodetic coordinates given in degrees.
    ///
    /// Arguments
    /// ---------
    /// * `longitude`: east longitude in degrees.
    /// * `latitude`: geodetic latitude in degrees.
    /// * `height`: height above the ellipsoid in meters.
    pub fn from_degrees(longitude: Degree, latitude: Degree, height: Meter) -> Self {
        Site::new(longitude * RADEG, latitude * RADEG, height)
    }

    /// Same site with the polar motion of the date.
    pub fn with_polar_motion(self, xp: Radian, yp: Radian) -> Self {
        Site { xp, yp, ..self }
    }
}

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius (meters)
    pub equatorial_radius: Meter,
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        equatorial_radius: EARTH_MAJOR_AXIS,
        flattening: EARTH_FLATTENING,
    };
}

/// Convert geodetic coordinates to a geocentric position.
///
/// Arguments
/// ---------
/// * `ellipsoid`: reference ellipsoid.
/// * `longitude`: longitude (radians, east positive).
/// * `latitude`: geodetic latitude (radians).
/// * `height`: height above the ellipsoid (meters).
///
/// Returns
/// -------
/// * The geocentric position in meters, body-fixed frame.
///
/// Details
/// -------
/// ```text
/// w = (1 − f)²,  d = cos²φ + w sin²φ
/// ac = a / √d,   as = w · ac
/// r = (ac + h) cos φ
/// x = r cos λ,  y = r sin λ,  z = (as + h) sin φ
/// ```
///
/// Errors
/// ------
/// * [`AstrometryError::InvalidEllipsoid`] if `a ≤ 0`, `f ∉ [0, 1)` or `d ≤ 0`.
pub fn geodetic_to_geocentric(
    ellipsoid: &Ellipsoid,
    longitude: Radian,
    latitude: Radian,
    height: Meter,
) -> Result<Vector3<f64>, AstrometryError> {
    let a = ellipsoid.equatorial_radius;
    let f = ellipsoid.flattening;
    if a.is_nan() || a <= 0.0 {
        return Err(AstrometryError::InvalidEllipsoid(format!(
            "equatorial radius must be > 0 (got {a})"
        )));
    }
    if !(0.0..1.0).contains(&f) {
        return Err(AstrometryError::InvalidEllipsoid(format!(
            "flattening must lie in [0, 1) (got {f})"
        )));
    }

    let (sp, cp) = latitude.sin_cos();
    let w = (1.0 - f) * (1.0 - f);
    let d = cp * cp + w * sp * sp;
    if d <= 0.0 {
        return Err(AstrometryError::InvalidEllipsoid(
            "degenerate ellipsoid at this latitude".into(),
        ));
    }
    let ac = a / d.sqrt();
    let a_s = w * ac;

    let r = (ac + height) * cp;
    Ok(Vector3::new(
        r * longitude.cos(),
        r * longitude.sin(),
        (a_s + height) * sp,
    ))
}

/// Position and velocity of a terrestrial site in the CIRS.
///
/// Arguments
/// ---------
/// * `ellipsoid`: reference ellipsoid for the site coordinates.
/// * `site`: geodetic coordinates and polar motion.
/// * `theta`: Earth rotation angle (radians).
/// * `sp`: TIO locator s′ (radians).
///
/// Returns
/// -------
/// * The site state in meters and meters/second. The velocity only contains the
///   rotation of the Earth: polar motion and precession-nutation rates are neglected.
///
/// Remarks
/// -------
/// * The ITRS position is brought to the TIRS with the transpose of the polar-motion
///   matrix, then rotated by θ around the CIP.
pub fn terrestrial_site_state(
    ellipsoid: &Ellipsoid,
    site: &Site,
    theta: Radian,
    sp: Radian,
) -> Result<StateVector, AstrometryError> {
    let itrs = geodetic_to_geocentric(ellipsoid, site.longitude, site.latitude, site.height)?;

    let tirs = polar_motion_matrix(site.xp, site.yp, sp).transpose() * itrs;
    let (x, y, z) = (tirs.x, tirs.y, tirs.z);

    let (s, c) = theta.sin_cos();
    Ok(StateVector::new(
        Vector3::new(c * x - s * y, s * x + c * y, z),
        Vector3::new(
            EARTH_ROTATION_RATE * (-s * x - c * y),
            EARTH_ROTATION_RATE * (c * x - s * y),
            0.0,
        ),
    ))
}

/// Site motion on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wgs84Site;

impl SiteMotion for Wgs84Site {
    fn site_state(
        &self,
        site: &Site,
        theta: Radian,
        sp: Radian,
    ) -> Result<StateVector, AstrometryError> {
        terrestrial_site_state(&Ellipsoid::WGS84, site, theta, sp)
    }
}

/// Observer at the center of the Earth: null position and velocity whatever the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geocenter;

impl SiteMotion for Geocenter {
    fn site_state(
        &self,
        _site: &Site,
        _theta: Radian,
        _sp: Radian,
    ) -> Result<StateVector, AstrometryError> {
        Ok(StateVector::zero())
    }
}

#[cfg(test)]
mod observer_test {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_site_constructor() {
        let site = Site::from_degrees(289.25058, -30.2446, 2647.);
        assert_relative_eq!(site.longitude, 289.25058_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(site.latitude, (-30.2446_f64).to_radians(), epsilon = 1e-12);
        assert_eq!(site.xp, 0.0);

        let site = site.with_polar_motion(1e-7, -2e-7);
        assert_eq!(site.xp, 1e-7);
        assert_eq!(site.yp, -2e-7);
        assert_eq!(site.height, 2647.);
    }

    #[test]
    fn test_geodetic_to_geocentric() {
        let xyz = geodetic_to_geocentric(&Ellipsoid::WGS84, 3.1, -0.5, 2500.0).unwrap();
        assert_relative_eq!(xyz.x, -5_599_000.557_704_994, epsilon = 1e-7);
        assert_relative_eq!(xyz.y, 233_011.672_234_791_5, epsilon = 1e-7);
        assert_relative_eq!(xyz.z, -3_040_909.470_698_336, epsilon = 1e-7);

        // On the equator, at zero longitude, the position is the equatorial radius
        let xyz = geodetic_to_geocentric(&Ellipsoid::WGS84, 0.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(xyz, Vector3::new(EARTH_MAJOR_AXIS, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_ellipsoid() {
        let bad = Ellipsoid {
            equatorial_radius: 6_378_137.0,
            flattening: 1.0,
        };
        assert!(matches!(
            geodetic_to_geocentric(&bad, 0.0, 0.5, 0.0),
            Err(AstrometryError::InvalidEllipsoid(_))
        ));

        let bad = Ellipsoid {
            equatorial_radius: -1.0,
            flattening: 0.0,
        };
        assert!(geodetic_to_geocentric(&bad, 0.0, 0.5, 0.0).is_err());
    }

    #[test]
    fn test_terrestrial_site_state() {
        let site = Site::new(2.0, 0.5, 3000.0).with_polar_motion(1e-6, -0.5e-6);
        let pv = terrestrial_site_state(&Ellipsoid::WGS84, &site, 5.0, 1e-8).unwrap();

        assert_relative_eq!(pv.position.x, 4_225_081.367_071_16, epsilon = 1e-6);
        assert_relative_eq!(pv.position.y, 3_681_943.215_856_198_7, epsilon = 1e-6);
        assert_relative_eq!(pv.position.z, 3_041_149.399_241_260_7, epsilon = 1e-6);
        assert_relative_eq!(pv.velocity.x, -268.491_538_936_599_97, epsilon = 1e-9);
        assert_relative_eq!(pv.velocity.y, 308.097_798_328_890_4, epsilon = 1e-9);
        assert_eq!(pv.velocity.z, 0.0);

        // Velocity is ω × r
        let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE);
        assert_relative_eq!(pv.velocity, omega.cross(&pv.position), epsilon = 1e-9);
    }

    #[test]
    fn test_geocenter_is_still() {
        let site = Site::from_degrees(203.74409, 20.707233557, 3067.694);
        let pv = Geocenter.site_state(&site, 1.0, 0.0).unwrap();
        assert_eq!(pv, StateVector::zero());

        let pv = Wgs84Site.site_state(&site, 1.0, 0.0).unwrap();
        assert!(pv.position.norm() > 6.3e6);
    }
}
