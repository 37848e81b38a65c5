//! # Transform pipeline
//!
//! Star-dependent part of the astrometry: every function here takes a prepared
//! [`AstrometryContext`] and converts one star.
//!
//! ## Forward
//!
//! ```text
//! catalog (ICRS, epoch) ──space motion──▶ astrometric ──deflection──▶ natural
//!        ──aberration──▶ proper (GCRS) ──bpn──▶ CIRS
//!        ──Earth rotation, polar motion──▶ local ──diurnal aberration──▶ topocentric
//!        ──refraction──▶ observed
//! ```
//!
//! | Function | From | To |
//! |---|---|---|
//! | [`icrs_to_astrometric`] | catalog | astrometric |
//! | [`icrs_to_cirs`] | catalog | CIRS |
//! | [`icrs_to_cirs_fixed`] | astrometric (no space motion) | CIRS |
//! | [`icrs_to_cirs_with_bodies`] | catalog | CIRS, several deflectors |
//! | [`cirs_to_observed`] | CIRS | observed |
//! | [`icrs_to_observed`] | catalog | observed |
//!
//! ## Inverse
//!
//! | Function | From | To |
//! |---|---|---|
//! | [`observed_to_cirs`] | observed | CIRS |
//! | [`cirs_to_icrs`] | CIRS | astrometric |
//! | [`cirs_to_icrs_with_bodies`] | CIRS | astrometric, several deflectors |
//! | [`observed_to_icrs`] | observed | astrometric |
//! | [`astrometric_to_catalog`] | astrometric | catalog |
//! | [`observed_to_catalog`] | observed | catalog |
//!
//! The inverse steps removing refraction, light deflection and space motion are
//! iterative; their stopping rule is given by [`InverseParams`], and an iteration that
//! hits the cap is reported in the [`Flagged`] result, never as an error.
//!
//! Right ascensions are returned in [0, 2π), azimuths in [0, 2π) from north through
//! east, hour angles in [−π, π).

use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::astrometry::aberration::{aberrate, unaberrate};
use crate::astrometry::context::AstrometryContext;
use crate::astrometry::deflection::{deflect_by_bodies, deflect_by_sun, LightDeflectingBody};
use crate::astrometry::refraction::{refract, unrefract};
use crate::catalog::{proper_motion_parallax, CatalogStar};
use crate::constants::Radian;
use crate::params::InverseParams;
use crate::ref_system::{anp, cartesian_to_radec, radec_to_cartesian};
use crate::status::{AstrometryWarning, Flagged};

/// Right ascension and declination (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaDec {
    pub ra: Radian,
    pub dec: Radian,
}

impl RaDec {
    pub fn new(ra: Radian, dec: Radian) -> Self {
        RaDec { ra, dec }
    }

    pub fn to_unit_vector(&self) -> Vector3<f64> {
        radec_to_cartesian(self.ra, self.dec)
    }

    /// Direction of a vector, right ascension in [0, 2π).
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        let (ra, dec, _) = cartesian_to_radec(*v);
        RaDec { ra, dec }
    }
}

/// Observed place of a star, all angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPlace {
    /// Azimuth, north zero, east π/2
    pub azimuth: Radian,
    pub zenith_distance: Radian,
    pub hour_angle: Radian,
    pub declination: Radian,
    /// CIO-based right ascension
    pub right_ascension: Radian,
}

/// Observed coordinates given to the inverse transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObservedCoordinates {
    AzimuthZenith {
        azimuth: Radian,
        zenith_distance: Radian,
    },
    HourAngleDeclination {
        hour_angle: Radian,
        declination: Radian,
    },
    /// CIO-based right ascension and declination
    RightAscensionDeclination { ra: Radian, dec: Radian },
}

impl From<&ObservedPlace> for ObservedCoordinates {
    fn from(place: &ObservedPlace) -> Self {
        ObservedCoordinates::AzimuthZenith {
            azimuth: place.azimuth,
            zenith_distance: place.zenith_distance,
        }
    }
}

/// Proper direction (GCRS) to CIRS right ascension and declination.
fn proper_to_cirs(ppr: &Vector3<f64>, ctx: &AstrometryContext) -> RaDec {
    RaDec::from_vector(&(ctx.bpn * ppr))
}

/// Astrometric place of a catalog star.
///
/// Arguments
/// ---------
/// * `star`: catalog parameters (ICRS, epoch J2000.0).
/// * `ctx`: astrometry context; only `pmt` and `eb` are used.
///
/// Returns
/// -------
/// * The ICRS direction of the star seen from the observer at the date of the context,
///   accounting for proper motion and parallax only.
pub fn icrs_to_astrometric(star: &CatalogStar, ctx: &AstrometryContext) -> RaDec {
    RaDec::from_vector(&proper_motion_parallax(star, ctx.pmt, &ctx.eb))
}

/// Catalog star to CIRS right ascension and declination.
///
/// Arguments
/// ---------
/// * `star`: catalog parameters (ICRS, epoch J2000.0).
/// * `ctx`: astrometry context with the barycentric part and the `bpn` matrix.
///
/// Returns
/// -------
/// * CIRS right ascension and declination. With `bpn = I` the result is the GCRS
///   apparent place.
///
/// Remarks
/// -------
/// * Only the Sun deflects the light; see [`icrs_to_cirs_with_bodies`] for planets.
pub fn icrs_to_cirs(star: &CatalogStar, ctx: &AstrometryContext) -> RaDec {
    let pco = proper_motion_parallax(star, ctx.pmt, &ctx.eb);
    let pnat = deflect_by_sun(&pco, &ctx.eh, ctx.em);
    let ppr = aberrate(&pnat, &ctx.v, ctx.em, ctx.bm1);
    proper_to_cirs(&ppr, ctx)
}

/// Astrometric place to CIRS, for a star without space motion.
///
/// Same as [`icrs_to_cirs`] on a star with zero proper motion, parallax and radial
/// velocity, skipping the space-motion step.
pub fn icrs_to_cirs_fixed(astrometric: &RaDec, ctx: &AstrometryContext) -> RaDec {
    let pco = astrometric.to_unit_vector();
    let pnat = deflect_by_sun(&pco, &ctx.eh, ctx.em);
    let ppr = aberrate(&pnat, &ctx.v, ctx.em, ctx.bm1);
    proper_to_cirs(&ppr, ctx)
}

/// Catalog star to CIRS, with light deflection by several bodies.
///
/// Arguments
/// ---------
/// * `star`: catalog parameters (ICRS, epoch J2000.0).
/// * `ctx`: astrometry context.
/// * `bodies`: deflecting bodies, see [`deflect_by_bodies`]; include the Sun, usually last.
pub fn icrs_to_cirs_with_bodies(
    star: &CatalogStar,
    ctx: &AstrometryContext,
    bodies: &[LightDeflectingBody],
) -> RaDec {
    let pco = proper_motion_parallax(star, ctx.pmt, &ctx.eb);
    let pnat = deflect_by_bodies(bodies, &ctx.eb, &pco);
    let ppr = aberrate(&pnat, &ctx.v, ctx.em, ctx.bm1);
    proper_to_cirs(&ppr, ctx)
}

/// CIRS to observed place.
///
/// Arguments
/// ---------
/// * `cirs`: CIRS right ascension and declination.
/// * `ctx`: context with the site part (`eral`, `xpl`, `ypl`, `sphi`, `cphi`, `diurab`,
///   `refa`, `refb`).
///
/// Returns
/// -------
/// * The observed azimuth, zenith distance, hour angle, declination and right ascension.
///   Flagged [`AstrometryWarning::DegenerateGeometry`] when the star is within about
///   1e-6 rad of the zenith (azimuth undefined) or, with refraction, below the
///   clamp of the refraction model.
///
/// Details
/// -------
/// Polar motion is applied as small rotations in the local meridian frame, diurnal
/// aberration to first order in `diurab`, and refraction as a rotation toward the zenith
/// by the two-term model angle.
pub fn cirs_to_observed(cirs: &RaDec, ctx: &AstrometryContext) -> Flagged<ObservedPlace> {
    // CIRS RA,Dec to local, polar motion applied
    let v = radec_to_cartesian(cirs.ra - ctx.eral, cirs.dec);
    let (x, y, z) = (v.x, v.y, v.z);
    let (sx, cx) = ctx.xpl.sin_cos();
    let (sy, cy) = ctx.ypl.sin_cos();
    let xhd = cx * x + sx * z;
    let yhd = sx * sy * x + cy * y - cx * sy * z;
    let zhd = -sx * cy * x + sy * y + cx * cy * z;

    // Diurnal aberration
    let f = 1.0 - ctx.diurab * yhd;
    let xhdt = f * xhd;
    let yhdt = f * (yhd + ctx.diurab);
    let zhdt = f * zhd;

    // Cartesian -HA,Dec to Cartesian Az,El (S=0,E=90)
    let aet = Vector3::new(
        ctx.sphi * xhdt - ctx.cphi * zhdt,
        yhdt,
        ctx.cphi * xhdt + ctx.sphi * zhdt,
    );
    let azimuth = if aet.x != 0.0 || aet.y != 0.0 {
        anp(aet.y.atan2(-aet.x))
    } else {
        0.0
    };

    let mut status = Flagged::ok(());
    let aeo = status.absorb(refract(&aet, &ctx.refraction()));

    let zenith_distance = aeo.x.hypot(aeo.y).atan2(aeo.z);

    // Back to -HA,Dec
    let hd = Vector3::new(
        ctx.sphi * aeo.x + ctx.cphi * aeo.z,
        aeo.y,
        -ctx.cphi * aeo.x + ctx.sphi * aeo.z,
    );
    let hmobs = if hd.x != 0.0 || hd.y != 0.0 {
        hd.y.atan2(hd.x)
    } else {
        0.0
    };
    let declination = if hd.z != 0.0 {
        hd.z.atan2(hd.x.hypot(hd.y))
    } else {
        0.0
    };

    // atan2 gives (−π, π]; keep the hour angle in [−π, π) including for a signed zero
    let hour_angle = if hmobs <= -PI { -PI } else { -hmobs };

    status.with_value(ObservedPlace {
        azimuth,
        zenith_distance,
        hour_angle,
        declination,
        right_ascension: anp(ctx.eral + hmobs),
    })
}

/// Catalog star to observed place.
///
/// [`icrs_to_cirs`] followed by [`cirs_to_observed`]; the context must carry both the
/// barycentric and the site part (see
/// [`AstrometryContext::terrestrial`](crate::astrometry::AstrometryContext::terrestrial)).
pub fn icrs_to_observed(star: &CatalogStar, ctx: &AstrometryContext) -> Flagged<ObservedPlace> {
    let cirs = icrs_to_cirs(star, ctx);
    cirs_to_observed(&cirs, ctx)
}

/// Observed place to CIRS right ascension and declination.
///
/// Arguments
/// ---------
/// * `observed`: observed coordinates, in any of the three forms.
/// * `ctx`: context with the site part.
/// * `params`: stopping rule of the refraction removal.
///
/// Returns
/// -------
/// * CIRS right ascension and declination. Flagged
///   [`AstrometryWarning::RefractionNotConverged`] if the refraction removal hit the
///   iteration cap, and [`AstrometryWarning::DegenerateGeometry`] if the refraction model
///   was clamped.
///
/// Remarks
/// -------
/// * Diurnal aberration is removed to first order, leaving an error of order
///   `diurab²`, about 3e-13 rad.
pub fn observed_to_cirs(
    observed: &ObservedCoordinates,
    ctx: &AstrometryContext,
    params: &InverseParams,
) -> Flagged<RaDec> {
    let (sphi, cphi) = (ctx.sphi, ctx.cphi);

    let aeo = match *observed {
        ObservedCoordinates::AzimuthZenith {
            azimuth,
            zenith_distance,
        } => {
            let ce = zenith_distance.sin();
            Vector3::new(-azimuth.cos() * ce, azimuth.sin() * ce, zenith_distance.cos())
        }
        ObservedCoordinates::HourAngleDeclination {
            hour_angle,
            declination,
        } => local_from_hour_angle(hour_angle, declination, sphi, cphi),
        ObservedCoordinates::RightAscensionDeclination { ra, dec } => {
            local_from_hour_angle(ctx.eral - ra, dec, sphi, cphi)
        }
    };

    let az = if aeo.x != 0.0 || aeo.y != 0.0 {
        aeo.y.atan2(aeo.x)
    } else {
        0.0
    };
    let zdo = aeo.x.hypot(aeo.y).atan2(aeo.z);

    let mut status = Flagged::ok(());
    let zdt = status.absorb(unrefract(zdo, &ctx.refraction(), params));

    // Topocentric Az,El to -HA,Dec
    let ce = zdt.sin();
    let xaet = az.cos() * ce;
    let yaet = az.sin() * ce;
    let zaet = zdt.cos();
    let xmhda = sphi * xaet + cphi * zaet;
    let ymhda = yaet;
    let zmhda = -cphi * xaet + sphi * zaet;

    // Diurnal aberration
    let f = 1.0 + ctx.diurab * ymhda;
    let xhd = f * xmhda;
    let yhd = f * (ymhda - ctx.diurab);
    let zhd = f * zmhda;

    // Polar motion
    let (sx, cx) = ctx.xpl.sin_cos();
    let (sy, cy) = ctx.ypl.sin_cos();
    let v = Vector3::new(
        cx * xhd + sx * sy * yhd - sx * cy * zhd,
        cy * yhd + sy * zhd,
        sx * xhd - cx * sy * yhd + cx * cy * zhd,
    );

    let hma = if v.x != 0.0 || v.y != 0.0 {
        v.y.atan2(v.x)
    } else {
        0.0
    };
    let dec = v.z.atan2(v.x.hypot(v.y));

    status.with_value(RaDec::new(anp(ctx.eral + hma), dec))
}

/// Unit vector in the local Az,El frame for an hour angle and declination.
fn local_from_hour_angle(ha: Radian, dec: Radian, sphi: f64, cphi: f64) -> Vector3<f64> {
    let v = radec_to_cartesian(-ha, dec);
    Vector3::new(
        sphi * v.x - cphi * v.z,
        v.y,
        cphi * v.x + sphi * v.z,
    )
}

/// Remove light deflection by fixed-point iteration.
///
/// `deflect` maps an astrometric direction to the natural direction. The correction
/// `d = deflect(p) − p` is re-evaluated at `p = pnat − d` until it changes by less than
/// the tolerance.
fn undeflect<F>(pnat: &Vector3<f64>, params: &InverseParams, deflect: F) -> Flagged<Vector3<f64>>
where
    F: Fn(&Vector3<f64>) -> Vector3<f64>,
{
    let mut d = Vector3::zeros();
    let mut pco = *pnat;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations {
        iterations += 1;
        let before = (pnat - d).normalize();
        let after = deflect(&before);
        let dn = after - before;
        let change = (dn - d).norm();
        d = dn;
        pco = (pnat - d).normalize();
        if change < params.tolerance {
            converged = true;
            break;
        }
    }
    trace!("light deflection removed in {} iterations", iterations);

    if converged {
        Flagged::ok(pco)
    } else {
        warn!("light deflection not removed after {} iterations", iterations);
        Flagged::warn(pco, AstrometryWarning::DeflectionNotConverged { iterations })
    }
}

/// CIRS to astrometric place.
///
/// Arguments
/// ---------
/// * `cirs`: CIRS right ascension and declination.
/// * `ctx`: astrometry context with the barycentric part and the `bpn` matrix.
/// * `params`: stopping rule of the deflection removal.
///
/// Returns
/// -------
/// * The ICRS astrometric place. Flagged
///   [`AstrometryWarning::DeflectionNotConverged`] if the iteration cap was hit.
///
/// Remarks
/// -------
/// * Aberration is removed in closed form ([`unaberrate`]), light deflection by the Sun
///   iteratively.
pub fn cirs_to_icrs(
    cirs: &RaDec,
    ctx: &AstrometryContext,
    params: &InverseParams,
) -> Flagged<RaDec> {
    let ppr = ctx.bpn.transpose() * cirs.to_unit_vector();
    let pnat = unaberrate(&ppr, &ctx.v, ctx.em, ctx.bm1);

    undeflect(&pnat, params, |p| deflect_by_sun(p, &ctx.eh, ctx.em))
        .map(|p| RaDec::from_vector(&p))
}

/// CIRS to astrometric place, with light deflection by several bodies.
///
/// Same as [`cirs_to_icrs`] with the bodies of [`icrs_to_cirs_with_bodies`].
pub fn cirs_to_icrs_with_bodies(
    cirs: &RaDec,
    ctx: &AstrometryContext,
    bodies: &[LightDeflectingBody],
    params: &InverseParams,
) -> Flagged<RaDec> {
    let ppr = ctx.bpn.transpose() * cirs.to_unit_vector();
    let pnat = unaberrate(&ppr, &ctx.v, ctx.em, ctx.bm1);

    undeflect(&pnat, params, |p| deflect_by_bodies(bodies, &ctx.eb, p))
        .map(|p| RaDec::from_vector(&p))
}

/// Observed place to astrometric place.
///
/// [`observed_to_cirs`] followed by [`cirs_to_icrs`], warnings of both steps merged.
pub fn observed_to_icrs(
    observed: &ObservedCoordinates,
    ctx: &AstrometryContext,
    params: &InverseParams,
) -> Flagged<RaDec> {
    observed_to_cirs(observed, ctx, params).and_then(|cirs| cirs_to_icrs(&cirs, ctx, params))
}

/// Remove proper motion and parallax from an astrometric place.
///
/// Arguments
/// ---------
/// * `astrometric`: astrometric place at the date of `ctx`.
/// * `star`: space motion of the star (proper motion, parallax, radial velocity); its
///   position is not used.
/// * `ctx`: context giving `pmt` and the observer position `eb`.
/// * `params`: stopping rule.
///
/// Returns
/// -------
/// * `star` with the catalog position that produces `astrometric` through
///   [`icrs_to_astrometric`]. Flagged [`AstrometryWarning::ProperMotionNotConverged`] if
///   the iteration cap was hit.
///
/// Details
/// -------
/// The catalog direction `g` is corrected by the residual `target − pmpx(g)` until the
/// residual is below the tolerance. The space-motion map is close to a translation on
/// the sphere, so the iteration converges quickly.
pub fn astrometric_to_catalog(
    astrometric: &RaDec,
    star: &CatalogStar,
    ctx: &AstrometryContext,
    params: &InverseParams,
) -> Flagged<CatalogStar> {
    let target = astrometric.to_unit_vector();
    let mut g = target;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations {
        iterations += 1;
        let guess = RaDec::from_vector(&g);
        let moved = star.with_position(guess.ra, guess.dec);
        let seen = proper_motion_parallax(&moved, ctx.pmt, &ctx.eb);
        let residual = target - seen;
        g = (g + residual).normalize();
        if residual.norm() < params.tolerance {
            converged = true;
            break;
        }
    }
    trace!("space motion removed in {} iterations", iterations);

    let catalog = RaDec::from_vector(&g);
    let result = star.with_position(catalog.ra, catalog.dec);
    if converged {
        Flagged::ok(result)
    } else {
        warn!("space motion not removed after {} iterations", iterations);
        Flagged::warn(result, AstrometryWarning::ProperMotionNotConverged { iterations })
    }
}

/// Observed place to catalog position.
///
/// Full inverse of [`icrs_to_observed`]: [`observed_to_icrs`] then
/// [`astrometric_to_catalog`] with the space motion of `star`.
pub fn observed_to_catalog(
    observed: &ObservedCoordinates,
    star: &CatalogStar,
    ctx: &AstrometryContext,
    params: &InverseParams,
) -> Flagged<CatalogStar> {
    observed_to_icrs(observed, ctx, params)
        .and_then(|astrometric| astrometric_to_catalog(&astrometric, star, ctx, params))
}
