use nalgebra::Vector3;
use tracing::{trace, warn};

use super::CatalogStar;
use crate::astrometry_errors::AstrometryError;
use crate::constants::{
    ARCSEC_PER_RADIAN, AU_LIGHT_TIME, AU_M, DAYS_PER_JULIAN_YEAR, PARALLAX_FLOOR, RADSEC,
    SECONDS_PER_DAY, SPEED_CEILING, VLIGHT_AU,
};
use crate::ref_system::anp;
use crate::state_vector::{SphericalState, StateVector};
use crate::status::{AstrometryWarning, Flagged};

/// Iteration cap of the relativistic Doppler correction
const RELATIVISTIC_MAX_ITERATIONS: usize = 100;

/// km/s to au/day
const KMS_TO_AU_PER_DAY: f64 = SECONDS_PER_DAY * 1e3 / AU_M;

/// Proper motion and parallax.
///
/// Arguments
/// ---------
/// * `star`: catalog position (ICRS, epoch J2000.0) and space motion.
/// * `pmt`: proper-motion time interval (SSB, Julian years), usually the `pmt` of an
///   [`AstrometryContext`](crate::astrometry::AstrometryContext).
/// * `pob`: barycentric position of the observer (au).
///
/// Returns
/// -------
/// * The coordinate direction of the star (unit vector, BCRS).
///
/// Details
/// -------
/// The proper-motion time interval is corrected for the Rømer delay of the observer,
/// and the radial velocity enters the space motion as the change of parallax
/// `px · rv`. Aberration and light deflection are not included.
pub fn proper_motion_parallax(star: &CatalogStar, pmt: f64, pob: &Vector3<f64>) -> Vector3<f64> {
    // km/s to au/year
    let vf = KMS_TO_AU_PER_DAY * DAYS_PER_JULIAN_YEAR;
    // Light time for 1 au, Julian years
    let aulty = AU_LIGHT_TIME / SECONDS_PER_DAY / DAYS_PER_JULIAN_YEAR;

    let (sr, cr) = star.ra.sin_cos();
    let (sd, cd) = star.dec.sin_cos();
    let p = Vector3::new(cr * cd, sr * cd, sd);

    let dt = pmt + p.dot(pob) * aulty;

    let pxr = star.parallax * RADSEC;
    let w = vf * star.radial_velocity * pxr;
    let pdz = star.pm_dec * p.z;
    let pm = Vector3::new(
        -star.pm_ra * p.y - pdz * cr + w * p.x,
        star.pm_ra * p.x - pdz * sr + w * p.y,
        star.pm_dec * cd + w * p.z,
    );

    (p + dt * pm - pxr * pob).normalize()
}

/// Convert catalog parameters to a barycentric position and velocity.
///
/// Arguments
/// ---------
/// * `star`: catalog position, proper motion, parallax and radial velocity.
///
/// Returns
/// -------
/// * The state in au and au/day. Flagged with:
///   - [`AstrometryWarning::ParallaxFloored`] when the parallax is below
///     [`PARALLAX_FLOOR`] and has been raised to it (the star is then placed at a large
///     but finite distance),
///   - [`AstrometryWarning::ExcessiveSpeed`] when the space velocity exceeds
///     [`SPEED_CEILING`] · c; the velocity is then set to zero,
///   - [`AstrometryWarning::RelativisticNotConverged`] when the Doppler correction did
///     not settle.
///
/// Errors
/// ------
/// * [`AstrometryError::Superluminal`] when the catalog space velocity reaches c.
///
/// Details
/// -------
/// The radial velocity of a catalog is the observed Doppler shift, which is not the
/// rate of change of distance. The radial and transverse components `βr`, `βt` of the
/// inertial velocity (units of c) satisfy
/// ```text
/// βr = (1 + βr) · βr_cat + δ,   βt = (1 + βr) · βt_cat,   δ = −β² / (√(1 − β²) + 1)
/// ```
/// with `β² = βr² + βt²`. The system is solved iteratively, stopping when both the
/// Doppler factor `1 + βr` and `δ` stop improving.
pub fn catalog_to_state(star: &CatalogStar) -> Result<Flagged<StateVector>, AstrometryError> {
    let mut status = Flagged::ok(());

    let px = if star.parallax >= PARALLAX_FLOOR {
        star.parallax
    } else {
        status.push_warning(AstrometryWarning::ParallaxFloored);
        PARALLAX_FLOOR
    };

    let mut pv = StateVector::from_spherical(&SphericalState {
        theta: star.ra,
        phi: star.dec,
        r: ARCSEC_PER_RADIAN / px,
        theta_dot: star.pm_ra / DAYS_PER_JULIAN_YEAR,
        phi_dot: star.pm_dec / DAYS_PER_JULIAN_YEAR,
        r_dot: KMS_TO_AU_PER_DAY * star.radial_velocity,
    });

    let speed_over_c = pv.velocity.norm() / VLIGHT_AU;
    if speed_over_c >= 1.0 {
        warn!("superluminal catalog star: v/c = {}", speed_over_c);
        return Err(AstrometryError::Superluminal { speed_over_c });
    }
    if speed_over_c > SPEED_CEILING {
        status.push_warning(AstrometryWarning::ExcessiveSpeed);
        pv.velocity = Vector3::zeros();
    }

    // Radial and transverse components of the velocity
    let x = pv.position.normalize();
    let vsr = x.dot(&pv.velocity);
    let usr = vsr * x;
    let ust = pv.velocity - usr;
    let vst = ust.norm();

    let betsr = vsr / VLIGHT_AU;
    let betst = vst / VLIGHT_AU;

    let mut betr = betsr;
    let mut bett = betst;
    let (mut d, mut del) = (0.0, 0.0);
    let (mut od, mut odel, mut odd, mut oddel) = (0.0, 0.0, 0.0, 0.0);
    let mut converged = false;

    for i in 0..RELATIVISTIC_MAX_ITERATIONS {
        d = 1.0 + betr;
        let w = betr * betr + bett * bett;
        del = -w / ((1.0 - w).sqrt() + 1.0);
        betr = d * betsr + del;
        bett = d * betst;
        if i > 0 {
            let dd = (d - od).abs();
            let ddel = (del - odel).abs();
            if i > 1 && dd >= odd && ddel >= oddel {
                trace!("relativistic correction settled after {} iterations", i);
                converged = true;
                break;
            }
            odd = dd;
            oddel = ddel;
        }
        od = d;
        odel = del;
    }
    if !converged {
        warn!("relativistic correction not converged for star at ra = {}", star.ra);
        status.push_warning(AstrometryWarning::RelativisticNotConverged);
    }

    let w = if betsr != 0.0 { d + del / betsr } else { 1.0 };
    pv.velocity = w * usr + d * ust;

    Ok(status.with_value(pv))
}

/// Convert a barycentric position and velocity to catalog parameters.
///
/// Arguments
/// ---------
/// * `pv`: barycentric state (au, au/day).
///
/// Returns
/// -------
/// * The catalog star, right ascension in [0, 2π).
///
/// Errors
/// ------
/// * [`AstrometryError::NullPosition`] for a null position: the direction is undefined.
/// * [`AstrometryError::Superluminal`] when the velocity reaches c.
///
/// Remarks
/// -------
/// * Inverse of [`catalog_to_state`]: the inertial radial velocity is turned back into
///   the observed Doppler radial velocity.
pub fn state_to_catalog(pv: &StateVector) -> Result<CatalogStar, AstrometryError> {
    let r = pv.position.norm();
    if r == 0.0 {
        return Err(AstrometryError::NullPosition);
    }
    let x = pv.position / r;

    let vr = x.dot(&pv.velocity);
    let ur = vr * x;
    let ut = pv.velocity - ur;
    let vt = ut.norm();

    let bett = vt / VLIGHT_AU;
    let betr = vr / VLIGHT_AU;
    let d = 1.0 + betr;
    let w = betr * betr + bett * bett;
    if d == 0.0 || w >= 1.0 {
        let speed_over_c = w.sqrt();
        warn!("superluminal state vector: v/c = {}", speed_over_c);
        return Err(AstrometryError::Superluminal { speed_over_c });
    }
    let del = -w / ((1.0 - w).sqrt() + 1.0);

    let ust = ut / d;
    let usr = x * (VLIGHT_AU * (betr - del) / d);
    let observed = StateVector::new(pv.position, usr + ust);

    let s = observed.to_spherical();
    Ok(CatalogStar {
        ra: anp(s.theta),
        dec: s.phi,
        pm_ra: s.theta_dot * DAYS_PER_JULIAN_YEAR,
        pm_dec: s.phi_dot * DAYS_PER_JULIAN_YEAR,
        parallax: ARCSEC_PER_RADIAN / s.r,
        radial_velocity: s.r_dot / KMS_TO_AU_PER_DAY,
    })
}

/// Linear space motion over `dt` days, consistent with the light time.
///
/// The input state is the star as seen at the first epoch, i.e. as it was when the
/// light left it. The returned state is the star as seen `dt` days later, accounting for
/// the change of light time along the way.
///
/// Arguments
/// ---------
/// * `pv`: barycentric state at the first epoch (au, au/day).
/// * `dt`: interval between the two observation epochs (days).
///
/// Errors
/// ------
/// * [`AstrometryError::NoLightTimeSolution`] when `c² − v² ≤ 0`.
///
/// Details
/// -------
/// With `tl1 = |p| / c`, the star is first advanced by `dt + tl1`; the light time `tl2`
/// from that point is the positive root of
/// ```text
/// (c² − v²) tl2² + 2 (p · v) tl2 − |p|² = 0
/// ```
/// and the result is the first state advanced by `dt + tl1 − tl2`.
pub fn propagate_state(pv: &StateVector, dt: f64) -> Result<StateVector, AstrometryError> {
    let tl1 = pv.position.norm() / VLIGHT_AU;

    let ahead = pv.advance(dt + tl1);
    let r2 = ahead.position.norm_squared();
    let rdv = ahead.position.dot(&ahead.velocity);
    let v2 = ahead.velocity.norm_squared();
    let c2mv2 = VLIGHT_AU * VLIGHT_AU - v2;
    if c2mv2 <= 0.0 {
        return Err(AstrometryError::NoLightTimeSolution);
    }
    let tl2 = (-rdv + (rdv * rdv + c2mv2 * r2).sqrt()) / c2mv2;

    Ok(pv.advance(dt + (tl1 - tl2)))
}
