use tracing::debug;

use super::space_motion::{catalog_to_state, propagate_state, state_to_catalog};
use super::CatalogStar;
use crate::astrometry_errors::AstrometryError;
use crate::ref_system::{angular_separation, radec_to_cartesian};
use crate::status::{AstrometryWarning, Flagged};
use crate::time::JulianDate;

/// Smallest parallax used by [`propagate_safe`] (arcsec)
const SAFE_PARALLAX_MIN: f64 = 5e-7;

/// Factor turning one year of proper motion (radians) into the smallest parallax
/// (arcsec) compatible with a transverse speed below about c / 2.
const SAFE_PARALLAX_FACTOR: f64 = 326.0;

/// Update the catalog parameters of a star from one epoch to another.
///
/// Arguments
/// ---------
/// * `star`: catalog parameters at `from`.
/// * `from`: first epoch (TDB).
/// * `to`: second epoch (TDB).
///
/// Returns
/// -------
/// * The catalog parameters at `to`, carrying the warnings of [`catalog_to_state`].
///
/// Errors
/// ------
/// * [`AstrometryError::Superluminal`] when the star moves faster than light.
/// * [`AstrometryError::NoLightTimeSolution`] from [`propagate_state`].
///
/// Details
/// -------
/// The star is converted to a barycentric state, moved along a straight line at
/// constant speed with the light time taken into account at both epochs, and converted
/// back to catalog parameters. The radial velocity is therefore updated as well
/// (perspective acceleration).
pub fn propagate(
    star: &CatalogStar,
    from: JulianDate,
    to: JulianDate,
) -> Result<Flagged<CatalogStar>, AstrometryError> {
    let mut status = Flagged::ok(());
    let pv1 = status.absorb(catalog_to_state(star)?);

    let dt = from.days_until(&to);
    let pv2 = propagate_state(&pv1, dt)?;
    let moved = state_to_catalog(&pv2)?;

    debug!("star propagated over {} days", dt);
    Ok(status.with_value(moved))
}

/// Same as [`propagate`], with a parallax override for stars of small or unknown
/// parallax.
///
/// A parallax of zero, or a parallax too small for the proper motion, puts the star so
/// far away that its transverse velocity becomes huge. Before propagating, the parallax
/// is raised to the larger of `326 · μ` (μ the proper motion over one year, radians) and
/// 5e-7 arcsec; the propagated parallax is then meaningless but the position and proper
/// motion are safe. An override is reported as [`AstrometryWarning::ParallaxFloored`].
pub fn propagate_safe(
    star: &CatalogStar,
    from: JulianDate,
    to: JulianDate,
) -> Result<Flagged<CatalogStar>, AstrometryError> {
    let pm = angular_separation(
        &radec_to_cartesian(star.ra, star.dec),
        &radec_to_cartesian(star.ra + star.pm_ra, star.dec + star.pm_dec),
    );

    let floor = (SAFE_PARALLAX_FACTOR * pm).max(SAFE_PARALLAX_MIN);
    let overridden = star.parallax < floor;
    let safe_star = CatalogStar {
        parallax: star.parallax.max(floor),
        ..*star
    };

    let mut moved = propagate(&safe_star, from, to)?;
    if overridden {
        moved.push_warning(AstrometryWarning::ParallaxFloored);
    }
    Ok(moved)
}
