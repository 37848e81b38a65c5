//! # Astrometry context
//!
//! [`AstrometryContext`] gathers every star-independent quantity needed by the
//! transforms of [`crate::astrometry::transforms`]: the observer's barycentric state and
//! velocity, the bias-precession-nutation matrix, the site orientation and the
//! refraction constants. It is built once per observer and epoch, then shared
//! read-only by any number of star transforms.
//!
//! ## Builders
//!
//! | Builder | Use |
//! |---|---|
//! | [`AstrometryContext::geocentric`] | ICRS ↔ GCRS, geocentric observer, `bpn = I` |
//! | [`AstrometryContext::geocentric_cirs`] | ICRS ↔ CIRS, geocentric observer |
//! | [`AstrometryContext::topocentric`] | any observer with a known GCRS state, `bpn = I` |
//! | [`AstrometryContext::with_observer_offset`] | shift an existing context to an observer |
//! | [`AstrometryContext::observed_place`] | CIRS ↔ observed only |
//! | [`AstrometryContext::terrestrial`] | ICRS ↔ observed, terrestrial site |
//! | [`AstrometryContext::from_models`] | ICRS ↔ CIRS from ephemeris and pole suppliers |
//! | [`AstrometryContext::observing`] | ICRS ↔ observed from suppliers and weather |
//!
//! Between two observations of the same night the Earth rotation can be refreshed
//! alone with [`AstrometryContext::set_earth_rotation`].
//!
//! ## Units
//!
//! Positions in au, velocities in units of c, angles in radians. Observer states passed
//! to the builders are in meters and meters/second.
//!
//! Builders do not validate dates: the suppliers do.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::astrometry::refraction::{RefractionCoefficients, Weather};
use crate::astrometry_errors::AstrometryError;
use crate::constants::{Radian, AU_LIGHT_TIME, AU_M, SECONDS_PER_DAY, VLIGHT_MS};
use crate::ephemeris::{
    CelestialPoleModel, CipCoordinates, EarthEphemeris, EarthOrientation, EarthState, SiteMotion,
};
use crate::observers::Site;
use crate::ref_system::{anpm, celestial_to_intermediate, polar_motion_matrix, rotmt, Axis};
use crate::state_vector::StateVector;
use crate::status::Flagged;
use crate::time::{earth_rotation_angle, tio_locator, JulianDate, ObservationEpoch};

/// Star-independent astrometry parameters for one observer at one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AstrometryContext {
    /// Julian years since J2000.0 (TDB), for proper motion
    pub pmt: f64,
    /// Barycentric position of the observer (au)
    pub eb: Vector3<f64>,
    /// Heliocentric direction of the observer (unit vector)
    pub eh: Vector3<f64>,
    /// Distance from the Sun to the observer (au)
    pub em: f64,
    /// Barycentric velocity of the observer (units of c)
    pub v: Vector3<f64>,
    /// √(1 − |v|²)
    pub bm1: f64,
    /// Bias-precession-nutation matrix
    pub bpn: Matrix3<f64>,
    /// Longitude + s′ (radians)
    pub along: Radian,
    /// Polar motion x, in the local meridian frame (radians)
    pub xpl: Radian,
    /// Polar motion y, in the local meridian frame (radians)
    pub ypl: Radian,
    /// Sine of the geodetic latitude
    pub sphi: f64,
    /// Cosine of the geodetic latitude
    pub cphi: f64,
    /// Magnitude of the diurnal aberration vector (units of c)
    pub diurab: f64,
    /// Local Earth rotation angle (radians)
    pub eral: Radian,
    /// Refraction constant A (radians)
    pub refa: Radian,
    /// Refraction constant B (radians)
    pub refb: Radian,
}

impl Default for AstrometryContext {
    /// Observer at rest at 1 au from the Sun, on the equator of a non-rotating Earth,
    /// without refraction.
    fn default() -> Self {
        AstrometryContext {
            pmt: 0.0,
            eb: Vector3::zeros(),
            eh: Vector3::x(),
            em: 1.0,
            v: Vector3::zeros(),
            bm1: 1.0,
            bpn: Matrix3::identity(),
            along: 0.0,
            xpl: 0.0,
            ypl: 0.0,
            sphi: 0.0,
            cphi: 1.0,
            diurab: 0.0,
            eral: 0.0,
            refa: 0.0,
            refb: 0.0,
        }
    }
}

impl AstrometryContext {
    /// Context for a geocentric observer, with the matrix left to identity.
    ///
    /// Arguments
    /// ---------
    /// * `tdb`: TDB date.
    /// * `earth`: Earth barycentric state (au, au/day) and heliocentric position (au).
    ///
    /// Returns
    /// -------
    /// * A context for ICRS ↔ GCRS transforms.
    pub fn geocentric(tdb: JulianDate, earth: &EarthState) -> Self {
        AstrometryContext::topocentric(tdb, earth, &StateVector::zero())
    }

    /// Context for a geocentric observer, with the celestial-to-intermediate matrix.
    ///
    /// Arguments
    /// ---------
    /// * `tdb`: TDB date.
    /// * `earth`: Earth barycentric state and heliocentric position.
    /// * `cip`: CIP coordinates `X`, `Y` and CIO locator `s` of the date.
    ///
    /// Returns
    /// -------
    /// * A context for ICRS ↔ CIRS transforms.
    pub fn geocentric_cirs(tdb: JulianDate, earth: &EarthState, cip: &CipCoordinates) -> Self {
        let mut ctx = AstrometryContext::geocentric(tdb, earth);
        ctx.bpn = celestial_to_intermediate(cip.x, cip.y, cip.s);
        ctx
    }

    /// Context for an observer with a known geocentric state.
    ///
    /// Arguments
    /// ---------
    /// * `tdb`: TDB date.
    /// * `earth`: Earth barycentric state (au, au/day) and heliocentric position (au).
    /// * `observer`: geocentric position (m) and velocity (m/s) of the observer, GCRS.
    ///
    /// Returns
    /// -------
    /// * A context for ICRS ↔ GCRS transforms seen from the observer; `bpn = I`.
    pub fn topocentric(tdb: JulianDate, earth: &EarthState, observer: &StateVector) -> Self {
        let mut ctx = AstrometryContext {
            pmt: tdb.julian_years_since_j2000(),
            eb: earth.barycentric.position,
            v: earth.barycentric.velocity * (AU_LIGHT_TIME / SECONDS_PER_DAY),
            ..AstrometryContext::default()
        };
        ctx.shift_observer(observer, earth.heliocentric_position);

        debug!(
            "topocentric context at TDB {}: em = {} au, |v| = {} c",
            tdb.jd(),
            ctx.em,
            ctx.v.norm()
        );
        ctx
    }

    /// Same context, seen from an observer displaced from the current one.
    ///
    /// Arguments
    /// ---------
    /// * `observer`: position (m) and velocity (m/s) of the new observer relative to the
    ///   current one, GCRS. Usually applied to a [`AstrometryContext::geocentric`] context.
    ///
    /// Returns
    /// -------
    /// * A new context with `bpn = I`, like [`AstrometryContext::topocentric`]; `pmt`
    ///   and the site part are kept.
    pub fn with_observer_offset(&self, observer: &StateVector) -> Self {
        let mut ctx = *self;
        let heliocentric = self.eh * self.em;
        ctx.shift_observer(observer, heliocentric);
        ctx.bpn = Matrix3::identity();
        ctx
    }

    fn shift_observer(&mut self, observer: &StateVector, heliocentric: Vector3<f64>) {
        // m -> au, m/s -> au/day
        let dp = observer.position / AU_M;
        let dv = observer.velocity / (AU_M / SECONDS_PER_DAY);

        self.eb += dp;
        let ph = heliocentric + dp;
        self.em = ph.norm();
        self.eh = ph / self.em;
        self.v += dv * (AU_LIGHT_TIME / SECONDS_PER_DAY);
        self.bm1 = (1.0 - self.v.norm_squared()).sqrt();
    }

    /// Context for CIRS ↔ observed transforms only.
    ///
    /// The barycentric part is left neutral (see [`Default`]).
    ///
    /// Arguments
    /// ---------
    /// * `sp`: TIO locator s′ (radians).
    /// * `theta`: Earth rotation angle (radians).
    /// * `site`: geodetic site and polar motion.
    /// * `refraction`: refraction constants.
    /// * `motion`: supplier of the site velocity, used for the diurnal aberration.
    ///
    /// Errors
    /// ------
    /// * Whatever `motion` returns.
    pub fn observed_place(
        sp: Radian,
        theta: Radian,
        site: &Site,
        refraction: RefractionCoefficients,
        motion: &impl SiteMotion,
    ) -> Result<Self, AstrometryError> {
        let mut ctx = AstrometryContext::default();
        ctx.set_site_orientation(sp, theta, site, refraction, motion)?;
        Ok(ctx)
    }

    /// Refresh the site-dependent part of the context, barycentric part untouched.
    ///
    /// Sets `along`, `xpl`, `ypl`, `sphi`, `cphi`, `eral`, the refraction constants and
    /// the diurnal aberration from the CIRS velocity of the site. On error the context
    /// is left unchanged.
    pub fn set_site_orientation(
        &mut self,
        sp: Radian,
        theta: Radian,
        site: &Site,
        refraction: RefractionCoefficients,
        motion: &impl SiteMotion,
    ) -> Result<(), AstrometryError> {
        let pv = motion.site_state(site, theta, sp)?;
        let vel = pv.velocity;

        self.orient(sp, theta, site, refraction);
        self.diurab = vel.x.hypot(vel.y) / VLIGHT_MS;

        debug!(
            "site orientation: eral = {} rad, diurab = {}",
            self.eral, self.diurab
        );
        Ok(())
    }

    fn orient(
        &mut self,
        sp: Radian,
        theta: Radian,
        site: &Site,
        refraction: RefractionCoefficients,
    ) {
        // Local meridian frame: polar motion then rotation to the site longitude
        let r = rotmt(-site.longitude, Axis::Z) * polar_motion_matrix(site.xp, site.yp, theta + sp);

        let (a, b) = (r[(0, 0)], r[(0, 1)]);
        let eral = if a != 0.0 || b != 0.0 {
            b.atan2(a)
        } else {
            0.0
        };
        self.eral = eral;

        let c = r[(0, 2)];
        self.xpl = c.atan2(a.hypot(b));

        let (a, b) = (r[(1, 2)], r[(2, 2)]);
        self.ypl = if a != 0.0 || b != 0.0 {
            -a.atan2(b)
        } else {
            0.0
        };

        self.along = anpm(eral - theta);
        let (sphi, cphi) = site.latitude.sin_cos();
        self.sphi = sphi;
        self.cphi = cphi;

        self.refa = refraction.a;
        self.refb = refraction.b;
    }

    /// Full context for a terrestrial observer, ICRS ↔ observed.
    ///
    /// Arguments
    /// ---------
    /// * `tdb`: TDB date.
    /// * `earth`: Earth barycentric state and heliocentric position.
    /// * `orientation`: CIP, Earth rotation angle and TIO locator of the date.
    /// * `site`: geodetic site and polar motion.
    /// * `refraction`: refraction constants.
    /// * `motion`: supplier of the site state.
    ///
    /// Returns
    /// -------
    /// * The context. `diurab` is zero: the site velocity already enters `v`, so the
    ///   diurnal aberration is carried by the annual aberration step.
    ///
    /// Remarks
    /// -------
    /// * The CIRS site state is brought back to the GCRS with `bpnᵀ` before being added
    ///   to the Earth state.
    pub fn terrestrial(
        tdb: JulianDate,
        earth: &EarthState,
        orientation: &EarthOrientation,
        site: &Site,
        refraction: RefractionCoefficients,
        motion: &impl SiteMotion,
    ) -> Result<Self, AstrometryError> {
        let pv = motion.site_state(site, orientation.era, orientation.sp)?;

        let cip = &orientation.cip;
        let bpn = celestial_to_intermediate(cip.x, cip.y, cip.s);
        let observer = pv.rotate(&bpn.transpose());

        let mut ctx = AstrometryContext::topocentric(tdb, earth, &observer);
        ctx.bpn = bpn;
        ctx.orient(orientation.sp, orientation.era, site, refraction);
        ctx.diurab = 0.0;

        debug!(
            "terrestrial context at TDB {}: eral = {} rad, |v| = {} c",
            tdb.jd(),
            ctx.eral,
            ctx.v.norm()
        );
        Ok(ctx)
    }

    /// Geocentric ICRS ↔ CIRS context from model suppliers.
    ///
    /// Arguments
    /// ---------
    /// * `tdb`: TDB date, for the Earth state.
    /// * `tt`: TT date, for the CIP.
    /// * `ephemeris`: Earth state supplier.
    /// * `pole`: precession-nutation supplier.
    ///
    /// Returns
    /// -------
    /// * The context, carrying the warnings of the ephemeris (e.g. dubious year).
    ///
    /// Errors
    /// ------
    /// * Whatever `ephemeris` returns.
    pub fn from_models(
        tdb: JulianDate,
        tt: JulianDate,
        ephemeris: &impl EarthEphemeris,
        pole: &impl CelestialPoleModel,
    ) -> Result<Flagged<Self>, AstrometryError> {
        let mut status = Flagged::ok(());
        let earth = status.absorb(ephemeris.earth_state(tdb)?);
        let cip = pole.cip(tt);

        Ok(status.with_value(AstrometryContext::geocentric_cirs(tdb, &earth, &cip)))
    }

    /// Full ICRS ↔ observed context from model suppliers and ambient conditions.
    ///
    /// The Earth rotation angle comes from the UT1 date, the TIO locator from the TT date
    /// and the refraction constants from `weather`.
    ///
    /// Errors
    /// ------
    /// * Whatever `ephemeris` or `motion` return.
    pub fn observing(
        epoch: &ObservationEpoch,
        site: &Site,
        weather: &Weather,
        ephemeris: &impl EarthEphemeris,
        pole: &impl CelestialPoleModel,
        motion: &impl SiteMotion,
    ) -> Result<Flagged<Self>, AstrometryError> {
        let mut status = Flagged::ok(());
        let earth = status.absorb(ephemeris.earth_state(epoch.tdb)?);

        let orientation = EarthOrientation::new(
            pole.cip(epoch.tt),
            earth_rotation_angle(epoch.ut1),
            tio_locator(epoch.tt),
        );
        let refraction = RefractionCoefficients::from_weather(weather);

        let ctx = AstrometryContext::terrestrial(
            epoch.tdb,
            &earth,
            &orientation,
            site,
            refraction,
            motion,
        )?;
        Ok(status.with_value(ctx))
    }

    /// Update the local Earth rotation angle for a new Earth rotation angle `theta`.
    ///
    /// `eral = theta + along`, not normalized.
    pub fn set_earth_rotation(&mut self, theta: Radian) {
        self.eral = theta + self.along;
    }

    /// Same as [`AstrometryContext::set_earth_rotation`], from a UT1 date.
    pub fn set_earth_rotation_ut1(&mut self, ut1: JulianDate) {
        self.set_earth_rotation(earth_rotation_angle(ut1));
    }

    /// Refraction constants of the context.
    pub fn refraction(&self) -> RefractionCoefficients {
        RefractionCoefficients::new(self.refa, self.refb)
    }
}
