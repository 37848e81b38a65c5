mod common;

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};
use starplace::astrometry::{AstrometryContext, RefractionCoefficients, Weather};
use starplace::astrometry_errors::AstrometryError;
use starplace::ephemeris::{EarthOrientation, EarthState};
use starplace::observers::{Geocenter, Wgs84Site};
use starplace::state_vector::StateVector;
use starplace::status::AstrometryWarning;
use starplace::time::{earth_rotation_angle, JulianDate, ObservationEpoch};

use crate::common::{
    reference_cip, reference_earth, reference_refraction, reference_site, reference_tdb,
    FrozenEphemeris, FrozenPole,
};

fn assert_invariants(ctx: &AstrometryContext) {
    assert_relative_eq!(ctx.eh.norm(), 1.0, epsilon = 1e-12);
    assert!(ctx.em > 0.0);
    assert_relative_eq!(ctx.bm1 * ctx.bm1 + ctx.v.norm_squared(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(
        ctx.bpn * ctx.bpn.transpose(),
        Matrix3::identity(),
        epsilon = 1e-12
    );
    assert_relative_eq!(ctx.bpn.determinant(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(ctx.sphi * ctx.sphi + ctx.cphi * ctx.cphi, 1.0, epsilon = 1e-15);
}

fn reference_epoch() -> ObservationEpoch {
    ObservationEpoch {
        tdb: reference_tdb(),
        tt: reference_tdb(),
        ut1: JulianDate::new(2456384.5, 0.969_255_844_5),
    }
}

#[test]
fn test_from_models_geocentric_case() {
    let ephemeris = FrozenEphemeris {
        earth: EarthState::new(
            StateVector::new(
                Vector3::new(0.901310875, -0.417402664, -0.180982288),
                Vector3::new(0.00742727954, 0.0140507459, 0.00609045792),
            ),
            Vector3::new(0.903358544, -0.415395237, -0.180084014),
        ),
        ..FrozenEphemeris::default()
    };
    let tdb = JulianDate::new(2456165.5, 0.401182685);

    let ctx = AstrometryContext::from_models(tdb, tdb, &ephemeris, &FrozenPole).unwrap();
    assert!(ctx.is_ok());
    let ctx = ctx.into_value();

    assert_relative_eq!(ctx.pmt, 12.651_337_940_273_786, epsilon = 1e-12);
    assert_relative_eq!(ctx.em, 1.010_465_295_811_013_2, epsilon = 1e-12);
    assert_relative_eq!(ctx.bm1, 0.999_999_995_168_601_3, epsilon = 1e-12);
    assert_ne!(ctx.bpn, Matrix3::identity());
    assert_invariants(&ctx);
}

#[test]
fn test_from_models_propagates_dubious_year() {
    let tdb = JulianDate::new(2451545.0, 200.0 * 365.25);
    let ctx =
        AstrometryContext::from_models(tdb, tdb, &FrozenEphemeris::default(), &FrozenPole)
            .unwrap();

    assert!(ctx.has_warning(&AstrometryWarning::DubiousYear));
    assert_invariants(ctx.value());
}

#[test]
fn test_from_models_refuses_unacceptable_date() {
    let tdb = JulianDate::new(2451545.0, -2000.0 * 365.25);
    let res = AstrometryContext::from_models(tdb, tdb, &FrozenEphemeris::default(), &FrozenPole);

    assert_eq!(res.unwrap_err(), AstrometryError::UnacceptableDate(tdb));
}

#[test]
fn test_observing_context() {
    let weather = Weather::new(731.0, 12.8, 0.59, 0.55);
    let ctx = AstrometryContext::observing(
        &reference_epoch(),
        &reference_site(),
        &weather,
        &FrozenEphemeris::default(),
        &FrozenPole,
        &Wgs84Site,
    )
    .unwrap();
    assert!(ctx.is_ok());
    let ctx = ctx.into_value();
    assert_invariants(&ctx);

    let refraction = RefractionCoefficients::from_weather(&weather);
    assert_eq!(ctx.refraction(), refraction);
    assert!(refraction.is_active());

    // Local Earth rotation angle follows the UT1 date
    let eral = earth_rotation_angle(reference_epoch().ut1) + ctx.along;
    assert_relative_eq!(ctx.eral.sin(), eral.sin(), epsilon = 1e-12);
    assert_relative_eq!(ctx.eral.cos(), eral.cos(), epsilon = 1e-12);

    assert_eq!(ctx.diurab, 0.0);
}

#[test]
fn test_observing_in_vacuum_has_no_refraction() {
    let ctx = AstrometryContext::observing(
        &reference_epoch(),
        &reference_site(),
        &Weather::vacuum(),
        &FrozenEphemeris::default(),
        &FrozenPole,
        &Wgs84Site,
    )
    .unwrap()
    .into_value();

    assert_eq!(ctx.refraction(), RefractionCoefficients::NONE);
    assert!(!ctx.refraction().is_active());
}

#[test]
fn test_terrestrial_matches_geocentric_plus_site() {
    let orientation = EarthOrientation::new(reference_cip(), 3.14540971, -3.01974337e-11);
    let ctx = AstrometryContext::terrestrial(
        reference_tdb(),
        &reference_earth(),
        &orientation,
        &reference_site(),
        reference_refraction(),
        &Wgs84Site,
    )
    .unwrap();
    assert_invariants(&ctx);

    // The site is about 4e-5 au from the geocenter
    let geocentric = AstrometryContext::geocentric_cirs(
        reference_tdb(),
        &reference_earth(),
        &reference_cip(),
    );
    assert_relative_eq!(ctx.em, geocentric.em, max_relative = 1e-4);
    assert_relative_eq!(ctx.bpn, geocentric.bpn, epsilon = 1e-15);
    assert!((ctx.eb - geocentric.eb).norm() < 1e-4);
}

#[test]
fn test_geocenter_has_no_diurnal_aberration() {
    let ctx = AstrometryContext::observed_place(
        -3.01974337e-11,
        3.14540971,
        &reference_site(),
        reference_refraction(),
        &Geocenter,
    )
    .unwrap();

    assert_eq!(ctx.diurab, 0.0);
    assert_relative_eq!(ctx.eral, 3.14540971 + ctx.along, epsilon = 1e-14);
}

#[test]
fn test_set_earth_rotation_keeps_longitude() {
    let mut ctx = common::terrestrial_context();
    let along = ctx.along;

    ctx.set_earth_rotation(1.0);
    assert_relative_eq!(ctx.eral, 1.0 + along, epsilon = 1e-15);

    let ut1 = JulianDate::new(2451545.0, 0.25);
    ctx.set_earth_rotation_ut1(ut1);
    assert_relative_eq!(ctx.eral, earth_rotation_angle(ut1) + along, epsilon = 1e-15);
    assert_eq!(ctx.along, along);
}
