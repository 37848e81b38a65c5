mod common;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starplace::astrometry::{
    cirs_to_observed, icrs_to_cirs, icrs_to_observed, observed_to_catalog, observed_to_icrs,
    ObservedCoordinates, ObservedPlace,
};
use starplace::catalog::{propagate, CatalogStar};
use starplace::params::InverseParams;
use starplace::ref_system::{angular_separation, radec_to_cartesian};
use starplace::status::AstrometryWarning;

use crate::common::{assert_star_close, terrestrial_context};

/// Largest zenith distance kept for the round trips (about 69°).
const MAX_ZENITH_DISTANCE: f64 = 1.2;

fn random_star(rng: &mut StdRng) -> CatalogStar {
    CatalogStar::new(
        rng.random::<f64>() * std::f64::consts::TAU,
        (rng.random_range(-1.0..1.0_f64)).asin(),
        rng.random_range(-1e-7..1e-7),
        rng.random_range(-1e-7..1e-7),
        rng.random_range(0.0..0.2),
        rng.random_range(-50.0..50.0),
    )
}

/// Random stars above the horizon of the reference site, with their observed places.
fn visible_stars(seed: u64, count: usize) -> Vec<(CatalogStar, ObservedPlace)> {
    let ctx = terrestrial_context();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut stars = Vec::with_capacity(count);
    while stars.len() < count {
        let star = random_star(&mut rng);
        let observed = icrs_to_observed(&star, &ctx);
        if observed.value().zenith_distance >= MAX_ZENITH_DISTANCE {
            continue;
        }

        // Stars below the horizon are flagged; the kept ones must not be
        assert!(observed.is_ok(), "unexpected warnings: {:?}", observed.warnings());
        stars.push((star, observed.into_value()));
    }
    stars
}

#[test]
fn test_below_horizon_is_flagged_degenerate() {
    let ctx = terrestrial_context();
    let mut rng = StdRng::seed_from_u64(42_u64);

    let mut below = 0;
    for _ in 0..200 {
        let observed = icrs_to_observed(&random_star(&mut rng), &ctx);
        if observed.value().zenith_distance > std::f64::consts::FRAC_PI_2 {
            assert!(observed.has_warning(&AstrometryWarning::DegenerateGeometry));
            below += 1;
        }
    }
    assert!(below > 0);
}

#[test]
fn test_catalog_observed_catalog_round_trip() {
    let ctx = terrestrial_context();
    let params = InverseParams::default();

    for (star, place) in visible_stars(42_u64, 200) {
        for observed in [
            ObservedCoordinates::from(&place),
            ObservedCoordinates::HourAngleDeclination {
                hour_angle: place.hour_angle,
                declination: place.declination,
            },
            ObservedCoordinates::RightAscensionDeclination {
                ra: place.right_ascension,
                dec: place.declination,
            },
        ] {
            let recovered = observed_to_catalog(&observed, &star, &ctx, &params);
            assert!(recovered.is_ok(), "unexpected warnings: {:?}", recovered.warnings());
            assert_star_close(recovered.value(), &star, 1e-10);
        }
    }
}

#[test]
fn test_observed_place_is_self_consistent() {
    let ctx = terrestrial_context();

    for (_, place) in visible_stars(0xDEADBEEF, 50) {
        // The three forms of the same observed place describe one direction.
        let (sz, cz) = place.zenith_distance.sin_cos();
        let sin_dec = ctx.sphi * cz + ctx.cphi * sz * place.azimuth.cos();
        assert_relative_eq!(place.declination.sin(), sin_dec, epsilon = 1e-12);

        assert_relative_eq!(
            (place.right_ascension + place.hour_angle - ctx.eral).sin(),
            0.0,
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_full_pipeline_matches_split_pipeline() {
    let ctx = terrestrial_context();

    for (star, place) in visible_stars(0xBADF00D, 50) {
        let split = cirs_to_observed(&icrs_to_cirs(&star, &ctx), &ctx).into_value();
        assert_relative_eq!(place.azimuth, split.azimuth, epsilon = 1e-15);
        assert_relative_eq!(place.zenith_distance, split.zenith_distance, epsilon = 1e-15);
        assert_relative_eq!(place.right_ascension, split.right_ascension, epsilon = 1e-15);
    }
}

#[test]
fn test_observed_to_icrs_recovers_astrometric_place() {
    let ctx = terrestrial_context();
    let params = InverseParams::default();

    for (star, place) in visible_stars(0xFEEDFACE, 50) {
        let fixed = CatalogStar::fixed(star.ra, star.dec);
        let observed = icrs_to_observed(&fixed, &ctx).into_value();
        let astrometric =
            observed_to_icrs(&ObservedCoordinates::from(&observed), &ctx, &params).into_value();

        let separation = angular_separation(
            &radec_to_cartesian(astrometric.ra, astrometric.dec),
            &radec_to_cartesian(star.ra, star.dec),
        );
        assert!(separation < 1e-10, "separation {separation:e} rad for {place:?}");
    }
}

#[test]
fn test_propagated_star_stays_invertible() {
    let ctx = terrestrial_context();
    let params = InverseParams::default();
    let (star, _) = visible_stars(7, 1)[0];
    let moved = propagate(
        &star,
        starplace::time::JulianDate::j2000(),
        common::reference_tdb(),
    )
    .unwrap()
    .into_value();

    let observed = icrs_to_observed(&moved, &ctx).into_value();
    let recovered =
        observed_to_catalog(&ObservedCoordinates::from(&observed), &moved, &ctx, &params)
            .into_value();
    assert_star_close(&recovered, &moved, 1e-10);
}
