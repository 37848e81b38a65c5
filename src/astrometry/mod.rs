//! # Astrometry
//!
//! Transformation of star positions between the ICRS, the CIRS and the observed
//! coordinates of a terrestrial observer, following the IAU 2000/2006 resolutions.
//!
//! ## Overview
//!
//! 1. Build an [`AstrometryContext`] for the observer and the epoch: Earth state,
//!    precession-nutation, Earth orientation, site and refraction
//!    ([`context`]).
//! 2. Transform any number of stars with that context, forward or backward
//!    ([`transforms`]).
//!
//! The physical corrections live in their own modules and can be used alone:
//! light deflection ([`deflection`]), stellar aberration ([`aberration`]) and
//! atmospheric refraction ([`refraction`]).
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::Vector3;
//! use starplace::astrometry::{icrs_to_cirs, AstrometryContext};
//! use starplace::catalog::CatalogStar;
//! use starplace::ephemeris::EarthState;
//! use starplace::state_vector::StateVector;
//! use starplace::time::JulianDate;
//!
//! let earth = EarthState::new(
//!     StateVector::new(
//!         Vector3::new(0.901310875, -0.417402664, -0.180982288),
//!         Vector3::new(0.00742727954, 0.0140507459, 0.00609045792),
//!     ),
//!     Vector3::new(0.903358544, -0.415395237, -0.180084014),
//! );
//! let ctx = AstrometryContext::geocentric(JulianDate::new(2456165.5, 0.401182685), &earth);
//!
//! let star = CatalogStar::new(2.71, 0.174, 1e-5, 5e-6, 0.1, 55.0);
//! let apparent = icrs_to_cirs(&star, &ctx);
//! assert!((apparent.ra - star.ra).abs() < 1e-3);
//! ```

pub mod aberration;
pub mod context;
pub mod deflection;
pub mod refraction;
pub mod transforms;

pub use aberration::{aberrate, unaberrate};
pub use context::AstrometryContext;
pub use deflection::{deflect, deflect_by_bodies, deflect_by_sun, LightDeflectingBody};
pub use refraction::{refract, unrefract, RefractionCoefficients, Weather};
pub use transforms::{
    astrometric_to_catalog, cirs_to_icrs, cirs_to_icrs_with_bodies, cirs_to_observed,
    icrs_to_astrometric, icrs_to_cirs, icrs_to_cirs_fixed, icrs_to_cirs_with_bodies,
    icrs_to_observed, observed_to_catalog, observed_to_cirs, observed_to_icrs,
    ObservedCoordinates, ObservedPlace, RaDec,
};
