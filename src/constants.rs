//! # Constants and type definitions for starplace
//!
//! This module centralizes the **physical constants**, **conversion factors** and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants (IAU 2012 au, speed of light, WGS84 ellipsoid)
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ radians, days ↔ seconds, au ↔ m)
//! - Reference epochs (J2000.0, Julian year and century)
//! - Thresholds shared by the relativistic and refraction models
//!
//! Distances are expressed in **au** and angles in **radians** everywhere unless stated
//! otherwise in the name of the constant.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Astronomical Unit in meters (IAU 2012)
pub const AU_M: f64 = AU * 1e3;

/// Speed of light in m/s
pub const VLIGHT_MS: f64 = 299_792_458.0;

/// Light time for one astronomical unit, in seconds
pub const AU_LIGHT_TIME: f64 = AU_M / VLIGHT_MS;

/// Speed of light in astronomical units per day
pub const VLIGHT_AU: f64 = SECONDS_PER_DAY / AU_LIGHT_TIME;

/// Schwarzschild radius of the Sun in au (2 × 1.32712440041e20 / c² / au)
pub const SCHWARZSCHILD_SUN: f64 = 1.974_125_743_36e-8;

/// Julian Date of J2000.0 (2000-01-01 12:00:00 TT)
pub const JD2000: f64 = 2_451_545.0;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Days per Julian year
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Days per Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Radians → arcseconds
pub const ARCSEC_PER_RADIAN: f64 = 1.0 / RADSEC;

/// Earth equatorial radius in meters (WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth flattening (WGS84)
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Earth rotation rate in radians per UT1 second (IAU 2000 Earth rotation angle rate)
pub const EARTH_ROTATION_RATE: f64 = 1.002_737_811_911_354_48 * DPI / SECONDS_PER_DAY;

// -------------------------------------------------------------------------------------------------
// Model thresholds
// -------------------------------------------------------------------------------------------------

/// Smallest parallax accepted by the space-motion model, in arcseconds
pub const PARALLAX_FLOOR: f64 = 1e-7;

/// Space velocity (fraction of c) above which the velocity is discarded
pub const SPEED_CEILING: f64 = 0.5;

/// Minimum horizontal component of the topocentric unit vector before clamping
pub const CELMIN: f64 = 1e-6;

/// Minimum vertical component (cosine of the zenith distance) used by the refraction model
pub const SELMIN: f64 = 0.05;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
