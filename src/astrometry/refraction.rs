//! # Atmospheric refraction
//!
//! Two-term model of the refraction in zenith distance:
//!
//! ```text
//! Δζ = A tan ζ + B tan³ ζ
//! ```
//!
//! The coefficients come from [`RefractionCoefficients::from_weather`] or from the caller.
//! The model is evaluated with clamped denominators so that it stays finite at the
//! zenith and below the horizon ([`CELMIN`], [`SELMIN`]); a clamped evaluation with an
//! active model is reported as [`AstrometryWarning::DegenerateGeometry`].
//!
//! [`refract`] applies the model to a topocentric direction as an exact rotation in the
//! vertical plane, and [`unrefract`] inverts it by fixed-point iteration on the zenith
//! distance.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::constants::{Radian, CELMIN, SELMIN};
use crate::params::InverseParams;
use crate::status::{AstrometryWarning, Flagged};

/// Ambient conditions at the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Pressure at the observer (hPa); zero disables refraction
    pub pressure_hpa: f64,
    /// Ambient temperature (°C)
    pub temperature_c: f64,
    /// Relative humidity, 0 to 1
    pub relative_humidity: f64,
    /// Effective wavelength (μm); above 100 μm the radio formula is used
    pub wavelength_um: f64,
}

impl Weather {
    pub fn new(
        pressure_hpa: f64,
        temperature_c: f64,
        relative_humidity: f64,
        wavelength_um: f64,
    ) -> Self {
        Weather {
            pressure_hpa,
            temperature_c,
            relative_humidity,
            wavelength_um,
        }
    }

    /// No atmosphere.
    pub fn vacuum() -> Self {
        Weather::new(0.0, 0.0, 0.0, 0.55)
    }
}

/// Coefficients `A` and `B` of the refraction model (radians).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RefractionCoefficients {
    pub a: Radian,
    pub b: Radian,
}

impl RefractionCoefficients {
    /// Refraction switched off.
    pub const NONE: RefractionCoefficients = RefractionCoefficients { a: 0.0, b: 0.0 };

    pub fn new(a: Radian, b: Radian) -> Self {
        RefractionCoefficients { a, b }
    }

    pub fn is_active(&self) -> bool {
        self.a != 0.0 || self.b != 0.0
    }

    /// Refraction constants from the ambient conditions.
    ///
    /// Arguments
    /// ---------
    /// * `weather`: pressure, temperature, humidity and wavelength at the observer.
    ///
    /// Returns
    /// -------
    /// * The coefficients `A` and `B`.
    ///
    /// Details
    /// -------
    /// Formulation of Green (1987) for the refractivity, with the Hohenkerk & Sinclair
    /// (1985) approximation of the saturation vapor pressure and the Rueger (2002)
    /// coefficients in the radio band. Inputs are clamped to the ranges where the
    /// formulas are meaningful: temperature to [−150, 200] °C, pressure to [0, 10000] hPa,
    /// humidity to [0, 1] and wavelength to [0.1, 1e6] μm.
    ///
    /// Remarks
    /// -------
    /// * The model is accurate to about 1% of the refraction for zenith distances up to
    ///   70°; it remains usable down to the clamp at `cos ζ = 0.05`.
    pub fn from_weather(weather: &Weather) -> Self {
        let optic = weather.wavelength_um <= 100.0;

        let t = weather.temperature_c.clamp(-150.0, 200.0);
        let p = weather.pressure_hpa.clamp(0.0, 10_000.0);
        let r = weather.relative_humidity.clamp(0.0, 1.0);
        let w = weather.wavelength_um.clamp(0.1, 1e6);

        // Water vapour pressure at the observer
        let pw = if p > 0.0 {
            let ps = 10f64.powf((0.7859 + 0.03477 * t) / (1.0 + 0.00412 * t))
                * (1.0 + p * (4.5e-6 + 6e-10 * t * t));
            r * ps / (1.0 - (1.0 - r) * ps / p)
        } else {
            0.0
        };

        let tk = t + 273.15;
        let gamma = if optic {
            let wlsq = w * w;
            ((77.534_84e-6 + (4.391_08e-7 + 3.666e-9 / wlsq) / wlsq) * p - 11.2684e-6 * pw) / tk
        } else {
            (77.6890e-6 * p - (6.3938e-6 - 0.375463 / tk) * pw) / tk
        };

        let mut beta = 4.4474e-6 * tk;
        if !optic {
            beta -= 0.0074 * pw * beta;
        }

        RefractionCoefficients {
            a: gamma * (1.0 - beta),
            b: -gamma * (beta - gamma / 2.0),
        }
    }
}

/// Refraction angle for a direction with horizontal part `r` and vertical part `z`.
///
/// Returns the angle and whether a clamp was needed.
fn refraction_angle(r: f64, z: f64, coeffs: &RefractionCoefficients) -> (Radian, bool) {
    let degenerate = r < CELMIN || (z < SELMIN && coeffs.is_active());

    let r = r.max(CELMIN);
    let z = z.max(SELMIN);
    let tz = r / z;
    let w = coeffs.b * tz * tz;
    let del = (coeffs.a + w) * tz / (1.0 + (coeffs.a + 3.0 * w) / (z * z));

    (del, degenerate)
}

/// Apply refraction to a topocentric direction.
///
/// Arguments
/// ---------
/// * `aet`: topocentric direction in the local frame (x south, y east, z zenith).
/// * `coeffs`: refraction coefficients.
///
/// Returns
/// -------
/// * The observed direction, lifted toward the zenith by the refraction angle.
///   Flagged [`AstrometryWarning::DegenerateGeometry`] when the direction is within
///   [`CELMIN`] of the zenith, or below the refraction clamp with an active model.
pub fn refract(aet: &Vector3<f64>, coeffs: &RefractionCoefficients) -> Flagged<Vector3<f64>> {
    let r = aet.x.hypot(aet.y);
    let (del, degenerate) = refraction_angle(r, aet.z, coeffs);

    let (sindel, cosdel) = del.sin_cos();
    let f = cosdel - sindel * aet.z / r.max(CELMIN);
    let aeo = Vector3::new(aet.x * f, aet.y * f, cosdel * aet.z + sindel * r);

    if degenerate {
        Flagged::warn(aeo, AstrometryWarning::DegenerateGeometry)
    } else {
        Flagged::ok(aeo)
    }
}

/// Remove refraction from an observed zenith distance.
///
/// Arguments
/// ---------
/// * `zdo`: observed zenith distance (radians).
/// * `coeffs`: refraction coefficients.
/// * `params`: tolerance and iteration cap.
///
/// Returns
/// -------
/// * The topocentric zenith distance `ζ` such that refracting it gives back `zdo`.
///   Flagged [`AstrometryWarning::RefractionNotConverged`] if the tolerance was not
///   reached, and [`AstrometryWarning::DegenerateGeometry`] if the model was clamped at
///   the solution.
///
/// Details
/// -------
/// Fixed point `ζ ← ζ + (zdo − (ζ − Δζ(ζ)))`, started at `ζ = zdo`. The map contracts
/// with a factor `dΔζ/dζ`, well below 1 above the clamp, so a handful of iterations is
/// enough.
pub fn unrefract(
    zdo: Radian,
    coeffs: &RefractionCoefficients,
    params: &InverseParams,
) -> Flagged<Radian> {
    let forward = |zt: Radian| {
        let (s, c) = zt.sin_cos();
        let (del, degenerate) = refraction_angle(s, c, coeffs);
        (zt - del, degenerate)
    };

    let mut zt = zdo;
    let mut converged = false;
    let mut iterations = 0;
    while iterations < params.max_iterations {
        iterations += 1;
        let next = zt + (zdo - forward(zt).0);
        let change = (next - zt).abs();
        zt = next;
        if change < params.tolerance {
            converged = true;
            break;
        }
    }
    trace!("refraction removed in {} iterations", iterations);

    let mut status = Flagged::ok(zt);
    if forward(zt).1 {
        status.push_warning(AstrometryWarning::DegenerateGeometry);
    }
    if !converged {
        warn!(
            "refraction not removed after {} iterations (zd = {})",
            iterations, zdo
        );
        status.push_warning(AstrometryWarning::RefractionNotConverged { iterations });
    }
    status
}
