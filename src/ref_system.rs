//! # Reference-frame helpers
//!
//! Small geometric building blocks shared by the astrometry pipeline:
//!
//! - elementary rotations ([`rotmt`]) and the frame matrices built from them:
//!   [`celestial_to_intermediate`] (GCRS → CIRS from the CIP coordinates) and
//!   [`polar_motion_matrix`] (TIRS → ITRS),
//! - spherical ↔ Cartesian conversions ([`cartesian_to_radec`], [`radec_to_cartesian`]),
//! - angle normalization ([`anp`], [`anpm`]) and [`angular_separation`].
//!
//! ## Rotation convention
//!
//! [`rotmt`] is an **active** rotation of a vector in a fixed frame. A change of basis by
//! an angle `φ` about an axis (the "frame rotation" used in the IERS conventions) is the
//! active rotation by `-φ`; the frame matrices below are written in that form.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI};

/// Principal axis for [`rotmt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Construct a right-handed 3×3 rotation matrix around one of the principal axes (X, Y, or Z).
///
/// This function builds a [`nalgebra::Matrix3`] representing an **active rotation**
/// of a 3D vector by an angle `alpha` around the chosen axis.
/// The rotation follows the **direct (positive/trigonometric)** sense:
/// counter-clockwise when looking **along the axis toward the origin**.
///
/// # Arguments
///
/// * `alpha` - Rotation angle in **radians** (positive = direct/trigonometric sense).
/// * `axis` - Axis of rotation.
///
/// # Returns
///
/// A 3×3 rotation matrix `R` such that the rotated vector is `x' = R · x`.
///
/// # Remarks
///
/// * This function uses [`nalgebra::Rotation3::from_axis_angle`] internally,
///   which ensures orthonormality and numerical stability.
/// * A change of basis by `φ` (frame rotation) is `rotmt(-φ, axis)`.
///
/// # See also
/// * [`celestial_to_intermediate`] – GCRS → CIRS matrix assembled from three rotations
/// * [`polar_motion_matrix`] – TIRS → ITRS matrix assembled from three rotations
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Celestial-to-intermediate matrix from the CIP coordinates and the CIO locator.
///
/// Arguments
/// ---------
/// * `x`, `y`: CIP coordinates in the GCRS (direction cosines).
/// * `s`: CIO locator, in radians.
///
/// Returns
/// --------
/// * The matrix `Q` such that `v_CIRS = Q · v_GCRS`.
///
/// Details
/// -------
/// With `E = atan2(y, x)` and `d = atan(√((x² + y²) / (1 − x² − y²)))`, the matrix is the
/// sequence of frame rotations `R3(−(E + s)) · R2(d) · R3(E)`. Its third row is the CIP
/// unit vector `(x, y, √(1 − x² − y²))`.
pub fn celestial_to_intermediate(x: f64, y: f64, s: Radian) -> Matrix3<f64> {
    let r2 = x * x + y * y;
    let e = if r2 > 0.0 { y.atan2(x) } else { 0.0 };
    let d = (r2 / (1.0 - r2)).sqrt().atan();

    rotmt(e + s, Axis::Z) * rotmt(-d, Axis::Y) * rotmt(-e, Axis::Z)
}

/// Polar-motion matrix (IAU 2000), TIRS → ITRS.
///
/// Arguments
/// ---------
/// * `xp`, `yp`: coordinates of the pole, in radians.
/// * `sp`: TIO locator s′, in radians.
///
/// Returns
/// --------
/// * `W` such that `v_ITRS = W · v_TIRS`, i.e. the frame rotations `R1(−yp) · R2(−xp) · R3(s′)`.
pub fn polar_motion_matrix(xp: Radian, yp: Radian, sp: Radian) -> Matrix3<f64> {
    rotmt(yp, Axis::X) * rotmt(xp, Axis::Y) * rotmt(-sp, Axis::Z)
}

/// Normalize an angle into [0, 2π).
pub fn anp(angle: Radian) -> Radian {
    let w = angle % DPI;
    if w < 0.0 {
        w + DPI
    } else {
        w
    }
}

/// Normalize an angle into [−π, +π).
pub fn anpm(angle: Radian) -> Radian {
    let mut w = angle % DPI;
    if w.abs() >= std::f64::consts::PI {
        w -= DPI.copysign(angle);
    }
    w
}

/// Convert a 3D Cartesian position vector to right ascension and declination.
///
/// Given a position vector expressed in Cartesian coordinates (typically in an equatorial frame),
/// this function returns the corresponding right ascension (α), declination (δ), and norm (distance).
///
/// Arguments
/// ---------
/// * `cartesian_position`: 3D position vector in Cartesian coordinates [au or any length unit].
///
/// Returns
/// --------
/// * Tuple `(α, δ, ρ)`:
///     - `α`: right ascension in radians, in the range [0, 2π).
///     - `δ`: declination in radians, in the range [−π/2, +π/2].
///     - `ρ`: Euclidean norm of the vector (distance to the origin).
///
/// Remarks
/// -------
/// * If the input vector has zero norm, the result is `(0.0, 0.0, 0.0)`.
/// * Both angles come from `atan2`, so precision is kept close to the poles as well.
/// * On the polar axis α is set to zero.
pub fn cartesian_to_radec(cartesian_position: Vector3<f64>) -> (Radian, Radian, f64) {
    let pos_norm = cartesian_position.norm();
    if pos_norm == 0. {
        return (0.0, 0.0, pos_norm);
    }

    let (x, y, z) = (
        cartesian_position.x,
        cartesian_position.y,
        cartesian_position.z,
    );
    let rxy = (x * x + y * y).sqrt();

    let alpha = if rxy == 0.0 { 0.0 } else { anp(y.atan2(x)) };
    let delta = z.atan2(rxy);

    (alpha, delta, pos_norm)
}

/// Unit vector pointing at right ascension `alpha` and declination `delta`.
pub fn radec_to_cartesian(alpha: Radian, delta: Radian) -> Vector3<f64> {
    let cos_delta = delta.cos();
    Vector3::new(
        alpha.cos() * cos_delta,
        alpha.sin() * cos_delta,
        delta.sin(),
    )
}

/// Angular separation between two directions, in radians.
///
/// Uses `atan2(|a × b|, a · b)`, which stays accurate for both tiny and near-π separations.
/// The vectors need not be normalized.
pub fn angular_separation(a: &Vector3<f64>, b: &Vector3<f64>) -> Radian {
    let sine = a.cross(b).norm();
    let cosine = a.dot(b);
    if sine != 0.0 || cosine != 0.0 {
        sine.atan2(cosine)
    } else {
        0.0
    }
}
