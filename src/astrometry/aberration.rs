use nalgebra::Vector3;

use crate::constants::SCHWARZSCHILD_SUN;

/// Stellar aberration, including the relativistic terms.
///
/// Arguments
/// ---------
/// * `pnat`: natural direction to the source (unit vector).
/// * `v`: observer barycentric velocity in units of c.
/// * `s`: distance between the Sun and the observer (au).
/// * `bm1`: `√(1 − |v|²)`, the reciprocal of the Lorentz factor.
///
/// Returns
/// -------
/// * The proper direction to the source (unit vector).
///
/// Details
/// -------
/// ```text
/// p ∝ bm1 · n + (1 + n·v / (1 + bm1)) · v + (SRS / s) · (v − (n·v) · n)
/// ```
/// The last term accounts for the gravitational potential of the Sun at the observer.
pub fn aberrate(pnat: &Vector3<f64>, v: &Vector3<f64>, s: f64, bm1: f64) -> Vector3<f64> {
    let pdv = pnat.dot(v);
    let w1 = 1.0 + pdv / (1.0 + bm1);
    let w2 = SCHWARZSCHILD_SUN / s;

    let p = pnat * bm1 + w1 * v + w2 * (v - pdv * pnat);
    p.normalize()
}

/// Inverse of [`aberrate`].
///
/// The Lorentz part is inverted exactly by aberrating with the opposite velocity; the
/// gravitational-potential term, of order 1e-8 · |v|, is then removed by one explicit
/// correction step. The remaining error is at the level of 1e-15 rad.
///
/// Arguments
/// ---------
/// * `ppr`: proper direction to the source (unit vector).
/// * `v`, `s`, `bm1`: as in [`aberrate`].
///
/// Returns
/// -------
/// * The natural direction to the source (unit vector).
pub fn unaberrate(ppr: &Vector3<f64>, v: &Vector3<f64>, s: f64, bm1: f64) -> Vector3<f64> {
    let vm = -v;
    let pdv = ppr.dot(&vm);
    let w1 = 1.0 + pdv / (1.0 + bm1);
    let n0 = (ppr * bm1 + w1 * vm).normalize();

    let residual = aberrate(&n0, v, s, bm1) - ppr;
    (n0 - residual).normalize()
}
