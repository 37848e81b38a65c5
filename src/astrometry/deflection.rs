use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{AU_LIGHT_TIME, SCHWARZSCHILD_SUN, SECONDS_PER_DAY};
use crate::state_vector::StateVector;

/// A solar-system body deflecting the light of a star.
///
/// The state is barycentric (au, au/day) at the epoch when the light passes the body;
/// the body is moved back along its velocity to the light-emission epoch by
/// [`deflect_by_bodies`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightDeflectingBody {
    /// Mass in solar masses
    pub mass: f64,
    /// Deflection limiter (radians²), roughly the square of the exclusion radius
    pub limiter: f64,
    /// Barycentric position (au) and velocity (au/day)
    pub state: StateVector,
}

impl LightDeflectingBody {
    pub fn new(mass: f64, limiter: f64, state: StateVector) -> Self {
        LightDeflectingBody {
            mass,
            limiter,
            state,
        }
    }

    pub fn sun(state: StateVector) -> Self {
        LightDeflectingBody::new(1.0, 6e-6, state)
    }

    pub fn jupiter(state: StateVector) -> Self {
        LightDeflectingBody::new(0.000_954_35, 3e-9, state)
    }

    pub fn saturn(state: StateVector) -> Self {
        LightDeflectingBody::new(0.000_285_74, 3e-10, state)
    }
}

/// Light deflection by a single body.
///
/// Arguments
/// ---------
/// * `bm`: mass of the body (solar masses).
/// * `p`: direction from the observer to the source (unit vector).
/// * `q`: direction from the body to the source (unit vector).
/// * `e`: direction from the body to the observer (unit vector).
/// * `em`: distance from the body to the observer (au).
/// * `dlim`: deflection limiter.
///
/// Returns
/// -------
/// * The deflected observer → source direction.
///
/// Details
/// -------
/// ```text
/// p1 = p + w · p × (e × q),   w = bm · SRS / em / max(q · (q + e), dlim)
/// ```
/// with SRS the Schwarzschild radius of the Sun. The limiter bounds the denominator when
/// the source lies behind the body (`q + e → 0`); in that configuration `e × q → 0` as
/// well, so the correction goes smoothly to zero.
///
/// Remarks
/// -------
/// * Setting `p = q` is appropriate for a distant star.
/// * The result is not renormalized; the change of length is of second order.
pub fn deflect(
    bm: f64,
    p: &Vector3<f64>,
    q: &Vector3<f64>,
    e: &Vector3<f64>,
    em: f64,
    dlim: f64,
) -> Vector3<f64> {
    let qpe = q + e;
    let qdqpe = q.dot(&qpe);
    let w = bm * SCHWARZSCHILD_SUN / em / qdqpe.max(dlim);

    let eq = e.cross(q);
    let peq = p.cross(&eq);

    p + w * peq
}

/// Light deflection by several bodies, applied in order.
///
/// For each body, the body → observer vector is recomputed at the time the light passed
/// the body: the position is moved back along the velocity by the light time implied by
/// the direction deflected so far. A body on the far side of the observer from the star
/// is left where it is.
///
/// Arguments
/// ---------
/// * `bodies`: deflecting bodies, the Sun usually last.
/// * `observer`: barycentric position of the observer (au).
/// * `direction`: observer → star direction before deflection (unit vector).
///
/// Returns
/// -------
/// * The deflected observer → star direction.
pub fn deflect_by_bodies(
    bodies: &[LightDeflectingBody],
    observer: &Vector3<f64>,
    direction: &Vector3<f64>,
) -> Vector3<f64> {
    // Light time for 1 au in days
    let cr = AU_LIGHT_TIME / SECONDS_PER_DAY;

    bodies.iter().fold(*direction, |sn, body| {
        let v = observer - body.state.position;
        // Minus the time since the light passed the body (days), zero for bodies behind
        // the observer
        let dt = (sn.dot(&v) * cr).min(0.0);

        let ev = body.state.advance(dt).position;
        let v = observer - ev;
        let em = v.norm();
        let e = if em > 0.0 { v / em } else { v };

        deflect(body.mass, &sn, &sn, &e, em, body.limiter)
    })
}

/// Light deflection by the Sun alone.
///
/// Arguments
/// ---------
/// * `p`: observer → star direction (unit vector).
/// * `e`: Sun → observer direction (unit vector).
/// * `em`: Sun → observer distance (au).
///
/// Remarks
/// -------
/// * The limiter `1e-6 / max(em², 1)` corresponds to an exclusion radius of about
///   5 arcminutes at 1 au, shrinking for observers farther from the Sun.
pub fn deflect_by_sun(p: &Vector3<f64>, e: &Vector3<f64>, em: f64) -> Vector3<f64> {
    let em2 = (em * em).max(1.0);
    let dlim = 1e-6 / em2;

    deflect(1.0, p, p, e, em, dlim)
}

#[cfg(test)]
mod deflection_test {
    use super::*;
    use crate::ref_system::radec_to_cartesian;
    use approx::assert_relative_eq;

    #[test]
    fn test_deflect_single_body() {
        let p = Vector3::new(-0.763276255, -0.608633767, -0.216735543);
        let e = Vector3::new(0.76700421, 0.605629598, 0.211937094);
        let p1 = deflect(0.00028574, &p, &p, &e, 8.91276983, 3e-10);

        assert_relative_eq!(
            p1,
            Vector3::new(
                -0.763_276_254_896_815_9,
                -0.608_633_767_082_376_3,
                -0.216_735_543_132_054_7
            ),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_deflect_by_sun() {
        let p = Vector3::new(-0.763276255, -0.608633767, -0.216735543);
        let e = Vector3::new(-0.973644023, -0.20925523, -0.0907169552);
        let p1 = deflect_by_sun(&p, &e, 0.999809214);

        assert_relative_eq!(
            p1,
            Vector3::new(
                -0.763_276_258_073_141_3,
                -0.608_633_763_526_264_9,
                -0.216_735_541_932_232_13
            ),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_limiter_removes_singularity() {
        // Star almost exactly behind the Sun
        let e = Vector3::new(-1.0, 0.0, 0.0);
        let separations = [1e-4, 1e-5, 1e-6, 1e-7, 0.0];

        let corrections: Vec<f64> = separations
            .iter()
            .map(|&s| {
                let p = radec_to_cartesian(s, 0.0);
                (deflect(1.0, &p, &p, &e, 1.0, 1e-6) - p).norm()
            })
            .collect();

        for pair in corrections.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        assert!(corrections.iter().all(|c| c.is_finite()));
        assert_eq!(corrections[4], 0.0);
    }

    #[test]
    fn test_deflect_by_bodies_matches_single_sun() {
        // A static Sun at the origin gives the same answer as the single-body formula
        let observer = Vector3::new(-0.974170438, -0.211520082, -0.0917583024);
        let sun = LightDeflectingBody::new(1.0, 1e-6, StateVector::zero());
        let p = Vector3::new(-0.763276255, -0.608633767, -0.216735543).normalize();

        let n = deflect_by_bodies(&[sun], &observer, &p);

        let em = observer.norm();
        let expected = deflect(1.0, &p, &p, &(observer / em), em, 1e-6);
        assert_relative_eq!(n, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_deflect_by_bodies_order_and_retardation() {
        let observer = Vector3::new(-0.974170438, -0.211520082, -0.0917583024);
        let p = Vector3::new(-0.763276255, -0.608633767, -0.216735543).normalize();

        let bodies = [
            LightDeflectingBody::jupiter(StateVector::new(
                Vector3::new(-2.5, 4.2, 1.8),
                Vector3::new(-6.6e-3, -3.0e-3, -1.1e-3),
            )),
            LightDeflectingBody::sun(StateVector::new(
                Vector3::new(-0.007, 0.004, 0.001),
                Vector3::new(-1e-7, -7e-6, -3e-6),
            )),
        ];

        let n = deflect_by_bodies(&bodies, &observer, &p);
        let delta = (n - p).norm();

        // Dominated by the Sun, star far from the limb
        assert!(delta > 1e-9 && delta < 1e-6);

        // Swapping the order only changes second-order terms
        let swapped = [bodies[1], bodies[0]];
        let n2 = deflect_by_bodies(&swapped, &observer, &p);
        assert_relative_eq!(n, n2, epsilon = 1e-14);
    }

    fn moving_jupiter(position: Vector3<f64>) -> LightDeflectingBody {
        LightDeflectingBody::jupiter(StateVector::new(
            position,
            Vector3::new(-6.6e-3, -3.0e-3, -1.1e-3),
        ))
    }

    fn deflect_from(
        body: &LightDeflectingBody,
        at: &Vector3<f64>,
        observer: &Vector3<f64>,
        p: &Vector3<f64>,
    ) -> Vector3<f64> {
        let v = observer - at;
        let em = v.norm();
        deflect(body.mass, p, p, &(v / em), em, body.limiter)
    }

    #[test]
    fn test_body_behind_observer_is_not_moved() {
        let observer = Vector3::new(1.0, 0.0, 0.0);
        let p = Vector3::new(0.6, 0.8, 0.0);
        // The star is on the other side of the observer: p · (observer − body) > 0
        let body = moving_jupiter(Vector3::new(-4.0, -2.0, 0.3));
        assert!(p.dot(&(observer - body.state.position)) > 0.0);

        let n = deflect_by_bodies(&[body], &observer, &p);
        let expected = deflect_from(&body, &body.state.position, &observer, &p);
        assert_relative_eq!(n, expected, epsilon = 1e-15);

        // The body velocity does not enter at all
        let still = LightDeflectingBody {
            state: StateVector::new(body.state.position, Vector3::zeros()),
            ..body
        };
        assert_eq!(deflect_by_bodies(&[still], &observer, &p), n);
    }

    #[test]
    fn test_body_ahead_of_observer_is_backtracked() {
        let observer = Vector3::new(1.0, 0.0, 0.0);
        let p = Vector3::new(0.6, 0.8, 0.0);
        // Body between the observer and the star, 5 au away: about 0.03 day of light time
        let body = moving_jupiter(Vector3::new(4.0, 4.0, 0.1));
        let v = observer - body.state.position;
        let dt = p.dot(&v) * AU_LIGHT_TIME / SECONDS_PER_DAY;
        assert!(dt < 0.0);

        let n = deflect_by_bodies(&[body], &observer, &p);

        // Position when the light went by: earlier along the trajectory
        let passed = body.state.position + dt * body.state.velocity;
        let expected = deflect_from(&body, &passed, &observer, &p);
        assert_relative_eq!(n, expected, epsilon = 1e-15);

        // Neither the undelayed nor the forward-moved body gives the same answer
        let undelayed = deflect_from(&body, &body.state.position, &observer, &p);
        let ahead = body.state.position - dt * body.state.velocity;
        let forward = deflect_from(&body, &ahead, &observer, &p);
        assert!((n - undelayed).norm() > 1e-14);
        assert!((n - forward).norm() > 1e-14);
    }
}
