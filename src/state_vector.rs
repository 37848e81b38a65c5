use std::ops::{Add, Sub};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::Radian;

/// Position/velocity pair.
///
/// Units are carried by the context of use: au and au/day for barycentric states,
/// meters and meters/second for observer sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

/// Spherical form of a [`StateVector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalState {
    /// Longitude angle θ (radians)
    pub theta: Radian,
    /// Latitude angle φ (radians)
    pub phi: Radian,
    /// Radial distance
    pub r: f64,
    /// Rate of change of θ
    pub theta_dot: f64,
    /// Rate of change of φ
    pub phi_dot: f64,
    /// Rate of change of r
    pub r_dot: f64,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        StateVector { position, velocity }
    }

    pub fn zero() -> Self {
        StateVector {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        }
    }

    /// Move the position along the velocity for `dt` time units; the velocity is unchanged.
    pub fn advance(&self, dt: f64) -> Self {
        StateVector {
            position: self.position + dt * self.velocity,
            velocity: self.velocity,
        }
    }

    /// Rotate both vectors by `rot`.
    pub fn rotate(&self, rot: &Matrix3<f64>) -> Self {
        StateVector {
            position: rot * self.position,
            velocity: rot * self.velocity,
        }
    }

    /// Build a state from spherical coordinates and their rates.
    ///
    /// Arguments
    /// ---------
    /// * `s`: longitude, latitude, distance and their time derivatives.
    ///
    /// Returns
    /// -------
    /// * The Cartesian position and velocity.
    pub fn from_spherical(s: &SphericalState) -> Self {
        let (st, ct) = s.theta.sin_cos();
        let (sp, cp) = s.phi.sin_cos();
        let rcp = s.r * cp;
        let x = rcp * ct;
        let y = rcp * st;
        let rpd = s.r * s.phi_dot;
        let w = rpd * sp - cp * s.r_dot;

        StateVector {
            position: Vector3::new(x, y, s.r * sp),
            velocity: Vector3::new(
                -y * s.theta_dot - w * ct,
                x * s.theta_dot - w * st,
                rpd * cp + sp * s.r_dot,
            ),
        }
    }

    /// Spherical coordinates and rates of the state.
    ///
    /// Remarks
    /// -------
    /// * For a null position the angles are taken from the direction of the velocity,
    ///   as the direction of motion is the only one defined.
    /// * On the polar axis θ and both angular rates are set to zero.
    /// * θ is returned in (−π, +π], not normalized.
    pub fn to_spherical(&self) -> SphericalState {
        let p = self.position;
        let v = self.velocity;
        let r_true = p.norm();

        let (x, y, z, rw) = if r_true == 0.0 {
            (v.x, v.y, v.z, v.norm())
        } else {
            (p.x, p.y, p.z, r_true)
        };
        let rxy2 = x * x + y * y;
        let r2 = rxy2 + z * z;
        let rxy = rxy2.sqrt();
        let xyp = x * v.x + y * v.y;

        let (theta, phi, theta_dot, phi_dot) = if rxy2 != 0.0 {
            (
                y.atan2(x),
                z.atan2(rxy),
                (x * v.y - y * v.x) / rxy2,
                (v.z * rxy2 - z * xyp) / (r2 * rxy),
            )
        } else {
            let phi = if z != 0.0 { z.atan2(rxy) } else { 0.0 };
            (0.0, phi, 0.0, 0.0)
        };
        let r_dot = if rw != 0.0 { (xyp + z * v.z) / rw } else { 0.0 };

        SphericalState {
            theta,
            phi,
            r: r_true,
            theta_dot,
            phi_dot,
            r_dot,
        }
    }
}

impl Add for StateVector {
    type Output = StateVector;

    fn add(self, rhs: StateVector) -> StateVector {
        StateVector {
            position: self.position + rhs.position,
            velocity: self.velocity + rhs.velocity,
        }
    }
}

impl Sub for StateVector {
    type Output = StateVector;

    fn sub(self, rhs: StateVector) -> StateVector {
        StateVector {
            position: self.position - rhs.position,
            velocity: self.velocity - rhs.velocity,
        }
    }
}

#[cfg(test)]
mod state_vector_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_spherical() {
        let pv = StateVector::from_spherical(&SphericalState {
            theta: -3.21,
            phi: 0.123,
            r: 0.456,
            theta_dot: -7.8e-6,
            phi_dot: 9.01e-6,
            r_dot: -1.23e-5,
        });

        assert_relative_eq!(
            pv.position,
            Vector3::new(
                -0.451_496_467_388_016_5,
                0.030_933_942_773_425_85,
                0.055_946_681_051_087_79
            ),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            pv.velocity,
            Vector3::new(
                1.292_270_850_663_260_2e-5,
                2.652_814_182_060_692e-6,
                2.568_431_853_930_292e-6
            ),
            epsilon = 1e-16
        );
    }

    #[test]
    fn test_to_spherical() {
        let pv = StateVector::new(
            Vector3::new(-0.4514964673880165, 0.03093394277342585, 0.05594668105108779),
            Vector3::new(
                1.292270850663260170e-5,
                2.652814182060691422e-6,
                2.568431853930292259e-6,
            ),
        );
        let s = pv.to_spherical();
        // θ comes back in (-π, π]
        assert_relative_eq!(s.theta, -3.21 + crate::constants::DPI, epsilon = 1e-12);
        assert_relative_eq!(s.phi, 0.123, epsilon = 1e-12);
        assert_relative_eq!(s.r, 0.456, epsilon = 1e-12);
        assert_relative_eq!(s.theta_dot, -7.8e-6, epsilon = 1e-16);
        assert_relative_eq!(s.phi_dot, 9.01e-6, epsilon = 1e-16);
        assert_relative_eq!(s.r_dot, -1.23e-5, epsilon = 1e-16);
    }

    #[test]
    fn test_null_position_uses_velocity_direction() {
        let pv = StateVector::new(Vector3::zeros(), Vector3::new(0.0, 2.0, 0.0));
        let s = pv.to_spherical();
        assert_eq!(s.r, 0.0);
        assert_relative_eq!(s.theta, std::f64::consts::FRAC_PI_2, epsilon = 1e-15);
        assert_relative_eq!(s.r_dot, 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_advance_and_ops() {
        let pv = StateVector::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.5));
        let later = pv.advance(2.0);
        assert_eq!(later.position, Vector3::new(1.0, 2.0, 1.0));
        assert_eq!(later.velocity, pv.velocity);
        assert_eq!((later - pv).position, Vector3::new(0.0, 2.0, 1.0));
        assert_eq!((pv + pv).velocity, Vector3::new(0.0, 2.0, 1.0));
    }
}
