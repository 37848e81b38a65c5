//! # Catalog stars
//!
//! A [`CatalogStar`] is a star as given by an astrometric catalog: ICRS position at the
//! catalog epoch, proper motion, parallax and radial velocity. This module moves such a
//! star through time and space:
//!
//! - [`proper_motion_parallax`](crate::catalog::proper_motion_parallax): the direction
//!   seen by an observer at a given barycentric position and date, including proper
//!   motion and parallax (astrometric place, before deflection and aberration).
//! - [`catalog_to_state`](crate::catalog::catalog_to_state) and
//!   [`state_to_catalog`](crate::catalog::state_to_catalog): conversions between the
//!   catalog parameters and a barycentric position/velocity, with the relativistic
//!   Doppler correction of the radial velocity.
//! - [`propagate_state`](crate::catalog::propagate_state),
//!   [`propagate`](crate::catalog::propagate) and
//!   [`propagate_safe`](crate::catalog::propagate_safe): update of the catalog parameters
//!   from one epoch to another, consistent with the light time.
//!
//! ## Units
//!
//! | Quantity | Unit |
//! |---|---|
//! | `ra`, `dec` | radians |
//! | `pm_ra` | dα/dt, radians per Julian year (not multiplied by cos δ) |
//! | `pm_dec` | radians per Julian year |
//! | `parallax` | arcseconds |
//! | `radial_velocity` | km/s, positive when receding |
//! | state vectors | au, au/day, barycentric |

pub mod propagation;
pub mod space_motion;

use serde::{Deserialize, Serialize};

use crate::constants::{ArcSec, Radian};

pub use propagation::{propagate, propagate_safe};
pub use space_motion::{catalog_to_state, proper_motion_parallax, propagate_state, state_to_catalog};

/// Star as given by an astrometric catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogStar {
    /// Right ascension (radians)
    pub ra: Radian,
    /// Declination (radians)
    pub dec: Radian,
    /// Proper motion in right ascension, dα/dt (radians per Julian year)
    #[serde(default)]
    pub pm_ra: Radian,
    /// Proper motion in declination (radians per Julian year)
    #[serde(default)]
    pub pm_dec: Radian,
    /// Parallax (arcseconds)
    #[serde(default)]
    pub parallax: ArcSec,
    /// Radial velocity (km/s, positive when receding)
    #[serde(default)]
    pub radial_velocity: f64,
}

impl CatalogStar {
    pub fn new(
        ra: Radian,
        dec: Radian,
        pm_ra: Radian,
        pm_dec: Radian,
        parallax: ArcSec,
        radial_velocity: f64,
    ) -> Self {
        CatalogStar {
            ra,
            dec,
            pm_ra,
            pm_dec,
            parallax,
            radial_velocity,
        }
    }

    /// Star without proper motion, parallax nor radial velocity.
    pub fn fixed(ra: Radian, dec: Radian) -> Self {
        CatalogStar::new(ra, dec, 0.0, 0.0, 0.0, 0.0)
    }

    /// Same space motion, other position.
    pub fn with_position(self, ra: Radian, dec: Radian) -> Self {
        CatalogStar { ra, dec, ..self }
    }

    /// True if the star has no proper motion, parallax nor radial velocity.
    pub fn is_fixed(&self) -> bool {
        self.pm_ra == 0.0
            && self.pm_dec == 0.0
            && self.parallax == 0.0
            && self.radial_velocity == 0.0
    }
}
