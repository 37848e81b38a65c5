use hifitime::ut1::Ut1Provider;
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::constants::{
    Radian, DAYS_PER_JULIAN_CENTURY, DAYS_PER_JULIAN_YEAR, DPI, JD2000, JDTOMJD, MJD, RADSEC,
};
use crate::ref_system::anp;

/// Two-part Julian Date.
///
/// The date is `jd1 + jd2`, split so that the sum keeps full precision: usually
/// `jd1 = 2400000.5` and `jd2` the Modified Julian Date, or `jd1` the Julian Date of the
/// preceding midnight and `jd2` the fraction of day. The time scale is implied by the
/// operation consuming the date (TDB for the context builders, TT for the CIP and TIO
/// locator, UT1 for the Earth rotation angle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JulianDate {
    pub jd1: f64,
    pub jd2: f64,
}

impl JulianDate {
    pub fn new(jd1: f64, jd2: f64) -> Self {
        JulianDate { jd1, jd2 }
    }

    /// Build a two-part date from a Modified Julian Date.
    pub fn from_mjd(mjd: MJD) -> Self {
        JulianDate {
            jd1: JDTOMJD,
            jd2: mjd,
        }
    }

    /// J2000.0
    pub fn j2000() -> Self {
        JulianDate {
            jd1: JD2000,
            jd2: 0.0,
        }
    }

    /// Single Julian Date (loses the extra precision of the split).
    pub fn jd(&self) -> f64 {
        self.jd1 + self.jd2
    }

    pub fn days_since_j2000(&self) -> f64 {
        (self.jd1 - JD2000) + self.jd2
    }

    pub fn julian_years_since_j2000(&self) -> f64 {
        self.days_since_j2000() / DAYS_PER_JULIAN_YEAR
    }

    pub fn julian_centuries_since_j2000(&self) -> f64 {
        self.days_since_j2000() / DAYS_PER_JULIAN_CENTURY
    }

    /// Days elapsed from `self` to `later`.
    pub fn days_until(&self, later: &JulianDate) -> f64 {
        (later.jd1 - self.jd1) + (later.jd2 - self.jd2)
    }

    /// TDB date of a hifitime epoch.
    pub fn tdb(epoch: &Epoch) -> Self {
        JulianDate::new(JD2000, epoch.to_tdb_days_since_j2000())
    }

    /// TT date of a hifitime epoch.
    pub fn tt(epoch: &Epoch) -> Self {
        JulianDate::from_mjd(epoch.to_mjd_tt_days())
    }

    /// UT1 date of a hifitime epoch, using the ΔUT1 table of `ut1_provider`.
    pub fn ut1(epoch: &Epoch, ut1_provider: &Ut1Provider) -> Self {
        // hifitime stores the UT1 instant on the TAI axis
        let ut1 = epoch.to_ut1(ut1_provider);
        JulianDate::from_mjd(ut1.to_mjd_tai_days())
    }
}

/// The three time scales needed to build a full observed-place context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationEpoch {
    pub tdb: JulianDate,
    pub tt: JulianDate,
    pub ut1: JulianDate,
}

impl ObservationEpoch {
    /// Derive TDB, TT and UT1 dates from a single hifitime epoch.
    ///
    /// Arguments
    /// ---------
    /// * `epoch`: the instant of observation, in any time scale known to hifitime.
    /// * `ut1_provider`: the ΔUT1 table used for the Earth rotation angle.
    pub fn from_epoch(epoch: &Epoch, ut1_provider: &Ut1Provider) -> Self {
        ObservationEpoch {
            tdb: JulianDate::tdb(epoch),
            tt: JulianDate::tt(epoch),
            ut1: JulianDate::ut1(epoch, ut1_provider),
        }
    }
}

/// Earth rotation angle (IAU 2000 model).
///
/// Arguments
/// ---------
/// * `ut1`: UT1 two-part Julian Date.
///
/// Returns
/// -------
/// * The angle between the CIO and the TIO, in radians, normalized to [0, 2π).
///
/// Details
/// -------
/// ```text
/// θ = 2π (0.7790572732640 + 1.00273781191135448 Tu),  Tu = JD(UT1) − 2451545.0
/// ```
/// The integer part of the day count contributes whole turns and is dropped before the
/// multiplication to keep precision: only the fractional parts of `jd1` and `jd2` are
/// multiplied by 2π directly.
pub fn earth_rotation_angle(ut1: JulianDate) -> Radian {
    let (d1, d2) = if ut1.jd1 < ut1.jd2 {
        (ut1.jd1, ut1.jd2)
    } else {
        (ut1.jd2, ut1.jd1)
    };
    let t = d1 + (d2 - JD2000);

    let f = (d1 % 1.0) + (d2 % 1.0);

    anp(DPI * (f + 0.779_057_273_264_0 + 0.002_737_811_911_354_48 * t))
}

/// TIO locator s′ (IAU 2000), from the secular drift of the pole.
///
/// Arguments
/// ---------
/// * `tt`: TT two-part Julian Date.
///
/// Returns
/// -------
/// * s′ in radians: `−47 µas × T`, with `T` in Julian centuries since J2000.0.
pub fn tio_locator(tt: JulianDate) -> Radian {
    -47e-6 * tt.julian_centuries_since_j2000() * RADSEC
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;
    use hifitime::TimeScale;

    #[test]
    fn test_from_mjd() {
        let jd = JulianDate::from_mjd(59215.0);
        assert_eq!(jd.jd1, 2400000.5);
        assert_eq!(jd.jd2, 59215.0);
        assert_eq!(jd.jd(), 2459215.5);
    }

    #[test]
    fn test_years_since_j2000() {
        let jd = JulianDate::new(2456165.5, 0.401182685);
        assert_relative_eq!(
            jd.julian_years_since_j2000(),
            12.651_337_940_273_786,
            epsilon = 1e-12
        );
        assert_eq!(JulianDate::j2000().julian_centuries_since_j2000(), 0.0);
    }

    #[test]
    fn test_days_until() {
        let a = JulianDate::new(2400000.5, 50083.0);
        let b = JulianDate::new(2400000.5, 53736.0);
        assert_eq!(a.days_until(&b), 3653.0);
        assert_eq!(b.days_until(&a), -3653.0);
    }

    #[test]
    fn test_epoch_conversion() {
        let epoch = Epoch::from_mjd_in_time_scale(57028.479297592596, TimeScale::TT);
        let tt = JulianDate::tt(&epoch);
        assert_relative_eq!(tt.jd2, 57028.479297592596, epsilon = 1e-9);

        // TDB and TT differ by less than 2 ms
        let tdb = JulianDate::tdb(&epoch);
        assert!((tdb.jd() - tt.jd()).abs() * 86400.0 < 2e-3);
    }

    #[test]
    fn test_earth_rotation_angle() {
        let era = earth_rotation_angle(JulianDate::new(2400000.5, 54388.0));
        assert_relative_eq!(era, 0.402_283_724_002_815_8, epsilon = 1e-12);

        // Argument order does not matter
        let era_swapped = earth_rotation_angle(JulianDate::new(54388.0, 2400000.5));
        assert_relative_eq!(era, era_swapped, epsilon = 1e-12);
    }

    #[test]
    fn test_tio_locator() {
        let sp = tio_locator(JulianDate::new(2400000.5, 52541.0));
        assert_relative_eq!(sp, -0.621_669_846_998_101_9e-11, epsilon = 1e-22);
    }
}
