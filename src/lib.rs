pub mod astrometry;
pub mod astrometry_errors;
pub mod catalog;
pub mod constants;
pub mod ephemeris;
pub mod observers;
pub mod params;
pub mod ref_system;
pub mod state_vector;
pub mod status;
pub mod time;
