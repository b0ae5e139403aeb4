use crate::ephemeris::EphemerisError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("position vector has zero magnitude; gravity is undefined")]
    ZeroPosition,
    #[error("angular momentum is zero; orbital elements are undefined for rectilinear motion")]
    RectilinearOrbit,
    #[error("spacecraft coincides with perturbing body {0}")]
    CoincidentBody(i32),
    #[error("n-body perturbation requires an ephemeris provider")]
    MissingEphemeris,
    #[error("ephemeris lookup failed: {0}")]
    Ephemeris(#[from] EphemerisError),
}
