pub mod coefficients;
pub mod events;
pub mod rk4;
pub mod rkf78;

use crate::physics::errors::PhysicsError;
use nalgebra as na;
use thiserror::Error;

/// A state the integrators can advance: closed under `+` and scaling, with a
/// weighted error norm for step-size control.
pub trait IntegrableState:
    Clone + std::ops::Add<Output = Self> + std::ops::Mul<f64, Output = Self>
{
    /// Infinity norm of `|error_i| / (atol + rtol * |self_i|)`
    fn scaled_error(&self, error: &Self, atol: f64, rtol: f64) -> f64;

    fn is_finite(&self) -> bool;
}

impl<const N: usize> IntegrableState for na::SVector<f64, N> {
    fn scaled_error(&self, error: &Self, atol: f64, rtol: f64) -> f64 {
        self.iter()
            .zip(error.iter())
            .map(|(y, e)| e.abs() / (atol + rtol * y.abs()))
            .fold(0.0, f64::max)
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}

/// Absolute and relative error tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub atol: f64,
    pub rtol: f64,
}

impl Tolerances {
    pub fn new(atol: f64, rtol: f64) -> Self {
        Self { atol, rtol }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            atol: crate::constants::DEFAULT_ATOL,
            rtol: crate::constants::DEFAULT_RTOL,
        }
    }
}

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("equations of motion failed at t = {t}: {source}")]
    Dynamics {
        t: f64,
        #[source]
        source: PhysicsError,
    },
    #[error("non-finite state produced after t = {t}")]
    NonFiniteState { t: f64 },
    #[error("step size {h:e} fell below the minimum at t = {t}")]
    StepSizeTooSmall { t: f64, h: f64 },
    #[error("maximum number of steps ({0}) exceeded")]
    MaxStepsExceeded(usize),
    #[error("invalid integration request: {0}")]
    InvalidInput(String),
}
