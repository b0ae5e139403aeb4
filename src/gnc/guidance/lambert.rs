//! Lambert's problem by the universal-variable method.
//!
//! Bisection on ψ between `[psi_lower, psi_upper]`; the transfer angle is
//! fixed by [`TransferDirection`].

use crate::numerics::stumpff::{c2, c3};
use nalgebra as na;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LambertError {
    #[error("degenerate transfer geometry: the A parameter vanished")]
    DegenerateGeometry,
    #[error("position vectors must be non-zero")]
    ZeroPosition,
    #[error("time of flight must be positive and finite, got {0}")]
    InvalidTimeOfFlight(f64),
    #[error("universal-variable solver did not converge in {steps} steps")]
    DidNotConverge { steps: usize },
}

/// Sign of the transfer: short way (+1) or long way (-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferDirection {
    #[default]
    Prograde,
    Retrograde,
}

impl TransferDirection {
    pub fn sign(self) -> f64 {
        match self {
            TransferDirection::Prograde => 1.0,
            TransferDirection::Retrograde => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LambertConfig {
    /// Time-of-flight tolerance [s]
    pub tol: f64,
    pub max_steps: usize,
    pub psi0: f64,
    pub psi_lower: f64,
    pub psi_upper: f64,
}

impl Default for LambertConfig {
    fn default() -> Self {
        let bound = 4.0 * std::f64::consts::PI.powi(2);
        Self {
            tol: 1e-6,
            max_steps: 200,
            psi0: 0.0,
            psi_lower: -bound,
            psi_upper: bound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertSolution {
    /// Departure velocity at `r0` [km/s]
    pub v0: na::Vector3<f64>,
    /// Arrival velocity at `r1` [km/s]
    pub v1: na::Vector3<f64>,
    pub psi: f64,
    pub iterations: usize,
}

/// Velocities connecting `r0` to `r1` in `tof` seconds about a body with
/// gravitational parameter `mu`.
pub fn solve_lambert(
    r0: &na::Vector3<f64>,
    r1: &na::Vector3<f64>,
    tof: f64,
    mu: f64,
    direction: TransferDirection,
    config: &LambertConfig,
) -> Result<LambertSolution, LambertError> {
    if !(tof > 0.0 && tof.is_finite()) {
        return Err(LambertError::InvalidTimeOfFlight(tof));
    }
    let r0_norm = r0.magnitude();
    let r1_norm = r1.magnitude();
    if r0_norm == 0.0 || r1_norm == 0.0 {
        return Err(LambertError::ZeroPosition);
    }

    let cos_gamma = r0.dot(r1) / r0_norm / r1_norm;
    let a = direction.sign() * (r0_norm * r1_norm * (1.0 + cos_gamma)).sqrt();
    if a == 0.0 {
        return Err(LambertError::DegenerateGeometry);
    }

    let sqrt_mu = mu.sqrt();
    let mut psi = config.psi0;
    let mut psi_lower = config.psi_lower;
    let mut psi_upper = config.psi_upper;
    let mut c2_psi = c2(psi);
    let mut c3_psi = c3(psi);

    for n in 0..config.max_steps {
        let mut b = r0_norm + r1_norm + a * (psi * c3_psi - 1.0) / c2_psi.sqrt();

        if a > 0.0 && b < 0.0 {
            psi_lower += std::f64::consts::PI;
            b = -b;
        }

        let chi3 = (b / c2_psi).sqrt().powi(3);
        let tof_psi = (chi3 * c3_psi + a * b.sqrt()) / sqrt_mu;

        if (tof - tof_psi).abs() < config.tol {
            let f = 1.0 - b / r0_norm;
            let g = a * (b / mu).sqrt();
            let g_dot = 1.0 - b / r1_norm;
            return Ok(LambertSolution {
                v0: (r1 - f * r0) / g,
                v1: (g_dot * r1 - r0) / g,
                psi,
                iterations: n + 1,
            });
        }

        if tof_psi <= tof {
            psi_lower = psi;
        } else {
            psi_upper = psi;
        }

        psi = (psi_upper + psi_lower) / 2.0;
        c2_psi = c2(psi);
        c3_psi = c3(psi);
    }

    Err(LambertError::DidNotConverge {
        steps: config.max_steps,
    })
}
