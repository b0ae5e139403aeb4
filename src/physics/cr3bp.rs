//! Circular restricted three-body problem in the synodic (rotating) frame.
//!
//! Nondimensional units: the primaries are one length unit apart, their
//! total mass is one and the frame rotates at unit rate. The larger primary
//! sits at `(-mu, 0, 0)` and the smaller one at `(1 - mu, 0, 0)`.

use super::dynamics::EquationsOfMotion;
use super::errors::PhysicsError;
use crate::integrators::rkf78::{Rkf78, Solution};
use crate::integrators::{IntegrationError, Tolerances};
use lazy_static::lazy_static;
use nalgebra as na;
use std::collections::BTreeMap;
use thiserror::Error;

pub type Cr3bpState = na::Vector6<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cr3bpSystem {
    pub mu: f64,
    /// Collinear points `[L1, L2, L3]` on the x axis, where tabulated
    pub collinear: Option<[f64; 3]>,
}

lazy_static! {
    static ref SYSTEMS: BTreeMap<&'static str, Cr3bpSystem> = {
        let mut systems = BTreeMap::new();
        systems.insert(
            "earth-moon",
            Cr3bpSystem {
                mu: 0.012277471,
                collinear: Some([0.8362925909457339, 1.1561681659055247, -1.0051155116068917]),
            },
        );
        systems.insert(
            "sun-jupiter",
            Cr3bpSystem {
                mu: 0.000953875,
                collinear: None,
            },
        );
        systems
    };
}

#[derive(Debug, Error)]
pub enum Cr3bpError {
    #[error("unknown CR3BP system '{0}'")]
    UnknownSystem(String),
    #[error("mass ratio must lie in (0, 0.5], got {0}")]
    InvalidMassRatio(f64),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cr3bp {
    mu: f64,
    one_mu: f64,
    collinear: Option<[f64; 3]>,
}

impl Cr3bp {
    pub fn new(mu: f64) -> Result<Self, Cr3bpError> {
        if !(mu > 0.0 && mu <= 0.5) {
            return Err(Cr3bpError::InvalidMassRatio(mu));
        }
        Ok(Self {
            mu,
            one_mu: 1.0 - mu,
            collinear: None,
        })
    }

    /// Named system, e.g. `"earth-moon"` or `"sun-jupiter"`
    pub fn from_system(name: &str) -> Result<Self, Cr3bpError> {
        let system = SYSTEMS
            .get(name.to_lowercase().as_str())
            .ok_or_else(|| Cr3bpError::UnknownSystem(name.to_string()))?;
        Ok(Self {
            collinear: system.collinear,
            ..Self::new(system.mu)?
        })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn default_tolerances() -> Tolerances {
        Tolerances::new(1e-9, 1e-9)
    }

    /// Tabulated collinear Lagrange points `[L1, L2, L3]`
    pub fn collinear_points(&self) -> Option<[f64; 3]> {
        self.collinear
    }

    /// L4 (`upper`) or L5 equilateral point
    pub fn triangular_point(&self, upper: bool) -> na::Vector3<f64> {
        let y = 3.0f64.sqrt() / 2.0;
        na::Vector3::new(0.5 - self.mu, if upper { y } else { -y }, 0.0)
    }

    fn distances(&self, r: &na::Vector3<f64>) -> (f64, f64) {
        let r13 = na::Vector3::new(r.x + self.mu, r.y, r.z).magnitude();
        let r23 = na::Vector3::new(r.x - 1.0 + self.mu, r.y, r.z).magnitude();
        (r13, r23)
    }

    /// Effective potential `(x² + y²)/2 + (1 - mu)/r13 + mu/r23`
    pub fn pseudo_potential(&self, r: &na::Vector3<f64>) -> f64 {
        let (r13, r23) = self.distances(r);
        0.5 * (r.x * r.x + r.y * r.y) + self.one_mu / r13 + self.mu / r23
    }

    /// Jacobi integral `2Ω - v²`, conserved along any trajectory
    pub fn jacobi_constant(&self, state: &Cr3bpState) -> f64 {
        let r = na::Vector3::new(state[0], state[1], state[2]);
        let v2 = state[3] * state[3] + state[4] * state[4] + state[5] * state[5];
        2.0 * self.pseudo_potential(&r) - v2
    }

    /// Integrates `state0` over `[0, tspan]` with RKF7(8)
    pub fn propagate(&self, state0: &Cr3bpState, tspan: f64, tolerances: Tolerances) -> Result<Solution<Cr3bpState>, Cr3bpError> {
        log::info!("Propagating CR3BP orbit over {tspan} time units");
        let solver = Rkf78::new(*self, tolerances);
        let h0 = (tspan.abs() * 1e-3).max(1e-6) * tspan.signum();
        Ok(solver.integrate(0.0, state0, tspan, h0)?)
    }
}

impl EquationsOfMotion for Cr3bp {
    type State = Cr3bpState;

    fn compute_derivative(&self, _t: f64, state: &Cr3bpState) -> Result<Cr3bpState, PhysicsError> {
        let (x, y, z) = (state[0], state[1], state[2]);
        let (vx, vy, vz) = (state[3], state[4], state[5]);

        let (r13, r23) = self.distances(&na::Vector3::new(x, y, z));
        if r13 == 0.0 || r23 == 0.0 {
            return Err(PhysicsError::ZeroPosition);
        }
        let r13_3 = r13.powi(3);
        let r23_3 = r23.powi(3);

        let omega_x = x - self.one_mu * (x + self.mu) / r13_3 - self.mu * (x - 1.0 + self.mu) / r23_3;
        let omega_y = y - self.one_mu * y / r13_3 - self.mu * y / r23_3;
        let omega_z = -self.one_mu * z / r13_3 - self.mu * z / r23_3;

        Ok(Cr3bpState::new(vx, vy, vz, 2.0 * vy + omega_x, -2.0 * vx + omega_y, omega_z))
    }
}
