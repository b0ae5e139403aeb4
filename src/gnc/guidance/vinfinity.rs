//! Patched-conic V-infinity matching at a flyby body.
//!
//! Finds the time of flight from `planet0` to `planet1` whose Lambert arc
//! leaves `planet0` with the same hyperbolic excess speed the spacecraft
//! arrived with.

use super::lambert::{solve_lambert, LambertConfig, LambertError, TransferDirection};
use crate::config::bodies::SUN;
use crate::constants::{ECLIPTIC_FRAME, SOLAR_SYSTEM_BARYCENTER};
use crate::ephemeris::{BodyId, EphemerisError, EphemerisProvider};
use crate::numerics::root::{newton_root_fd, FdNewtonConfig};
use crate::numerics::NumericsError;
use log::debug;
use nalgebra as na;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VInfinityError {
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error("Lambert arc failed: {0}")]
    Lambert(#[from] LambertError),
    #[error("time-of-flight search failed: {0}")]
    RootFinding(#[from] NumericsError),
}

#[derive(Debug, Clone)]
pub struct VInfinityOptions {
    pub frame: String,
    pub center: BodyId,
    pub mu: f64,
    pub direction: TransferDirection,
    /// Finite-difference step on the time of flight [s]
    pub diff_step: f64,
    /// Convergence tolerance on the time of flight [s]
    pub tol: f64,
    pub max_steps: usize,
}

impl Default for VInfinityOptions {
    fn default() -> Self {
        Self {
            frame: ECLIPTIC_FRAME.to_string(),
            center: SOLAR_SYSTEM_BARYCENTER,
            mu: SUN.mu,
            direction: TransferDirection::Prograde,
            diff_step: 1e-3,
            tol: 1e-4,
            max_steps: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VInfinityMatch {
    pub tof: f64,
    /// Spacecraft velocity leaving `planet0`
    pub v_depart: na::Vector3<f64>,
    /// Spacecraft velocity arriving at `planet1`
    pub v_arrive: na::Vector3<f64>,
    /// Matched excess speed at `planet0` [km/s]
    pub v_infinity: f64,
    pub iterations: usize,
}

/// Solves for the outgoing leg from `planet0` at `et0` given the incoming
/// spacecraft velocity `v_incoming` there, starting the search at `tof_guess`.
pub fn vinfinity_match(
    provider: &dyn EphemerisProvider,
    planet0: BodyId,
    planet1: BodyId,
    v_incoming: &na::Vector3<f64>,
    et0: f64,
    tof_guess: f64,
    options: &VInfinityOptions,
) -> Result<VInfinityMatch, VInfinityError> {
    let state0 = provider.state(planet0, et0, &options.frame, options.center)?;
    let r_planet0 = state0.fixed_rows::<3>(0).into_owned();
    let v_planet0 = state0.fixed_rows::<3>(3).into_owned();
    let v_infinity = (v_incoming - v_planet0).magnitude();

    let lambert_config = LambertConfig::default();
    let leg = |tof: f64| -> Result<(na::Vector3<f64>, na::Vector3<f64>), VInfinityError> {
        let r_planet1 = provider.position(planet1, et0 + tof, &options.frame, options.center)?;
        let solution = solve_lambert(&r_planet0, &r_planet1, tof, options.mu, options.direction, &lambert_config)?;
        Ok((solution.v0, solution.v1))
    };

    let residual = |tof: f64| -> Result<f64, VInfinityError> {
        let (v_depart, _) = leg(tof)?;
        Ok(v_infinity - (v_depart - v_planet0).magnitude())
    };

    let config = FdNewtonConfig {
        tol: options.tol,
        max_steps: options.max_steps,
        diff_step: options.diff_step,
    };
    let root = newton_root_fd(residual, tof_guess, &config)?;
    debug!(
        "Matched v-infinity {:.6} km/s from body {} to {} with tof {:.3} s in {} iterations",
        v_infinity, planet0, planet1, root.root, root.iterations
    );

    let (v_depart, v_arrive) = leg(root.root)?;
    Ok(VInfinityMatch {
        tof: root.root,
        v_depart,
        v_arrive,
        v_infinity,
        iterations: root.iterations,
    })
}
