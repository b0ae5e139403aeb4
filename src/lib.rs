//! Astrodynamics toolkit: trajectory propagation with stop conditions,
//! perturbation force models, Lambert and V-infinity solvers, eclipse
//! detection and a circular restricted three-body integrator.

pub mod config;
pub mod constants;
pub mod coordinates;
pub mod ephemeris;
pub mod fsm;
pub mod gnc;
pub mod integrators;
pub mod models;
pub mod numerics;
pub mod physics;
pub mod propagator;
pub mod time;

pub use ephemeris::{EphemerisProvider, KeplerianEphemeris};
pub use models::{CentralBody, State, Trajectory};
pub use propagator::{Propagation, PropagationError, Propagator, PropagatorConfig, TerminationStatus};
