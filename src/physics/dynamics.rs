use super::errors::PhysicsError;
use super::perturbations::ForceModel;
use crate::models::State;

pub trait EquationsOfMotion {
    type State;

    fn compute_derivative(&self, t: f64, state: &Self::State) -> Result<Self::State, PhysicsError>;
}

/// Spacecraft dynamics under a full force model.
///
/// The integration variable `t` is elapsed seconds since `epoch0`.
pub struct SpacecraftDynamics<'a> {
    force_model: ForceModel<'a>,
    epoch0: f64,
}

impl<'a> SpacecraftDynamics<'a> {
    pub fn new(force_model: ForceModel<'a>, epoch0: f64) -> Self {
        Self { force_model, epoch0 }
    }
}

impl EquationsOfMotion for SpacecraftDynamics<'_> {
    type State = State;

    fn compute_derivative(&self, t: f64, state: &State) -> Result<State, PhysicsError> {
        let mut derivative = State::zero();

        // Position derivative is velocity
        derivative.position = state.velocity;

        // Velocity derivative is the total acceleration; mass is constant
        derivative.velocity = self.force_model.acceleration(self.epoch0 + t, state)?;

        Ok(derivative)
    }
}
