use super::errors::PhysicsError;
use super::gravity::gravity_acceleration;
use crate::ephemeris::{BodyId, EphemerisProvider};
use crate::models::State;
use nalgebra as na;

/// Oblateness parameters of the central body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct J2Params {
    pub j2: f64,
    pub mu: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerturbingBody {
    pub id: BodyId,
    pub name: String,
    pub mu: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Perturbation {
    J2(J2Params),
    NBody(Vec<PerturbingBody>),
}

/// Central gravity plus an ordered list of perturbations.
///
/// Perturbations are summed in declaration order.
pub struct ForceModel<'a> {
    pub mu: f64,
    pub central_id: BodyId,
    pub frame: String,
    pub perturbations: Vec<Perturbation>,
    pub ephemeris: Option<&'a dyn EphemerisProvider>,
}

impl<'a> ForceModel<'a> {
    pub fn new(mu: f64, central_id: BodyId, frame: &str) -> Self {
        Self {
            mu,
            central_id,
            frame: frame.to_string(),
            perturbations: Vec::new(),
            ephemeris: None,
        }
    }

    pub fn with_perturbation(mut self, perturbation: Perturbation) -> Self {
        self.perturbations.push(perturbation);
        self
    }

    pub fn with_ephemeris(mut self, ephemeris: &'a dyn EphemerisProvider) -> Self {
        self.ephemeris = Some(ephemeris);
        self
    }

    /// Total acceleration acting on `state` at `epoch` [km/s²]
    pub fn acceleration(&self, epoch: f64, state: &State) -> Result<na::Vector3<f64>, PhysicsError> {
        let mut acceleration = gravity_acceleration(&state.position, self.mu)?;
        for perturbation in &self.perturbations {
            acceleration += self.perturbing_acceleration(perturbation, epoch, &state.position)?;
        }
        Ok(acceleration)
    }

    fn perturbing_acceleration(
        &self,
        perturbation: &Perturbation,
        epoch: f64,
        position: &na::Vector3<f64>,
    ) -> Result<na::Vector3<f64>, PhysicsError> {
        match perturbation {
            Perturbation::J2(params) => j2_acceleration(position, params),
            Perturbation::NBody(bodies) => {
                let ephemeris = self.ephemeris.ok_or(PhysicsError::MissingEphemeris)?;
                let mut total = na::Vector3::zeros();
                for body in bodies {
                    let cb_to_body = ephemeris.position(body.id, epoch, &self.frame, self.central_id)?;
                    total += third_body_acceleration(position, &cb_to_body, body)?;
                }
                Ok(total)
            }
        }
    }
}

/// Zonal J2 acceleration in a frame whose z axis is the body's spin axis
pub fn j2_acceleration(position: &na::Vector3<f64>, params: &J2Params) -> Result<na::Vector3<f64>, PhysicsError> {
    let r = position.magnitude();
    if r == 0.0 {
        return Err(PhysicsError::ZeroPosition);
    }

    let z2 = position.z * position.z / (r * r);
    let factor = 1.5 * params.j2 * params.mu * params.radius * params.radius / r.powi(4);

    Ok(na::Vector3::new(
        factor * position.x / r * (5.0 * z2 - 1.0),
        factor * position.y / r * (5.0 * z2 - 1.0),
        factor * position.z / r * (5.0 * z2 - 3.0),
    ))
}

/// Differential pull of a third body on a spacecraft orbiting the central body.
///
/// `cb_to_body` is the body's position relative to the central body.
pub fn third_body_acceleration(
    position: &na::Vector3<f64>,
    cb_to_body: &na::Vector3<f64>,
    body: &PerturbingBody,
) -> Result<na::Vector3<f64>, PhysicsError> {
    let sc_to_body = cb_to_body - position;
    let d = sc_to_body.magnitude();
    let r_b = cb_to_body.magnitude();
    if d == 0.0 || r_b == 0.0 {
        return Err(PhysicsError::CoincidentBody(body.id));
    }

    Ok(body.mu * (sc_to_body / d.powi(3) - cb_to_body / r_b.powi(3)))
}
