use crate::integrators::IntegrableState;
use nalgebra as na;

/// Spacecraft state: position [km], velocity [km/s] and mass [kg].
///
/// Mass is carried through integration but has no dynamics of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub position: na::Vector3<f64>,
    pub velocity: na::Vector3<f64>,
    pub mass: f64,
}

impl State {
    pub fn new(position: na::Vector3<f64>, velocity: na::Vector3<f64>, mass: f64) -> Self {
        State {
            position,
            velocity,
            mass,
        }
    }

    pub fn zero() -> Self {
        State {
            position: na::Vector3::zeros(),
            velocity: na::Vector3::zeros(),
            mass: 0.0,
        }
    }

    /// Builds a massless state from `[rx, ry, rz, vx, vy, vz]`
    pub fn from_array(values: [f64; 6]) -> Self {
        State {
            position: na::Vector3::new(values[0], values[1], values[2]),
            velocity: na::Vector3::new(values[3], values[4], values[5]),
            mass: 0.0,
        }
    }

    /// Columns in sink order: position xyz, velocity xyz, mass
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            self.mass,
        ]
    }

    pub fn to_vector6(&self) -> na::Vector6<f64> {
        na::Vector6::new(
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl std::ops::Add for State {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        State {
            position: self.position + other.position,
            velocity: self.velocity + other.velocity,
            mass: self.mass + other.mass,
        }
    }
}

impl std::ops::Mul<f64> for State {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        State {
            position: self.position * scalar,
            velocity: self.velocity * scalar,
            mass: self.mass * scalar,
        }
    }
}

impl IntegrableState for State {
    fn scaled_error(&self, error: &Self, atol: f64, rtol: f64) -> f64 {
        self.to_array()
            .iter()
            .zip(error.to_array().iter())
            .map(|(y, e)| e.abs() / (atol + rtol * y.abs()))
            .fold(0.0, f64::max)
    }

    fn is_finite(&self) -> bool {
        State::is_finite(self)
    }
}
