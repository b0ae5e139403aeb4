use super::errors::PhysicsError;
use nalgebra as na;

/// Point-mass gravity `-mu r / |r|³` [km/s²]
pub fn gravity_acceleration(position: &na::Vector3<f64>, mu: f64) -> Result<na::Vector3<f64>, PhysicsError> {
    let r: f64 = position.magnitude();
    if r == 0.0 {
        return Err(PhysicsError::ZeroPosition);
    }
    Ok(position * (-mu / (r * r * r)))
}
