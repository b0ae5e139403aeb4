use super::errors::NumericsError;
use nalgebra as na;

/// Unit vector along `v`. A zero vector is an error, not NaN.
pub fn normed(v: &na::Vector3<f64>) -> Result<na::Vector3<f64>, NumericsError> {
    let magnitude = v.magnitude();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(NumericsError::ZeroVector);
    }
    Ok(v / magnitude)
}

/// Angle between two vectors [rad], in [0, π]
pub fn angle_between(v0: &na::Vector3<f64>, v1: &na::Vector3<f64>) -> Result<f64, NumericsError> {
    let cos_angle = normed(v0)?.dot(&normed(v1)?);
    Ok(cos_angle.clamp(-1.0, 1.0).acos())
}

/// Principal X axis active rotation matrix
pub fn rot_x(angle: f64) -> na::Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    na::Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, -s, //
        0.0, s, c,
    )
}

/// Principal Z axis active rotation matrix
pub fn rot_z(angle: f64) -> na::Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    na::Matrix3::new(
        c, -s, 0.0, //
        s, c, 0.0, //
        0.0, 0.0, 1.0,
    )
}
