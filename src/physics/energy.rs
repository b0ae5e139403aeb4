use super::errors::PhysicsError;
use crate::models::State;
use nalgebra as na;

/// Specific mechanical energy `v²/2 - mu/r` [km²/s²]
pub fn specific_energy(state: &State, mu: f64) -> Result<f64, PhysicsError> {
    let r = state.position.magnitude();
    if r == 0.0 {
        return Err(PhysicsError::ZeroPosition);
    }
    let v = state.velocity.magnitude();

    Ok(0.5 * v * v - mu / r)
}

/// Specific angular momentum `r x v` [km²/s]
pub fn specific_angular_momentum(state: &State) -> na::Vector3<f64> {
    state.position.cross(&state.velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::EARTH;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test_case(
        State::from_array([6378.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        -62.4944;
        "energy at Earth's surface"
    )]
    #[test_case(
        State::from_array([7000.0, 0.0, 0.0, 0.0, 7.545_946, 0.0]),
        -28.4707;
        "circular orbit at 7000 km"
    )]
    fn test_energy(state: State, expected_energy: f64) {
        assert_abs_diff_eq!(specific_energy(&state, EARTH.mu).unwrap(), expected_energy, epsilon = 1e-3);
    }

    #[test]
    fn energy_of_zero_position_is_an_error() {
        assert_eq!(specific_energy(&State::zero(), EARTH.mu), Err(PhysicsError::ZeroPosition));
    }

    #[test_case(
        State::from_array([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        na::Vector3::new(0.0, 0.0, 0.0); // Expected zero angular momentum
        "zero angular momentum"
    )]
    #[test_case(
        State::from_array([6478.0, 0.0, 0.0, 0.0, 7.848, 0.0]), // 100 km above Earth's surface
        na::Vector3::new(0.0, 0.0, 50_839.344);
        "100 km orbit angular momentum"
    )]
    fn test_angular_momentum(state: State, expected_momentum: na::Vector3<f64>) {
        let result = specific_angular_momentum(&state);
        assert_abs_diff_eq!(result, expected_momentum, epsilon = 1e-6);
    }
}
