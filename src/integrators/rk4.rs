use super::IntegrableState;
use crate::physics::dynamics::EquationsOfMotion;
use crate::physics::errors::PhysicsError;

/// Classic fixed-step fourth-order Runge-Kutta
pub struct RK4<T: EquationsOfMotion> {
    eom: T,
}

impl<T: EquationsOfMotion> RK4<T>
where
    T::State: IntegrableState,
{
    pub fn new(eom: T) -> Self {
        RK4 { eom }
    }

    /// Advances `state` from `t` by `dt`
    pub fn integrate(&self, t: f64, state: &T::State, dt: f64) -> Result<T::State, PhysicsError> {
        let k1 = self.eom.compute_derivative(t, state)?;

        let state2 = state.clone() + k1.clone() * (dt / 2.0);
        let k2 = self.eom.compute_derivative(t + dt / 2.0, &state2)?;

        let state3 = state.clone() + k2.clone() * (dt / 2.0);
        let k3 = self.eom.compute_derivative(t + dt / 2.0, &state3)?;

        let state4 = state.clone() + k3.clone() * dt;
        let k4 = self.eom.compute_derivative(t + dt, &state4)?;

        Ok(state.clone() + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra as na;

    struct Decay;

    impl EquationsOfMotion for Decay {
        type State = na::Vector1<f64>;

        fn compute_derivative(&self, _t: f64, state: &Self::State) -> Result<Self::State, PhysicsError> {
            Ok(-state)
        }
    }

    #[test]
    fn exponential_decay() {
        let rk4 = RK4::new(Decay);
        let mut y = na::Vector1::new(1.0);
        let dt = 0.01;
        for i in 0..100 {
            y = rk4.integrate(i as f64 * dt, &y, dt).unwrap();
        }
        assert_relative_eq!(y[0], (-1.0f64).exp(), max_relative = 1e-9);
    }
}
