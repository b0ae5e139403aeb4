//! Runge-Kutta-Fehlberg 7(8) integrator
//!
//! A 13-stage embedded pair: the 8th-order solution is propagated and the
//! difference to the 7th-order solution drives step-size control.

use super::coefficients::{A, B, B_ERR, C, STAGES};
use super::{IntegrableState, IntegrationError, Tolerances};
use crate::physics::dynamics::EquationsOfMotion;
use crate::physics::errors::PhysicsError;

/// Result of a single attempted step
#[derive(Debug, Clone)]
pub struct StepOutcome<S> {
    /// 8th-order solution at `t + h`
    pub y: S,
    pub t: f64,
    /// Normalized error; the step is accepted when it is at most 1
    pub error: f64,
    /// Suggested magnitude of the next step
    pub h_next: f64,
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub fn_evals: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

/// I-controller: `h_new = safety * h * error^(-1/8)`
#[derive(Debug, Clone, Copy)]
pub struct StepController {
    pub safety: f64,
    pub max_factor: f64,
    pub min_factor: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
        }
    }
}

impl StepController {
    pub fn compute_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        (self.safety * error.powf(-1.0 / 8.0)).clamp(self.min_factor, self.max_factor)
    }
}

/// Sampled solution of a plain (event-free) integration
#[derive(Debug, Clone)]
pub struct Solution<S> {
    pub times: Vec<f64>,
    pub states: Vec<S>,
    pub stats: Stats,
}

pub struct Rkf78<T: EquationsOfMotion> {
    eom: T,
    tol: Tolerances,
    controller: StepController,
    pub h_min: f64,
    pub h_max: f64,
    pub max_steps: usize,
}

impl<T: EquationsOfMotion> Rkf78<T>
where
    T::State: IntegrableState,
{
    pub fn new(eom: T, tol: Tolerances) -> Self {
        Self {
            eom,
            tol,
            controller: StepController::default(),
            h_min: 1e-8,
            h_max: f64::INFINITY,
            max_steps: 1_000_000,
        }
    }

    pub fn set_step_limits(&mut self, h_min: f64, h_max: f64) {
        self.h_min = h_min;
        self.h_max = h_max;
    }

    /// Attempts one step of size `h` from `(t, y)`.
    ///
    /// The step is taken as given; the caller decides what to do with a
    /// rejected outcome.
    pub fn step(&self, t: f64, y: &T::State, h: f64) -> Result<StepOutcome<T::State>, PhysicsError> {
        let k = self.compute_stages(t, y, h)?;

        let mut y8 = y.clone();
        let mut err = k[0].clone() * (h * B_ERR[0]);
        for (i, ki) in k.iter().enumerate() {
            if B[i] != 0.0 {
                y8 = y8 + ki.clone() * (h * B[i]);
            }
            if i > 0 && B_ERR[i] != 0.0 {
                err = err + ki.clone() * (h * B_ERR[i]);
            }
        }

        let error = y8.scaled_error(&err, self.tol.atol, self.tol.rtol);
        let accepted = error <= 1.0;
        let h_next = (h.abs() * self.controller.compute_factor(error)).min(self.h_max);

        Ok(StepOutcome {
            y: y8,
            t: t + h,
            error,
            h_next,
            accepted,
        })
    }

    /// 8th-order solution at `t + h` from a single step, regardless of the
    /// error estimate. Used to evaluate interior times of an accepted step,
    /// where any shorter step is at least as accurate.
    pub fn solution_at(&self, t: f64, y: &T::State, h: f64) -> Result<T::State, PhysicsError> {
        Ok(self.step(t, y, h)?.y)
    }

    /// Integrates from `t0` to `tf`, keeping every accepted step
    pub fn integrate(&self, t0: f64, y0: &T::State, tf: f64, h0: f64) -> Result<Solution<T::State>, IntegrationError> {
        if !t0.is_finite() || !tf.is_finite() || !h0.is_finite() || h0 == 0.0 {
            return Err(IntegrationError::InvalidInput(
                "t0, tf and h0 must be finite and h0 non-zero".to_string(),
            ));
        }

        let direction = (tf - t0).signum();
        let mut solution = Solution {
            times: vec![t0],
            states: vec![y0.clone()],
            stats: Stats::default(),
        };

        let mut t = t0;
        let mut y = y0.clone();
        let mut h = h0.abs() * direction;

        while (tf - t) * direction > 0.0 {
            let last = (t + h - tf) * direction >= 0.0;
            if last {
                h = tf - t;
            }

            let outcome = self
                .step(t, &y, h)
                .map_err(|source| IntegrationError::Dynamics { t, source })?;
            solution.stats.fn_evals += STAGES as u64;

            if outcome.accepted {
                solution.stats.accepted_steps += 1;
                t = if last { tf } else { outcome.t };
                y = outcome.y;
                if !y.is_finite() {
                    return Err(IntegrationError::NonFiniteState { t });
                }
                solution.times.push(t);
                solution.states.push(y.clone());
            } else {
                solution.stats.rejected_steps += 1;
                if outcome.h_next < self.h_min || t + outcome.h_next * direction == t {
                    return Err(IntegrationError::StepSizeTooSmall { t, h: outcome.h_next });
                }
            }

            h = outcome.h_next * direction;

            if (solution.stats.accepted_steps + solution.stats.rejected_steps) as usize > self.max_steps {
                return Err(IntegrationError::MaxStepsExceeded(self.max_steps));
            }
        }

        Ok(solution)
    }

    fn compute_stages(&self, t: f64, y: &T::State, h: f64) -> Result<Vec<T::State>, PhysicsError> {
        let mut k: Vec<T::State> = Vec::with_capacity(STAGES);
        k.push(self.eom.compute_derivative(t, y)?);

        for i in 1..STAGES {
            let mut y_temp = y.clone();
            for (j, kj) in k.iter().enumerate() {
                if A[i][j] != 0.0 {
                    y_temp = y_temp + kj.clone() * (h * A[i][j]);
                }
            }
            k.push(self.eom.compute_derivative(t + C[i] * h, &y_temp)?);
        }
        Ok(k)
    }
}
