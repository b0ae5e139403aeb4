//! The two integration engines behind [`Propagator::run`].
//!
//! Both integrate in elapsed seconds since the initial epoch; epochs are only
//! formed when the force model, the stop conditions or the trajectory need
//! them.

use super::{EventContext, EventRecord, Propagation, PropagationError, PropagationStats, Propagator, TerminationStatus};
use crate::fsm::PropagationFSM;
use crate::integrators::coefficients::STAGES;
use crate::integrators::events::{crossed_discretely, sign_change_detected, EventConfig};
use crate::integrators::rk4::RK4;
use crate::integrators::rkf78::Rkf78;
use crate::integrators::Tolerances;
use crate::models::{State, Trajectory};
use crate::numerics::root::brent_root;
use crate::numerics::NumericsError;
use crate::physics::dynamics::SpacecraftDynamics;
use crate::physics::errors::PhysicsError;
use log::{debug, info};

pub(super) struct AdaptiveSettings {
    pub atol: f64,
    pub rtol: f64,
    pub initial_step: Option<f64>,
    pub max_step: Option<f64>,
    pub min_step: f64,
    pub max_steps: usize,
}

/// Failure inside a root-refinement residual
enum RefineError {
    Numerics(NumericsError),
    Physics(PhysicsError),
}

impl From<NumericsError> for RefineError {
    fn from(e: NumericsError) -> Self {
        RefineError::Numerics(e)
    }
}

impl From<PhysicsError> for RefineError {
    fn from(e: PhysicsError) -> Self {
        RefineError::Physics(e)
    }
}

/// A refined crossing inside one accepted step
struct Crossing {
    /// Offset from the start of the step [s]
    offset: f64,
    index: usize,
    state: State,
}

impl Propagator<'_> {
    pub(super) fn run_adaptive(&self, settings: AdaptiveSettings) -> Result<Propagation, PropagationError> {
        let t0 = self.config.initial_epoch;
        let span = self.duration;
        let max_step = settings.max_step.unwrap_or(f64::INFINITY);

        let mut solver = Rkf78::new(self.dynamics(), Tolerances::new(settings.atol, settings.rtol));
        solver.set_step_limits(settings.min_step, max_step);

        let ctx = self.event_context();
        let mut fsm = PropagationFSM::new(t0);
        let mut trajectory = Trajectory::new(self.config.central_body.clone(), &self.config.frame);
        let mut stats = PropagationStats::default();
        let mut events = Vec::new();

        let mut tau = 0.0;
        let mut y = self.initial_state;
        let mut g_prev = ctx
            .evaluate_all(&self.stop_conditions, t0, &y)
            .map_err(|source| PropagationError::ForceModel { epoch: t0, source })?;
        let mut h = settings
            .initial_step
            .unwrap_or_else(|| (span * 1e-3).min(60.0))
            .min(max_step);

        trajectory.push(t0, y);
        fsm.start(t0);

        while tau < span {
            let remaining = span - tau;
            let last = h >= remaining;
            if last {
                h = remaining;
            }

            let outcome = solver.step(tau, &y, h).map_err(|source| {
                fsm.abort(t0 + tau, &source.to_string());
                PropagationError::ForceModel { epoch: t0 + tau, source }
            })?;
            stats.fn_evals += STAGES as u64;

            if stats.accepted_steps + stats.rejected_steps >= settings.max_steps as u64 {
                fsm.abort(t0 + tau, "step budget exhausted");
                return Err(PropagationError::MaxStepsExceeded {
                    epoch: t0 + tau,
                    max_steps: settings.max_steps,
                    last_state: y,
                });
            }

            if !outcome.accepted {
                stats.rejected_steps += 1;
                debug!(
                    "Rejected step of {:.6e} s at epoch {:.3} (error {:.3e})",
                    h,
                    t0 + tau,
                    outcome.error
                );
                if outcome.h_next < settings.min_step || tau + outcome.h_next == tau {
                    fsm.abort(t0 + tau, "step size underflow");
                    return Err(PropagationError::StepSizeTooSmall {
                        epoch: t0 + tau,
                        step: outcome.h_next,
                        last_state: y,
                    });
                }
                h = outcome.h_next;
                continue;
            }

            stats.accepted_steps += 1;
            let tau_new = if last { span } else { outcome.t };
            let y_new = outcome.y;
            if !y_new.is_finite() {
                fsm.abort(t0 + tau_new, "non-finite state");
                return Err(PropagationError::NonFiniteState {
                    epoch: t0 + tau_new,
                    last_state: y,
                });
            }

            let g_new = ctx
                .evaluate_all(&self.stop_conditions, t0 + tau_new, &y_new)
                .map_err(|source| PropagationError::ForceModel {
                    epoch: t0 + tau_new,
                    source,
                })?;

            let mut crossings = Vec::new();
            for (index, condition) in self.stop_conditions.iter().enumerate() {
                if !sign_change_detected(g_prev[index], g_new[index], condition.direction) {
                    continue;
                }
                fsm.begin_refinement(t0 + tau);
                let crossing = self
                    .refine_crossing(&solver, &ctx, index, tau, &y, tau_new - tau, (g_prev[index], g_new[index]), &y_new)
                    .inspect_err(|e| {
                        fsm.abort(t0 + tau, &e.to_string());
                    })?;
                stats.refined_events += 1;
                crossings.push(crossing);
            }
            if !crossings.is_empty() {
                fsm.end_refinement(t0 + tau);
            }

            // Earliest first; declaration order breaks ties
            crossings.sort_by(|a, b| a.offset.total_cmp(&b.offset).then(a.index.cmp(&b.index)));
            let terminal = crossings
                .iter()
                .position(|c| self.stop_conditions[c.index].terminal);
            let cutoff = terminal.map_or(f64::INFINITY, |i| crossings[i].offset);

            for crossing in crossings.iter().filter(|c| !self.stop_conditions[c.index].terminal && c.offset <= cutoff) {
                let record = self.record(crossing, t0 + tau);
                debug!("Recorded {} at epoch {:.3}", record.name, record.epoch);
                events.push(record);
            }

            if let Some(i) = terminal {
                let record = self.record(&crossings[i], t0 + tau);
                if record.epoch > t0 + tau {
                    trajectory.push(record.epoch, record.state);
                }
                return Ok(self.finish(fsm, trajectory, TerminationStatus::StopConditionMet(record), events, stats));
            }

            trajectory.push(t0 + tau_new, y_new);
            tau = tau_new;
            y = y_new;
            g_prev = g_new;
            h = outcome.h_next;
        }

        Ok(self.finish(fsm, trajectory, TerminationStatus::TimeSpanExhausted, events, stats))
    }

    pub(super) fn run_fixed_step(&self, step: f64) -> Result<Propagation, PropagationError> {
        let t0 = self.config.initial_epoch;
        let span = self.duration;
        let rk4 = RK4::new(self.dynamics());

        let ctx = self.event_context();
        let mut fsm = PropagationFSM::new(t0);
        let mut trajectory = Trajectory::new(self.config.central_body.clone(), &self.config.frame);
        let mut stats = PropagationStats::default();
        let mut events = Vec::new();

        let mut tau = 0.0;
        let mut y = self.initial_state;
        let mut g_prev = ctx
            .evaluate_all(&self.stop_conditions, t0, &y)
            .map_err(|source| PropagationError::ForceModel { epoch: t0, source })?;

        trajectory.push(t0, y);
        fsm.start(t0);

        while tau < span {
            let remaining = span - tau;
            let last = step >= remaining;
            let h = if last { remaining } else { step };

            let y_new = rk4.integrate(tau, &y, h).map_err(|source| {
                fsm.abort(t0 + tau, &source.to_string());
                PropagationError::ForceModel { epoch: t0 + tau, source }
            })?;
            stats.fn_evals += 4;
            stats.accepted_steps += 1;

            let tau_new = if last { span } else { tau + h };
            if !y_new.is_finite() {
                fsm.abort(t0 + tau_new, "non-finite state");
                return Err(PropagationError::NonFiniteState {
                    epoch: t0 + tau_new,
                    last_state: y,
                });
            }

            let g_new = ctx
                .evaluate_all(&self.stop_conditions, t0 + tau_new, &y_new)
                .map_err(|source| PropagationError::ForceModel {
                    epoch: t0 + tau_new,
                    source,
                })?;

            let crossed: Vec<usize> = self
                .stop_conditions
                .iter()
                .enumerate()
                .filter(|(i, c)| crossed_discretely(g_prev[*i], g_new[*i], c.direction))
                .map(|(i, _)| i)
                .collect();

            // A terminal violation rejects the step; the run ends on the last valid sample
            if let Some(&index) = crossed.iter().find(|&&i| self.stop_conditions[i].terminal) {
                let record = EventRecord {
                    name: self.stop_conditions[index].name.clone(),
                    index,
                    epoch: t0 + tau,
                    state: y,
                };
                return Ok(self.finish(fsm, trajectory, TerminationStatus::StopConditionMet(record), events, stats));
            }

            for index in crossed {
                events.push(EventRecord {
                    name: self.stop_conditions[index].name.clone(),
                    index,
                    epoch: t0 + tau_new,
                    state: y_new,
                });
            }

            trajectory.push(t0 + tau_new, y_new);
            tau = tau_new;
            y = y_new;
            g_prev = g_new;
        }

        Ok(self.finish(fsm, trajectory, TerminationStatus::TimeSpanExhausted, events, stats))
    }

    /// Locates the crossing of condition `index` inside the accepted step
    /// `[tau, tau + h]` by re-stepping from the start of the step.
    #[allow(clippy::too_many_arguments)]
    fn refine_crossing(
        &self,
        solver: &Rkf78<SpacecraftDynamics<'_>>,
        ctx: &EventContext<'_>,
        index: usize,
        tau: f64,
        y: &State,
        h: f64,
        (g_a, g_b): (f64, f64),
        y_b: &State,
    ) -> Result<Crossing, PropagationError> {
        let condition = &self.stop_conditions[index];
        let epoch_a = self.config.initial_epoch + tau;
        let state_at = |offset: f64| -> Result<State, PhysicsError> {
            if offset == h {
                Ok(*y_b)
            } else {
                solver.solution_at(tau, y, offset)
            }
        };
        let residual = |offset: f64| -> Result<f64, RefineError> {
            let state = state_at(offset)?;
            Ok(ctx.evaluate(condition, epoch_a + offset, &state)?)
        };

        let config = EventConfig::default();
        let convert = |e: RefineError| match e {
            RefineError::Numerics(source) => PropagationError::EventRefinement {
                name: condition.name.clone(),
                source,
            },
            RefineError::Physics(source) => PropagationError::ForceModel { epoch: epoch_a, source },
        };

        let root = brent_root(residual, 0.0, h, g_a, g_b, config.root_tol, config.max_iter).map_err(convert)?;
        let state = state_at(root.root).map_err(|source| PropagationError::ForceModel { epoch: epoch_a, source })?;

        Ok(Crossing {
            offset: root.root,
            index,
            state,
        })
    }

    fn record(&self, crossing: &Crossing, step_start: f64) -> EventRecord {
        EventRecord {
            name: self.stop_conditions[crossing.index].name.clone(),
            index: crossing.index,
            epoch: step_start + crossing.offset,
            state: crossing.state,
        }
    }

    fn finish(
        &self,
        mut fsm: PropagationFSM,
        trajectory: Trajectory,
        status: TerminationStatus,
        events: Vec<EventRecord>,
        stats: PropagationStats,
    ) -> Propagation {
        let end = trajectory.last().map_or(self.config.initial_epoch, |(t, _)| t);
        if let TerminationStatus::StopConditionMet(record) = &status {
            info!("Spacecraft has reached {}.", record.name);
        }
        fsm.terminate(end);
        info!(
            "Propagation finished after {} steps ({} rejected, {} function evaluations)",
            stats.accepted_steps, stats.rejected_steps, stats.fn_evals
        );

        Propagation {
            trajectory,
            status,
            events,
            stats,
        }
    }
}
