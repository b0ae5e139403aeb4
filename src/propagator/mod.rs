//! Spacecraft trajectory propagation with stop conditions.
//!
//! A [`Propagator`] is built once from a validated [`PropagatorConfig`] and an
//! optional ephemeris handle; [`Propagator::run`] integrates the equations of
//! motion with the configured engine and returns the sampled trajectory
//! together with how the run ended.

pub mod config;
mod engines;
pub mod stop_conditions;

pub use config::{
    InitialState, IntegratorSettings, PerturbationSettings, PropagatorConfig, StopConditionSettings, TimeSpan,
};
pub use stop_conditions::{EventContext, EventFn, StopCondition, StopConditionKind};

use crate::ephemeris::EphemerisProvider;
use crate::models::{State, Trajectory};
use crate::numerics::NumericsError;
use crate::physics::dynamics::SpacecraftDynamics;
use crate::physics::errors::PhysicsError;
use crate::physics::orbital::OrbitalMechanics;
use crate::physics::perturbations::{ForceModel, J2Params, Perturbation, PerturbingBody};
use thiserror::Error;

/// A stop condition crossing
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub name: String,
    /// Position of the condition in [`Propagator::stop_conditions`]
    pub index: usize,
    pub epoch: f64,
    pub state: State,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminationStatus {
    TimeSpanExhausted,
    StopConditionMet(EventRecord),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    pub accepted_steps: u64,
    pub rejected_steps: u64,
    pub fn_evals: u64,
    pub refined_events: u64,
}

#[derive(Debug, Clone)]
pub struct Propagation {
    pub trajectory: Trajectory,
    pub status: TerminationStatus,
    /// Non-terminal crossings, in time order
    pub events: Vec<EventRecord>,
    pub stats: PropagationStats,
}

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("force model failed at epoch {epoch}: {source}")]
    ForceModel {
        epoch: f64,
        #[source]
        source: PhysicsError,
    },
    #[error("non-finite state produced at epoch {epoch}")]
    NonFiniteState { epoch: f64, last_state: State },
    #[error("step size {step:e} fell below the minimum at epoch {epoch}")]
    StepSizeTooSmall { epoch: f64, step: f64, last_state: State },
    #[error("maximum number of steps ({max_steps}) exceeded at epoch {epoch}")]
    MaxStepsExceeded {
        epoch: f64,
        max_steps: usize,
        last_state: State,
    },
    #[error("could not locate crossing of '{name}': {source}")]
    EventRefinement {
        name: String,
        #[source]
        source: NumericsError,
    },
}

fn invalid(message: impl Into<String>) -> PropagationError {
    PropagationError::InvalidConfiguration(message.into())
}

pub struct Propagator<'a> {
    config: PropagatorConfig,
    ephemeris: Option<&'a dyn EphemerisProvider>,
    initial_state: State,
    duration: f64,
    perturbations: Vec<Perturbation>,
    stop_conditions: Vec<StopCondition>,
}

impl<'a> Propagator<'a> {
    /// Validates `config` and resolves everything that does not change
    /// during a run.
    pub fn new(config: PropagatorConfig, ephemeris: Option<&'a dyn EphemerisProvider>) -> Result<Self, PropagationError> {
        let body = &config.central_body;

        let mut initial_state = match &config.initial_state {
            InitialState::Cartesian(state) => *state,
            InitialState::Elements(elements) => OrbitalMechanics::elements_to_state(elements, body.mu),
        };
        initial_state.mass = config.mass0;
        if !initial_state.is_finite() {
            return Err(invalid("initial state is not finite"));
        }
        if initial_state.position.magnitude() == 0.0 {
            return Err(invalid("initial position has zero magnitude"));
        }
        if !config.initial_epoch.is_finite() {
            return Err(invalid("initial epoch is not finite"));
        }

        validate_integrator(&config.integrator)?;

        let duration = match config.time_span {
            TimeSpan::Seconds(seconds) => seconds,
            TimeSpan::Periods(periods) => {
                let period = OrbitalMechanics::state_period(&initial_state, body.mu)
                    .map_err(|e| invalid(format!("initial state has no period: {e}")))?
                    .ok_or_else(|| invalid("time span in periods requires a bound initial orbit"))?;
                periods * period
            }
        };
        if !(duration.is_finite() && duration > 0.0) {
            return Err(invalid(format!("time span must be positive and finite, got {duration}")));
        }

        let mut perturbations = Vec::new();
        if config.perturbations.j2 {
            let j2 = body
                .j2
                .ok_or_else(|| invalid(format!("J2 requested but {} has no J2 coefficient", body.name)))?;
            perturbations.push(Perturbation::J2(J2Params {
                j2,
                mu: body.mu,
                radius: body.radius,
            }));
        }
        if !config.perturbations.n_bodies.is_empty() {
            if ephemeris.is_none() {
                return Err(invalid("n-body perturbations require an ephemeris provider"));
            }
            if config.perturbations.n_bodies.iter().any(|b| b.id == body.id) {
                return Err(invalid("the central body cannot perturb itself"));
            }
            perturbations.push(Perturbation::NBody(
                config
                    .perturbations
                    .n_bodies
                    .iter()
                    .map(|b| PerturbingBody {
                        id: b.id,
                        name: b.name.clone(),
                        mu: b.mu,
                    })
                    .collect(),
            ));
        }

        let stop_conditions = build_stop_conditions(&config, ephemeris.is_some())?;

        let propagator = Self {
            config,
            ephemeris,
            initial_state,
            duration,
            perturbations,
            stop_conditions,
        };

        if let Some(index) = propagator
            .stop_conditions
            .iter()
            .position(|c| matches!(c.kind, StopConditionKind::MinAltitude { .. }))
        {
            let g = propagator
                .event_context()
                .evaluate(&propagator.stop_conditions[index], propagator.config.initial_epoch, &initial_state)
                .map_err(|e| invalid(e.to_string()))?;
            if g < 0.0 {
                return Err(invalid(format!(
                    "initial altitude is {:.3} km below the minimum altitude",
                    -g
                )));
            }
            // On the floor and descending: no step can register the crossing
            if g == 0.0 && initial_state.position.dot(&initial_state.velocity) < 0.0 {
                return Err(invalid("initial state is on the minimum altitude and descending"));
            }
        }

        Ok(propagator)
    }

    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn initial_epoch(&self) -> f64 {
        self.config.initial_epoch
    }

    pub fn final_epoch(&self) -> f64 {
        self.config.initial_epoch + self.duration
    }

    /// Active stop conditions in evaluation order
    pub fn stop_conditions(&self) -> &[StopCondition] {
        &self.stop_conditions
    }

    pub fn run(&self) -> Result<Propagation, PropagationError> {
        match self.config.integrator {
            IntegratorSettings::Adaptive {
                atol,
                rtol,
                initial_step,
                max_step,
                min_step,
                max_steps,
            } => self.run_adaptive(engines::AdaptiveSettings {
                atol,
                rtol,
                initial_step,
                max_step,
                min_step,
                max_steps,
            }),
            IntegratorSettings::FixedStep { step } => self.run_fixed_step(step),
        }
    }

    fn dynamics(&self) -> SpacecraftDynamics<'a> {
        let body = &self.config.central_body;
        let mut force_model = ForceModel::new(body.mu, body.id, &self.config.frame);
        for perturbation in &self.perturbations {
            force_model = force_model.with_perturbation(perturbation.clone());
        }
        if let Some(ephemeris) = self.ephemeris {
            force_model = force_model.with_ephemeris(ephemeris);
        }
        SpacecraftDynamics::new(force_model, self.config.initial_epoch)
    }

    fn event_context(&self) -> EventContext<'_> {
        EventContext {
            central_radius: self.config.central_body.radius,
            central_id: self.config.central_body.id,
            frame: &self.config.frame,
            ephemeris: self.ephemeris,
        }
    }
}

fn validate_integrator(settings: &IntegratorSettings) -> Result<(), PropagationError> {
    let positive = |value: f64| value.is_finite() && value > 0.0;
    match *settings {
        IntegratorSettings::Adaptive {
            atol,
            rtol,
            initial_step,
            max_step,
            min_step,
            max_steps,
        } => {
            if !positive(atol) || !positive(rtol) {
                return Err(invalid("tolerances must be positive and finite"));
            }
            if initial_step.is_some_and(|h| !positive(h)) || max_step.is_some_and(|h| !positive(h)) {
                return Err(invalid("step sizes must be positive and finite"));
            }
            if !(min_step.is_finite() && min_step >= 0.0) {
                return Err(invalid("minimum step must be non-negative"));
            }
            if max_steps == 0 {
                return Err(invalid("maximum step count must be positive"));
            }
        }
        IntegratorSettings::FixedStep { step } => {
            if !positive(step) {
                return Err(invalid("fixed step must be positive and finite"));
            }
        }
    }
    Ok(())
}

fn build_stop_conditions(config: &PropagatorConfig, has_ephemeris: bool) -> Result<Vec<StopCondition>, PropagationError> {
    let body = &config.central_body;
    let settings = &config.stop_conditions;
    let mut conditions = Vec::new();

    if !settings.disable_min_altitude {
        conditions.push(StopCondition::min_altitude(
            settings.min_altitude.unwrap_or(body.deorbit_altitude),
        ));
    }
    if let Some(ceiling) = settings.max_altitude {
        conditions.push(StopCondition::max_altitude(ceiling));
    }
    if let Some(target) = &settings.enter_soi {
        if !has_ephemeris {
            return Err(invalid("enter-SOI requires an ephemeris provider"));
        }
        if target.id == body.id {
            return Err(invalid("cannot enter the sphere of influence of the central body"));
        }
        conditions.push(
            StopCondition::enter_soi(target)
                .ok_or_else(|| invalid(format!("{} has no sphere-of-influence radius", target.name)))?,
        );
    }
    if settings.exit_soi {
        let soi = body
            .soi
            .ok_or_else(|| invalid(format!("exit-SOI requested but {} has no SOI radius", body.name)))?;
        conditions.push(StopCondition::exit_soi(soi));
    }
    for condition in &settings.custom {
        if condition.needs_ephemeris() && !has_ephemeris {
            return Err(invalid(format!("stop condition '{}' requires an ephemeris provider", condition.name)));
        }
        conditions.push(condition.clone());
    }

    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::{EARTH, MOON, SUN};
    use crate::integrators::events::CrossingDirection;
    use crate::physics::orbital::ClassicalElements;
    use test_case::test_case;

    fn leo() -> PropagatorConfig {
        PropagatorConfig::new(
            EARTH.clone(),
            InitialState::Elements(ClassicalElements::new(EARTH.radius + 500.0, 0.0, 0.0, 0.0, 0.0, 0.0)),
            TimeSpan::Periods(1.0),
        )
    }

    #[test]
    fn min_altitude_is_always_first() {
        let config = leo().with_exit_soi().with_max_altitude(1000.0);
        let propagator = Propagator::new(config, None).unwrap();
        let names: Vec<&str> = propagator.stop_conditions().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["min_alt", "max_alt", "exit_SOI"]);
        assert_eq!(
            propagator.stop_conditions()[0].kind,
            StopConditionKind::MinAltitude {
                floor: EARTH.deorbit_altitude
            }
        );
    }

    #[test]
    fn min_altitude_can_be_disabled() {
        let propagator = Propagator::new(leo().without_min_altitude(), None).unwrap();
        assert!(propagator.stop_conditions().is_empty());
    }

    #[test]
    fn custom_conditions_follow_builtin_ones() {
        fn always_positive(_: f64, _: &State) -> f64 {
            1.0
        }
        let config = leo().with_stop_condition(StopCondition::custom("always_positive", CrossingDirection::Either, false, always_positive));
        let propagator = Propagator::new(config, None).unwrap();
        assert_eq!(propagator.stop_conditions().last().map(|c| c.name.as_str()), Some("always_positive"));
    }

    #[test]
    fn period_span_is_resolved() {
        let propagator = Propagator::new(leo(), None).unwrap();
        let expected = OrbitalMechanics::orbital_period(EARTH.radius + 500.0, EARTH.mu);
        assert!((propagator.final_epoch() - expected).abs() < 1e-6);
    }

    #[test]
    fn mass_is_taken_from_the_configuration() {
        let propagator = Propagator::new(leo().with_mass(250.0), None).unwrap();
        assert_eq!(propagator.initial_state().mass, 250.0);
    }

    fn on_the_floor(radial_speed: f64) -> PropagatorConfig {
        PropagatorConfig::new(
            EARTH.clone(),
            InitialState::Cartesian(State::from_array([
                EARTH.radius + EARTH.deorbit_altitude,
                0.0,
                0.0,
                radial_speed,
                7.0,
                0.0,
            ])),
            TimeSpan::Seconds(3000.0),
        )
    }

    #[test_case(IntegratorSettings::adaptive(1e-9, 1e-9); "adaptive")]
    #[test_case(IntegratorSettings::FixedStep { step: 10.0 }; "fixed step")]
    fn descending_start_on_the_floor_is_rejected(integrator: IntegratorSettings) {
        let config = on_the_floor(-1.0).with_integrator(integrator);
        assert!(matches!(
            Propagator::new(config, None),
            Err(PropagationError::InvalidConfiguration(message)) if message.contains("descending")
        ));
    }

    #[test_case(IntegratorSettings::adaptive(1e-9, 1e-9); "adaptive")]
    #[test_case(IntegratorSettings::FixedStep { step: 10.0 }; "fixed step")]
    fn ascending_start_on_the_floor_still_stops_on_reentry(integrator: IntegratorSettings) {
        let config = on_the_floor(1.0).with_integrator(integrator);
        let propagation = Propagator::new(config, None).unwrap().run().unwrap();
        let TerminationStatus::StopConditionMet(record) = &propagation.status else {
            panic!("expected the floor to stop the run, got {:?}", propagation.status);
        };
        assert_eq!(record.name, "min_alt");
        assert!(record.epoch > 0.0);
        assert!(record.state.position.magnitude() > EARTH.radius);
    }

    #[test]
    fn rejects_invalid_configurations() {
        let cases: Vec<(PropagatorConfig, &str)> = vec![
            (
                PropagatorConfig::new(
                    EARTH.clone(),
                    InitialState::Cartesian(State::from_array([7000.0, 0.0, 0.0, 0.0, 7.5, 0.0])),
                    TimeSpan::Seconds(-1.0),
                ),
                "negative span",
            ),
            (leo().with_integrator(IntegratorSettings::adaptive(0.0, 1e-6)), "zero atol"),
            (leo().with_integrator(IntegratorSettings::FixedStep { step: 0.0 }), "zero step"),
            (
                PropagatorConfig::new(SUN.clone(), leo().initial_state, TimeSpan::Seconds(10.0)).with_j2(),
                "J2 without coefficient",
            ),
            (leo().with_third_body(MOON.clone()), "n-body without ephemeris"),
            (leo().with_enter_soi(MOON.clone()), "enter SOI without ephemeris"),
            (
                PropagatorConfig::new(
                    SUN.clone(),
                    InitialState::Cartesian(State::from_array([1.5e8, 0.0, 0.0, 0.0, 30.0, 0.0])),
                    TimeSpan::Seconds(10.0),
                )
                .with_exit_soi(),
                "exit SOI without radius",
            ),
            (
                PropagatorConfig::new(EARTH.clone(), InitialState::Cartesian(State::zero()), TimeSpan::Seconds(10.0)),
                "zero position",
            ),
            (
                PropagatorConfig::new(
                    EARTH.clone(),
                    InitialState::Cartesian(State::from_array([EARTH.radius + 50.0, 0.0, 0.0, 0.0, 7.8, 0.0])),
                    TimeSpan::Seconds(10.0),
                ),
                "below the floor",
            ),
            (
                PropagatorConfig::new(
                    EARTH.clone(),
                    InitialState::Cartesian(State::from_array([7000.0, 0.0, 0.0, 0.0, 20.0, 0.0])),
                    TimeSpan::Periods(1.0),
                ),
                "unbound orbit with periods",
            ),
        ];

        for (config, label) in cases {
            assert!(
                matches!(Propagator::new(config, None), Err(PropagationError::InvalidConfiguration(_))),
                "{label} should be rejected"
            );
        }
    }
}
