use super::stop_conditions::StopCondition;
use crate::constants::{DEFAULT_ATOL, DEFAULT_FRAME, DEFAULT_RTOL};
use crate::models::body::CentralBody;
use crate::models::State;
use crate::physics::orbital::ClassicalElements;

#[derive(Debug, Clone, PartialEq)]
pub enum InitialState {
    Cartesian(State),
    Elements(ClassicalElements),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSpan {
    Seconds(f64),
    /// Multiples of the initial osculating period
    Periods(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegratorSettings {
    Adaptive {
        atol: f64,
        rtol: f64,
        initial_step: Option<f64>,
        max_step: Option<f64>,
        min_step: f64,
        max_steps: usize,
    },
    FixedStep {
        step: f64,
    },
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        IntegratorSettings::adaptive(DEFAULT_ATOL, DEFAULT_RTOL)
    }
}

impl IntegratorSettings {
    pub fn adaptive(atol: f64, rtol: f64) -> Self {
        IntegratorSettings::Adaptive {
            atol,
            rtol,
            initial_step: None,
            max_step: None,
            min_step: 1e-8,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerturbationSettings {
    pub j2: bool,
    pub n_bodies: Vec<CentralBody>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopConditionSettings {
    /// Altitude floor [km]; the central body's deorbit altitude when unset
    pub min_altitude: Option<f64>,
    pub disable_min_altitude: bool,
    pub max_altitude: Option<f64>,
    pub enter_soi: Option<CentralBody>,
    pub exit_soi: bool,
    /// Appended after the built-in conditions
    pub custom: Vec<StopCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorConfig {
    pub central_body: CentralBody,
    /// ET seconds past J2000
    pub initial_epoch: f64,
    pub frame: String,
    pub initial_state: InitialState,
    pub mass0: f64,
    pub time_span: TimeSpan,
    pub perturbations: PerturbationSettings,
    pub integrator: IntegratorSettings,
    pub stop_conditions: StopConditionSettings,
}

impl PropagatorConfig {
    pub fn new(central_body: CentralBody, initial_state: InitialState, time_span: TimeSpan) -> Self {
        Self {
            central_body,
            initial_epoch: 0.0,
            frame: DEFAULT_FRAME.to_string(),
            initial_state,
            mass0: 0.0,
            time_span,
            perturbations: PerturbationSettings::default(),
            integrator: IntegratorSettings::default(),
            stop_conditions: StopConditionSettings::default(),
        }
    }

    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.initial_epoch = epoch;
        self
    }

    pub fn with_frame(mut self, frame: &str) -> Self {
        self.frame = frame.to_string();
        self
    }

    pub fn with_mass(mut self, mass0: f64) -> Self {
        self.mass0 = mass0;
        self
    }

    pub fn with_j2(mut self) -> Self {
        self.perturbations.j2 = true;
        self
    }

    pub fn with_third_body(mut self, body: CentralBody) -> Self {
        self.perturbations.n_bodies.push(body);
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorSettings) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_min_altitude(mut self, floor: f64) -> Self {
        self.stop_conditions.min_altitude = Some(floor);
        self
    }

    pub fn without_min_altitude(mut self) -> Self {
        self.stop_conditions.disable_min_altitude = true;
        self
    }

    pub fn with_max_altitude(mut self, ceiling: f64) -> Self {
        self.stop_conditions.max_altitude = Some(ceiling);
        self
    }

    pub fn with_enter_soi(mut self, body: CentralBody) -> Self {
        self.stop_conditions.enter_soi = Some(body);
        self
    }

    pub fn with_exit_soi(mut self) -> Self {
        self.stop_conditions.exit_soi = true;
        self
    }

    pub fn with_stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_conditions.custom.push(condition);
        self
    }
}
