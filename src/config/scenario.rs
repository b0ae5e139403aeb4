//! TOML scenario files.
//!
//! A scenario names its bodies from the built-in catalog and maps onto a
//! [`PropagatorConfig`], plus an optional analytic ephemeris for the
//! conditions and perturbations that need body positions. Unknown top-level
//! keys are kept in `extensions` and reported, never rejected.

use super::bodies;
use crate::constants::DEFAULT_FRAME;
use crate::ephemeris::KeplerianEphemeris;
use crate::models::body::CentralBody;
use crate::models::State;
use crate::physics::orbital::ClassicalElements;
use crate::propagator::{InitialState, IntegratorSettings, PropagatorConfig, TimeSpan};
use crate::time::{epoch_from_calendar, TimeError};
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown body '{0}'")]
    UnknownBody(String),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error("scenario needs exactly one of `state` or `[elements]`")]
    InitialState,
}

/// Epoch as ET seconds past J2000 or as a calendar string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpochSpec {
    Seconds(f64),
    Calendar(String),
}

impl EpochSpec {
    pub fn resolve(&self) -> Result<f64, TimeError> {
        match self {
            EpochSpec::Seconds(seconds) => Ok(*seconds),
            EpochSpec::Calendar(text) => epoch_from_calendar(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSpanSpec {
    Seconds(f64),
    Periods(f64),
}

/// Classical elements; angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ElementsSpec {
    pub sma: f64,
    #[serde(default)]
    pub ecc: f64,
    #[serde(default)]
    pub inc: f64,
    #[serde(default)]
    pub ta: f64,
    #[serde(default)]
    pub aop: f64,
    #[serde(default)]
    pub raan: f64,
}

impl ElementsSpec {
    fn to_elements(self) -> ClassicalElements {
        ClassicalElements::from_degrees(self.sma, self.ecc, self.inc, self.ta, self.aop, self.raan)
    }
}

fn default_tolerance() -> f64 {
    crate::constants::DEFAULT_ATOL
}

fn default_min_step() -> f64 {
    1e-8
}

fn default_max_steps() -> usize {
    1_000_000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegratorSpec {
    Adaptive {
        #[serde(default = "default_tolerance")]
        atol: f64,
        #[serde(default = "default_tolerance")]
        rtol: f64,
        #[serde(default)]
        initial_step: Option<f64>,
        #[serde(default)]
        max_step: Option<f64>,
        #[serde(default = "default_min_step")]
        min_step: f64,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
    FixedStep {
        step: f64,
    },
}

impl From<&IntegratorSpec> for IntegratorSettings {
    fn from(spec: &IntegratorSpec) -> Self {
        match *spec {
            IntegratorSpec::Adaptive {
                atol,
                rtol,
                initial_step,
                max_step,
                min_step,
                max_steps,
            } => IntegratorSettings::Adaptive {
                atol,
                rtol,
                initial_step,
                max_step,
                min_step,
                max_steps,
            },
            IntegratorSpec::FixedStep { step } => IntegratorSettings::FixedStep { step },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerturbationSpec {
    #[serde(default)]
    pub j2: bool,
    #[serde(default)]
    pub n_bodies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StopConditionSpec {
    #[serde(default)]
    pub min_altitude: Option<f64>,
    #[serde(default)]
    pub disable_min_altitude: bool,
    #[serde(default)]
    pub max_altitude: Option<f64>,
    #[serde(default)]
    pub enter_soi: Option<String>,
    #[serde(default)]
    pub exit_soi: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EphemerisBodySpec {
    pub name: String,
    #[serde(flatten)]
    pub elements: ElementsSpec,
}

/// Body-fixed frame spinning about +z; rate in deg/s, angle in degrees
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpinFrameSpec {
    pub name: String,
    pub rate: f64,
    #[serde(default)]
    pub angle0: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EphemerisSpec {
    pub center: String,
    /// Gravitational parameter of the relative orbits; the center's when unset
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub epoch: Option<EpochSpec>,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub bodies: Vec<EphemerisBodySpec>,
    #[serde(default)]
    pub spin_frames: Vec<SpinFrameSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub central_body: String,
    #[serde(default)]
    pub initial_epoch: Option<EpochSpec>,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub mass0: f64,
    pub time_span: TimeSpanSpec,
    #[serde(default)]
    pub state: Option<[f64; 6]>,
    #[serde(default)]
    pub elements: Option<ElementsSpec>,
    #[serde(default)]
    pub integrator: Option<IntegratorSpec>,
    #[serde(default)]
    pub perturbations: PerturbationSpec,
    #[serde(default)]
    pub stop_conditions: StopConditionSpec,
    #[serde(default)]
    pub ephemeris: Option<EphemerisSpec>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, toml::Value>,
}

fn body(name: &str) -> Result<CentralBody, ConfigError> {
    bodies::lookup(name).ok_or_else(|| ConfigError::UnknownBody(name.to_string()))
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn frame(&self) -> &str {
        self.frame.as_deref().unwrap_or(DEFAULT_FRAME)
    }

    pub fn initial_epoch(&self) -> Result<f64, ConfigError> {
        Ok(self.initial_epoch.as_ref().map(EpochSpec::resolve).transpose()?.unwrap_or(0.0))
    }

    /// Resolves names and units into a propagator configuration
    pub fn to_config(&self) -> Result<PropagatorConfig, ConfigError> {
        for key in self.extensions.keys() {
            warn!("Ignoring unrecognized scenario key '{key}'");
        }

        let initial_state = match (&self.state, &self.elements) {
            (Some(state), None) => InitialState::Cartesian(State::from_array(*state)),
            (None, Some(elements)) => InitialState::Elements(elements.to_elements()),
            _ => return Err(ConfigError::InitialState),
        };
        let time_span = match self.time_span {
            TimeSpanSpec::Seconds(seconds) => TimeSpan::Seconds(seconds),
            TimeSpanSpec::Periods(periods) => TimeSpan::Periods(periods),
        };

        let mut config = PropagatorConfig::new(body(&self.central_body)?, initial_state, time_span)
            .with_epoch(self.initial_epoch()?)
            .with_frame(self.frame())
            .with_mass(self.mass0);

        if let Some(integrator) = &self.integrator {
            config = config.with_integrator(integrator.into());
        }

        if self.perturbations.j2 {
            config = config.with_j2();
        }
        for name in &self.perturbations.n_bodies {
            config = config.with_third_body(body(name)?);
        }

        let stops = &self.stop_conditions;
        if let Some(floor) = stops.min_altitude {
            config = config.with_min_altitude(floor);
        }
        if stops.disable_min_altitude {
            config = config.without_min_altitude();
        }
        if let Some(ceiling) = stops.max_altitude {
            config = config.with_max_altitude(ceiling);
        }
        if let Some(name) = &stops.enter_soi {
            config = config.with_enter_soi(body(name)?);
        }
        if stops.exit_soi {
            config = config.with_exit_soi();
        }

        Ok(config)
    }

    /// Analytic ephemeris described by the `[ephemeris]` table, if any
    pub fn ephemeris(&self) -> Result<Option<KeplerianEphemeris>, ConfigError> {
        let Some(spec) = &self.ephemeris else {
            return Ok(None);
        };
        let center = body(&spec.center)?;
        let epoch0 = spec.epoch.as_ref().map(EpochSpec::resolve).transpose()?.unwrap_or(0.0);
        let frame = spec.frame.as_deref().unwrap_or(self.frame());

        let mut ephemeris = KeplerianEphemeris::new(center.id, spec.mu.unwrap_or(center.mu), frame, epoch0);
        for entry in &spec.bodies {
            ephemeris = ephemeris.with_body(body(&entry.name)?.id, entry.elements.to_elements());
        }
        for spin in &spec.spin_frames {
            ephemeris = ephemeris.with_spin_frame(&spin.name, spin.rate.to_radians(), spin.angle0.to_radians());
        }
        Ok(Some(ephemeris))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::EphemerisProvider;
    use approx::assert_abs_diff_eq;

    const LEO: &str = r#"
        central_body = "earth"
        time_span = { periods = 1.0 }

        [elements]
        sma = 7378.0
        inc = 28.5
    "#;

    #[test]
    fn minimal_scenario_takes_defaults() {
        let config = Scenario::from_toml_str(LEO).unwrap().to_config().unwrap();
        assert_eq!(config.central_body.name, "Earth");
        assert_eq!(config.frame, "J2000");
        assert_eq!(config.initial_epoch, 0.0);
        assert_eq!(config.time_span, TimeSpan::Periods(1.0));
        assert_eq!(config.integrator, IntegratorSettings::default());
        assert!(config.perturbations.n_bodies.is_empty());
        match config.initial_state {
            InitialState::Elements(elements) => assert_abs_diff_eq!(elements.inc, 28.5_f64.to_radians()),
            other => panic!("unexpected initial state {other:?}"),
        }
    }

    #[test]
    fn full_scenario() {
        let text = r#"
            central_body = "Earth"
            initial_epoch = "2021-04-01"
            frame = "J2000"
            mass0 = 250.0
            time_span = { seconds = 86400.0 }
            state = [7000.0, 0.0, 0.0, 0.0, 7.5, 0.0]
            plot = true

            [integrator]
            kind = "fixed_step"
            step = 10.0

            [perturbations]
            j2 = true
            n_bodies = ["moon"]

            [stop_conditions]
            min_altitude = 150.0
            max_altitude = 1000.0
            enter_soi = "moon"
            exit_soi = true

            [ephemeris]
            center = "earth"
            bodies = [{ name = "moon", sma = 384400.0, ecc = 0.0549, inc = 5.145 }]
        "#;
        let scenario = Scenario::from_toml_str(text).unwrap();
        assert!(scenario.extensions.contains_key("plot"));

        let config = scenario.to_config().unwrap();
        assert_eq!(config.mass0, 250.0);
        assert_eq!(config.integrator, IntegratorSettings::FixedStep { step: 10.0 });
        assert!(config.perturbations.j2);
        assert_eq!(config.perturbations.n_bodies[0].name, "Moon");
        assert_eq!(config.stop_conditions.min_altitude, Some(150.0));
        assert_eq!(config.stop_conditions.enter_soi.as_ref().map(|b| b.id), Some(301));
        assert!(config.stop_conditions.exit_soi);
        assert!(config.initial_epoch > 6.7e8);

        let ephemeris = scenario.ephemeris().unwrap().unwrap();
        let moon = ephemeris.position(301, 0.0, "J2000", 399).unwrap();
        assert_abs_diff_eq!(moon.magnitude(), 384400.0 * (1.0 - 0.0549), epsilon = 1e-6);
    }

    #[test]
    fn adaptive_fields_default() {
        let text = format!("{LEO}\n[integrator]\nkind = \"adaptive\"\natol = 1e-9\n");
        let config = Scenario::from_toml_str(&text).unwrap().to_config().unwrap();
        assert_eq!(
            config.integrator,
            IntegratorSettings::Adaptive {
                atol: 1e-9,
                rtol: 1e-6,
                initial_step: None,
                max_step: None,
                min_step: 1e-8,
                max_steps: 1_000_000,
            }
        );
    }

    #[test]
    fn rejects_unknown_bodies_and_ambiguous_states() {
        let unknown = LEO.replace("\"earth\"", "\"vulcan\"");
        assert!(matches!(
            Scenario::from_toml_str(&unknown).unwrap().to_config(),
            Err(ConfigError::UnknownBody(name)) if name == "vulcan"
        ));

        let both = format!("state = [7000.0, 0.0, 0.0, 0.0, 7.5, 0.0]\n{LEO}");
        assert!(matches!(
            Scenario::from_toml_str(&both).unwrap().to_config(),
            Err(ConfigError::InitialState)
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(Scenario::from_toml_str("central_body = "), Err(ConfigError::Toml(_))));
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
