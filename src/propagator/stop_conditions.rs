//! Scalar event functions `g(epoch, state)` whose zero crossings stop or mark
//! a propagation.

use crate::ephemeris::{BodyId, EphemerisProvider};
use crate::integrators::events::CrossingDirection;
use crate::models::body::CentralBody;
use crate::models::State;
use crate::physics::errors::PhysicsError;

/// User-supplied event function of `(epoch, state)`
pub type EventFn = fn(f64, &State) -> f64;

#[derive(Debug, Clone)]
pub enum StopConditionKind {
    /// Altitude above the central body falls to `floor` [km]
    MinAltitude { floor: f64 },
    /// Altitude above the central body rises to `ceiling` [km]
    MaxAltitude { ceiling: f64 },
    /// Distance to `body` falls to its sphere-of-influence radius
    EnterSoi { id: BodyId, soi: f64 },
    /// Distance to the central body rises to its sphere-of-influence radius
    ExitSoi { soi: f64 },
    Custom(EventFn),
}

// Function pointers have no stable identity, so custom kinds never compare equal
impl PartialEq for StopConditionKind {
    fn eq(&self, other: &Self) -> bool {
        use StopConditionKind::*;
        match (self, other) {
            (MinAltitude { floor: a }, MinAltitude { floor: b }) => a == b,
            (MaxAltitude { ceiling: a }, MaxAltitude { ceiling: b }) => a == b,
            (EnterSoi { id: a, soi: sa }, EnterSoi { id: b, soi: sb }) => a == b && sa == sb,
            (ExitSoi { soi: a }, ExitSoi { soi: b }) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopCondition {
    pub name: String,
    pub direction: CrossingDirection,
    /// Terminal conditions end the run; others are only recorded
    pub terminal: bool,
    pub kind: StopConditionKind,
}

impl StopCondition {
    pub fn min_altitude(floor: f64) -> Self {
        Self {
            name: "min_alt".to_string(),
            direction: CrossingDirection::Decreasing,
            terminal: true,
            kind: StopConditionKind::MinAltitude { floor },
        }
    }

    pub fn max_altitude(ceiling: f64) -> Self {
        Self {
            name: "max_alt".to_string(),
            direction: CrossingDirection::Increasing,
            terminal: true,
            kind: StopConditionKind::MaxAltitude { ceiling },
        }
    }

    /// Fails when `body` has no sphere-of-influence radius
    pub fn enter_soi(body: &CentralBody) -> Option<Self> {
        Some(Self {
            name: "enter_SOI".to_string(),
            direction: CrossingDirection::Decreasing,
            terminal: true,
            kind: StopConditionKind::EnterSoi {
                id: body.id,
                soi: body.soi?,
            },
        })
    }

    pub fn exit_soi(soi: f64) -> Self {
        Self {
            name: "exit_SOI".to_string(),
            direction: CrossingDirection::Increasing,
            terminal: true,
            kind: StopConditionKind::ExitSoi { soi },
        }
    }

    pub fn custom(name: &str, direction: CrossingDirection, terminal: bool, function: EventFn) -> Self {
        Self {
            name: name.to_string(),
            direction,
            terminal,
            kind: StopConditionKind::Custom(function),
        }
    }

    pub fn needs_ephemeris(&self) -> bool {
        matches!(self.kind, StopConditionKind::EnterSoi { .. })
    }
}

/// Everything the event functions need besides the state itself
pub struct EventContext<'a> {
    pub central_radius: f64,
    pub central_id: BodyId,
    pub frame: &'a str,
    pub ephemeris: Option<&'a dyn EphemerisProvider>,
}

impl EventContext<'_> {
    pub fn evaluate(&self, condition: &StopCondition, epoch: f64, state: &State) -> Result<f64, PhysicsError> {
        let r = state.position.magnitude();
        match &condition.kind {
            StopConditionKind::MinAltitude { floor } => Ok(r - self.central_radius - floor),
            StopConditionKind::MaxAltitude { ceiling } => Ok(r - self.central_radius - ceiling),
            StopConditionKind::EnterSoi { id, soi } => {
                let ephemeris = self.ephemeris.ok_or(PhysicsError::MissingEphemeris)?;
                let cb_to_body = ephemeris.position(*id, epoch, self.frame, self.central_id)?;
                Ok((cb_to_body - state.position).magnitude() - soi)
            }
            StopConditionKind::ExitSoi { soi } => Ok(r - soi),
            StopConditionKind::Custom(function) => Ok(function(epoch, state)),
        }
    }

    /// Evaluates every condition in declaration order
    pub fn evaluate_all(&self, conditions: &[StopCondition], epoch: f64, state: &State) -> Result<Vec<f64>, PhysicsError> {
        conditions
            .iter()
            .map(|condition| self.evaluate(condition, epoch, state))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::{EARTH, MOON, SUN};
    use crate::ephemeris::KeplerianEphemeris;
    use crate::physics::orbital::ClassicalElements;
    use approx::assert_abs_diff_eq;

    fn context<'a>(ephemeris: Option<&'a dyn EphemerisProvider>) -> EventContext<'a> {
        EventContext {
            central_radius: EARTH.radius,
            central_id: EARTH.id,
            frame: "J2000",
            ephemeris,
        }
    }

    #[test]
    fn altitude_conditions() {
        let state = State::from_array([EARTH.radius + 300.0, 0.0, 0.0, 0.0, 7.7, 0.0]);
        let ctx = context(None);
        assert_abs_diff_eq!(ctx.evaluate(&StopCondition::min_altitude(100.0), 0.0, &state).unwrap(), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ctx.evaluate(&StopCondition::max_altitude(1000.0), 0.0, &state).unwrap(), -700.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            ctx.evaluate(&StopCondition::exit_soi(1e6), 0.0, &state).unwrap(),
            EARTH.radius + 300.0 - 1e6,
            epsilon = 1e-9
        );
    }

    #[test]
    fn default_directions() {
        assert_eq!(StopCondition::min_altitude(0.0).direction, CrossingDirection::Decreasing);
        assert_eq!(StopCondition::max_altitude(0.0).direction, CrossingDirection::Increasing);
        assert_eq!(StopCondition::exit_soi(1.0).direction, CrossingDirection::Increasing);
        assert_eq!(StopCondition::enter_soi(&MOON).unwrap().direction, CrossingDirection::Decreasing);
    }

    #[test]
    fn enter_soi_needs_a_sphere_of_influence() {
        assert!(StopCondition::enter_soi(&SUN).is_none());
    }

    #[test]
    fn enter_soi_measures_distance_to_the_body() {
        let ephemeris = KeplerianEphemeris::new(EARTH.id, EARTH.mu, "J2000", 0.0)
            .with_body(MOON.id, ClassicalElements::new(384_400.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        let ctx = context(Some(&ephemeris));
        let state = State::from_array([300_000.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let condition = StopCondition::enter_soi(&MOON).unwrap();
        assert!(condition.needs_ephemeris());
        assert_abs_diff_eq!(ctx.evaluate(&condition, 0.0, &state).unwrap(), 84_400.0 - 66_100.0, epsilon = 1e-6);
    }

    #[test]
    fn enter_soi_without_ephemeris_is_an_error() {
        let condition = StopCondition::enter_soi(&MOON).unwrap();
        let state = State::from_array([7000.0, 0.0, 0.0, 0.0, 7.5, 0.0]);
        assert_eq!(context(None).evaluate(&condition, 0.0, &state), Err(PhysicsError::MissingEphemeris));
    }

    #[test]
    fn custom_conditions_are_called_with_epoch_and_state() {
        fn radial_speed(_epoch: f64, state: &State) -> f64 {
            state.position.dot(&state.velocity)
        }
        let condition = StopCondition::custom("apse", CrossingDirection::Either, false, radial_speed);
        let state = State::from_array([1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
        let values = context(None).evaluate_all(&[condition], 0.0, &state).unwrap();
        assert_eq!(values, vec![11.0]);
    }

    #[test]
    fn kinds_compare_by_parameters() {
        fn zero(_: f64, _: &State) -> f64 {
            0.0
        }
        assert_eq!(StopCondition::min_altitude(100.0), StopCondition::min_altitude(100.0));
        assert_ne!(StopCondition::min_altitude(100.0).kind, StopCondition::min_altitude(150.0).kind);
        assert_ne!(StopCondition::max_altitude(1.0).kind, StopCondition::exit_soi(1.0).kind);
        assert_eq!(StopCondition::enter_soi(&MOON), StopCondition::enter_soi(&MOON));

        let custom = StopCondition::custom("zero", CrossingDirection::Either, false, zero);
        assert_ne!(custom.kind, custom.clone().kind);
    }
}
