//! Multi-flyby interplanetary sequencing.
//!
//! The first leg is a plain Lambert arc between the first two bodies at their
//! nominal epochs. Every later leg departs the flyby body with the excess
//! speed it arrived with, and its arrival epoch is re-solved accordingly.

use super::lambert::{solve_lambert, LambertConfig, LambertError, TransferDirection};
use super::vinfinity::{vinfinity_match, VInfinityError, VInfinityOptions};
use crate::config::bodies::SUN;
use crate::constants::{ECLIPTIC_FRAME, SEC_PER_DAY, SOLAR_SYSTEM_BARYCENTER};
use crate::ephemeris::{BodyId, EphemerisError, EphemerisProvider};
use crate::models::body::CentralBody;
use crate::numerics::vector::angle_between;
use crate::numerics::NumericsError;
use crate::physics::orbital::OrbitalMechanics;
use crate::time::{calendar_from_epoch, TimeError};
use log::info;
use nalgebra as na;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("a flyby sequence needs at least two bodies, got {0}")]
    TooFewLegs(usize),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error("first leg: {0}")]
    Lambert(#[from] LambertError),
    #[error("leg {leg}: {source}")]
    VInfinity {
        leg: usize,
        #[source]
        source: VInfinityError,
    },
    #[error("degenerate flyby geometry: {0}")]
    Geometry(#[from] NumericsError),
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// One body of the sequence as requested by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct FlybyTarget {
    pub body: BodyId,
    /// Gravitational parameter of the flyby body [km³/s²]
    pub body_mu: f64,
    /// Nominal epoch; later legs treat it as the initial guess
    pub epoch: f64,
    /// Direction of the leg leaving this body
    pub direction: TransferDirection,
    /// Time-of-flight tolerance for the leg leaving this body [s]
    pub tol: Option<f64>,
}

impl FlybyTarget {
    pub fn new(body: &CentralBody, epoch: f64) -> Self {
        Self {
            body: body.id,
            body_mu: body.mu,
            epoch,
            direction: TransferDirection::Prograde,
            tol: None,
        }
    }

    pub fn with_direction(mut self, direction: TransferDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SequenceOptions {
    pub mu: f64,
    pub frame: String,
    pub center: BodyId,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            mu: SUN.mu,
            frame: ECLIPTIC_FRAME.to_string(),
            center: SOLAR_SYSTEM_BARYCENTER,
        }
    }
}

/// Solved encounter with one body of the sequence
#[derive(Debug, Clone, PartialEq)]
pub struct FlybyLeg {
    pub body: BodyId,
    pub epoch: f64,
    /// UTC calendar form of `epoch`
    pub calendar: String,
    /// Time of flight to the next body; zero for the last one [s]
    pub tof: f64,
    /// Excess speed relative to the body [km/s]
    pub v_infinity: f64,
    /// Half the angle between incoming and outgoing V-infinity [rad]
    pub turn_angle: f64,
    /// Flyby periapsis radius [km]; zero where there is no flyby
    pub periapsis: f64,
    /// Spacecraft state leaving the body, absent for the last one
    pub state_depart: Option<na::Vector6<f64>>,
    /// Spacecraft state arriving at the body, absent for the first one
    pub state_arrive: Option<na::Vector6<f64>>,
}

impl FlybyLeg {
    fn pending(target: &FlybyTarget) -> Result<Self, TimeError> {
        Ok(Self {
            body: target.body,
            epoch: target.epoch,
            calendar: calendar_from_epoch(target.epoch)?,
            tof: 0.0,
            v_infinity: 0.0,
            turn_angle: 0.0,
            periapsis: 0.0,
            state_depart: None,
            state_arrive: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FlybySequence {
    options: SequenceOptions,
    legs: Vec<FlybyLeg>,
}

fn join(r: &na::Vector3<f64>, v: &na::Vector3<f64>) -> na::Vector6<f64> {
    na::Vector6::new(r.x, r.y, r.z, v.x, v.y, v.z)
}

fn split(state: &na::Vector6<f64>) -> (na::Vector3<f64>, na::Vector3<f64>) {
    (state.fixed_rows::<3>(0).into_owned(), state.fixed_rows::<3>(3).into_owned())
}

impl FlybySequence {
    /// Solves the whole sequence
    pub fn new(
        targets: &[FlybyTarget],
        provider: &dyn EphemerisProvider,
        options: SequenceOptions,
    ) -> Result<Self, SequenceError> {
        if targets.len() < 2 {
            return Err(SequenceError::TooFewLegs(targets.len()));
        }
        let mut legs = targets
            .iter()
            .map(FlybyLeg::pending)
            .collect::<Result<Vec<_>, _>>()?;

        let frame = options.frame.as_str();

        // Lambert arc between the first two bodies at their nominal epochs
        let (et0, et1) = (legs[0].epoch, legs[1].epoch);
        let tof = et1 - et0;
        let (r0, v_planet0) = split(&provider.state(targets[0].body, et0, frame, options.center)?);
        let (r1, v_planet1) = split(&provider.state(targets[1].body, et1, frame, options.center)?);
        let arc = solve_lambert(&r0, &r1, tof, options.mu, targets[0].direction, &LambertConfig::default())?;

        legs[0].tof = tof;
        legs[0].v_infinity = (arc.v0 - v_planet0).magnitude();
        legs[0].state_depart = Some(join(&r0, &arc.v0));
        legs[1].v_infinity = (arc.v1 - v_planet1).magnitude();
        legs[1].state_arrive = Some(join(&r1, &arc.v1));

        let mut v_arrive = arc.v1;
        for n in 1..targets.len() - 1 {
            let et0 = legs[n].epoch;
            let tof_guess = legs[n + 1].epoch - et0;
            let mut vinf_options = VInfinityOptions {
                frame: options.frame.clone(),
                center: options.center,
                mu: options.mu,
                direction: targets[n].direction,
                ..VInfinityOptions::default()
            };
            if let Some(tol) = targets[n].tol {
                vinf_options.tol = tol;
            }

            let matched = vinfinity_match(
                provider,
                targets[n].body,
                targets[n + 1].body,
                &v_arrive,
                et0,
                tof_guess,
                &vinf_options,
            )
            .map_err(|source| SequenceError::VInfinity { leg: n, source })?;

            let (r_flyby, v_flyby) = split(&provider.state(targets[n].body, et0, frame, options.center)?);
            let (r_next, v_next) = split(&provider.state(targets[n + 1].body, et0 + matched.tof, frame, options.center)?);

            let vinf_in = v_arrive - v_flyby;
            let vinf_out = matched.v_depart - v_flyby;
            let turn_angle = angle_between(&vinf_in, &vinf_out)? / 2.0;

            let leg = &mut legs[n];
            leg.tof = matched.tof;
            leg.turn_angle = turn_angle;
            leg.periapsis = OrbitalMechanics::close_approach_radius(turn_angle, leg.v_infinity, targets[n].body_mu);
            leg.state_depart = Some(join(&r_flyby, &matched.v_depart));

            let next = &mut legs[n + 1];
            next.epoch = et0 + matched.tof;
            next.calendar = calendar_from_epoch(next.epoch)?;
            next.v_infinity = (matched.v_arrive - v_next).magnitude();
            next.state_arrive = Some(join(&r_next, &matched.v_arrive));
            v_arrive = matched.v_arrive;
        }

        Ok(Self { options, legs })
    }

    pub fn legs(&self) -> &[FlybyLeg] {
        &self.legs
    }

    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Mission duration from the first departure to the last arrival [s]
    pub fn total_tof(&self) -> f64 {
        self.legs.iter().map(|leg| leg.tof).sum()
    }

    pub fn log_summary(&self) {
        info!("Flyby sequence summary");
        for (n, leg) in self.legs.iter().enumerate() {
            info!(
                "Segment {n}: body {} at {}, time of flight {:.2} days, v-infinity {:.2} km/s, turn angle {:.2} deg, close approach {:.2} km",
                leg.body,
                leg.calendar,
                leg.tof / SEC_PER_DAY,
                leg.v_infinity,
                leg.turn_angle.to_degrees(),
                leg.periapsis
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::{EARTH, MARS};

    struct NoBodies;

    impl EphemerisProvider for NoBodies {
        fn state(&self, body: BodyId, _: f64, _: &str, _: BodyId) -> Result<na::Vector6<f64>, EphemerisError> {
            Err(EphemerisError::UnknownBody(body))
        }
    }

    #[test]
    fn needs_two_bodies() {
        let targets = [FlybyTarget::new(&EARTH, 0.0)];
        let result = FlybySequence::new(&targets, &NoBodies, SequenceOptions::default());
        assert!(matches!(result, Err(SequenceError::TooFewLegs(1))));
        assert!(matches!(
            FlybySequence::new(&[], &NoBodies, SequenceOptions::default()),
            Err(SequenceError::TooFewLegs(0))
        ));
    }

    #[test]
    fn ephemeris_failures_surface() {
        let targets = [FlybyTarget::new(&EARTH, 0.0), FlybyTarget::new(&MARS, 1e7)];
        let result = FlybySequence::new(&targets, &NoBodies, SequenceOptions::default());
        assert!(matches!(result, Err(SequenceError::Ephemeris(EphemerisError::UnknownBody(399)))));
    }

    #[test]
    fn target_builder() {
        let target = FlybyTarget::new(&MARS, 5.0)
            .with_direction(TransferDirection::Retrograde)
            .with_tol(1e-5);
        assert_eq!(target.body, MARS.id);
        assert_eq!(target.body_mu, MARS.mu);
        assert_eq!(target.direction, TransferDirection::Retrograde);
        assert_eq!(target.tol, Some(1e-5));
    }
}
