//! Body positions consumed by the force model, stop conditions and eclipse
//! geometry.
//!
//! The core never owns an ephemeris database. Callers pass an
//! [`EphemerisProvider`] handle into whatever needs one; [`KeplerianEphemeris`]
//! is a small analytic provider for scenarios and tests that do not have a
//! kernel-backed source.

use crate::numerics::vector::rot_z;
use crate::physics::orbital::{ClassicalElements, OrbitalMechanics};
use nalgebra as na;
use std::collections::BTreeMap;
use thiserror::Error;

pub type BodyId = i32;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("no ephemeris data for body {0}")]
    UnknownBody(BodyId),
    #[error("frame '{0}' is not supported by this provider")]
    UnknownFrame(String),
    #[error("no rotation available from '{from}' to '{to}'")]
    UnsupportedRotation { from: String, to: String },
    #[error("body {0} is not on a bound orbit")]
    UnboundOrbit(BodyId),
    #[error("Kepler's equation did not converge for body {0}")]
    KeplerSolve(BodyId),
}

/// Source of body states and frame rotations.
///
/// Implementations must be side-effect free from the caller's point of view:
/// the same query always returns the same answer.
pub trait EphemerisProvider {
    /// State `[r, v]` of `body` relative to `observer` in `frame` [km, km/s]
    fn state(
        &self,
        body: BodyId,
        epoch: f64,
        frame: &str,
        observer: BodyId,
    ) -> Result<na::Vector6<f64>, EphemerisError>;

    fn position(
        &self,
        body: BodyId,
        epoch: f64,
        frame: &str,
        observer: BodyId,
    ) -> Result<na::Vector3<f64>, EphemerisError> {
        let state = self.state(body, epoch, frame, observer)?;
        Ok(na::Vector3::new(state[0], state[1], state[2]))
    }

    /// Matrix taking vectors expressed in `from` into `to` at `epoch`
    fn rotation(&self, from: &str, to: &str, _epoch: f64) -> Result<na::Matrix3<f64>, EphemerisError> {
        if from == to {
            Ok(na::Matrix3::identity())
        } else {
            Err(EphemerisError::UnsupportedRotation {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// A frame spinning about the provider frame's +z axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinFrame {
    /// Rotation rate [rad/s]
    pub rate: f64,
    /// Prime meridian angle at the provider's reference epoch [rad]
    pub angle0: f64,
}

/// Fixed two-body orbits about a single center, advanced analytically.
#[derive(Debug, Clone)]
pub struct KeplerianEphemeris {
    center: BodyId,
    mu: f64,
    frame: String,
    epoch0: f64,
    bodies: BTreeMap<BodyId, ClassicalElements>,
    spin_frames: BTreeMap<String, SpinFrame>,
}

impl KeplerianEphemeris {
    pub fn new(center: BodyId, mu: f64, frame: &str, epoch0: f64) -> Self {
        Self {
            center,
            mu,
            frame: frame.to_string(),
            epoch0,
            bodies: BTreeMap::new(),
            spin_frames: BTreeMap::new(),
        }
    }

    /// Registers `body` with osculating elements valid at the reference epoch
    pub fn with_body(mut self, body: BodyId, elements: ClassicalElements) -> Self {
        self.bodies.insert(body, elements);
        self
    }

    pub fn with_spin_frame(mut self, name: &str, rate: f64, angle0: f64) -> Self {
        self.spin_frames
            .insert(name.to_string(), SpinFrame { rate, angle0 });
        self
    }

    pub fn center(&self) -> BodyId {
        self.center
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    fn state_about_center(&self, body: BodyId, epoch: f64) -> Result<na::Vector6<f64>, EphemerisError> {
        if body == self.center {
            return Ok(na::Vector6::zeros());
        }
        let elements = self.bodies.get(&body).ok_or(EphemerisError::UnknownBody(body))?;
        if elements.ecc >= 1.0 || elements.sma <= 0.0 {
            return Err(EphemerisError::UnboundOrbit(body));
        }

        let mean_motion = (self.mu / elements.sma.powi(3)).sqrt();
        let e0 = OrbitalMechanics::true_to_eccentric_anomaly(elements.ta, elements.ecc);
        let m0 = OrbitalMechanics::eccentric_to_mean_anomaly(e0, elements.ecc);
        let m = m0 + mean_motion * (epoch - self.epoch0);
        let e = OrbitalMechanics::mean_to_eccentric_anomaly(m, elements.ecc)
            .map_err(|_| EphemerisError::KeplerSolve(body))?;

        let current = ClassicalElements {
            ta: OrbitalMechanics::eccentric_to_true_anomaly(e, elements.ecc),
            ..*elements
        };
        Ok(OrbitalMechanics::elements_to_state(&current, self.mu).to_vector6())
    }
}

impl EphemerisProvider for KeplerianEphemeris {
    fn state(
        &self,
        body: BodyId,
        epoch: f64,
        frame: &str,
        observer: BodyId,
    ) -> Result<na::Vector6<f64>, EphemerisError> {
        if frame != self.frame {
            return Err(EphemerisError::UnknownFrame(frame.to_string()));
        }
        Ok(self.state_about_center(body, epoch)? - self.state_about_center(observer, epoch)?)
    }

    fn rotation(&self, from: &str, to: &str, epoch: f64) -> Result<na::Matrix3<f64>, EphemerisError> {
        if from == to {
            return Ok(na::Matrix3::identity());
        }
        let unsupported = || EphemerisError::UnsupportedRotation {
            from: from.to_string(),
            to: to.to_string(),
        };
        let angle_of = |spin: &SpinFrame| spin.angle0 + spin.rate * (epoch - self.epoch0);

        if from == self.frame {
            let spin = self.spin_frames.get(to).ok_or_else(unsupported)?;
            Ok(rot_z(-angle_of(spin)))
        } else if to == self.frame {
            let spin = self.spin_frames.get(from).ok_or_else(unsupported)?;
            Ok(rot_z(angle_of(spin)))
        } else {
            Err(unsupported())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::{EARTH, MOON};
    use crate::constants::PI;
    use approx::assert_abs_diff_eq;

    fn earth_moon() -> KeplerianEphemeris {
        KeplerianEphemeris::new(EARTH.id, EARTH.mu, "J2000", 0.0)
            .with_body(MOON.id, ClassicalElements::new(384_400.0, 0.0, 0.0, 0.0, 0.0, 0.0))
            .with_spin_frame("ITRF93", 7.292_115e-5, 0.0)
    }

    #[test]
    fn circular_body_advances_at_mean_motion() {
        let ephemeris = earth_moon();
        let period = OrbitalMechanics::orbital_period(384_400.0, EARTH.mu);
        let quarter = ephemeris.position(MOON.id, period / 4.0, "J2000", EARTH.id).unwrap();
        assert_abs_diff_eq!(quarter, na::Vector3::new(0.0, 384_400.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn observer_is_differenced() {
        let ephemeris = earth_moon();
        let earth_from_moon = ephemeris.position(EARTH.id, 0.0, "J2000", MOON.id).unwrap();
        assert_abs_diff_eq!(earth_from_moon, na::Vector3::new(-384_400.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn unknown_body_and_frame_are_errors() {
        let ephemeris = earth_moon();
        assert_eq!(
            ephemeris.state(499, 0.0, "J2000", EARTH.id),
            Err(EphemerisError::UnknownBody(499))
        );
        assert_eq!(
            ephemeris.state(MOON.id, 0.0, "ECLIPJ2000", EARTH.id),
            Err(EphemerisError::UnknownFrame("ECLIPJ2000".to_string()))
        );
    }

    #[test]
    fn spin_frame_rotation_is_orthonormal_and_invertible() {
        let ephemeris = earth_moon();
        let epoch = 3600.0;
        let to_fixed = ephemeris.rotation("J2000", "ITRF93", epoch).unwrap();
        let to_inertial = ephemeris.rotation("ITRF93", "J2000", epoch).unwrap();
        assert_abs_diff_eq!(to_fixed * to_inertial, na::Matrix3::identity(), epsilon = 1e-15);

        // after a quarter turn the inertial +y axis lies along body-fixed +x
        let quarter_turn = PI / 2.0 / 7.292_115e-5;
        let rotated = ephemeris.rotation("J2000", "ITRF93", quarter_turn).unwrap() * na::Vector3::y();
        assert_abs_diff_eq!(rotated, na::Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn default_rotation_only_knows_identity() {
        struct Fixed;
        impl EphemerisProvider for Fixed {
            fn state(&self, _: BodyId, _: f64, _: &str, _: BodyId) -> Result<na::Vector6<f64>, EphemerisError> {
                Ok(na::Vector6::zeros())
            }
        }
        assert_eq!(Fixed.rotation("J2000", "J2000", 0.0), Ok(na::Matrix3::identity()));
        assert!(matches!(
            Fixed.rotation("J2000", "ITRF93", 0.0),
            Err(EphemerisError::UnsupportedRotation { .. })
        ));
    }
}
