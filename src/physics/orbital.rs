use super::energy::{specific_angular_momentum, specific_energy};
use super::errors::PhysicsError;
use crate::constants::{ECC_SINGULAR, NODE_SINGULAR, PI, TWO_PI};
use crate::models::State;
use crate::numerics::root::{newton_root, NewtonConfig};
use crate::numerics::vector::{rot_x, rot_z};
use crate::numerics::NumericsError;
use nalgebra as na;

/// Classical orbital elements
///   sma: semi-major axis [km] (negative for hyperbolic orbits)
///   ecc: eccentricity [-]
///   inc: inclination [rad]
///   ta: true anomaly [rad]
///   aop: argument of periapsis [rad]
///   raan: right ascension of ascending node [rad]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicalElements {
    pub sma: f64,
    pub ecc: f64,
    pub inc: f64,
    pub ta: f64,
    pub aop: f64,
    pub raan: f64,
}

impl ClassicalElements {
    pub fn new(sma: f64, ecc: f64, inc: f64, ta: f64, aop: f64, raan: f64) -> Self {
        Self {
            sma,
            ecc,
            inc,
            ta,
            aop,
            raan,
        }
    }

    /// Angles given in degrees, as scenario files and element tables list them
    pub fn from_degrees(sma: f64, ecc: f64, inc: f64, ta: f64, aop: f64, raan: f64) -> Self {
        Self::new(
            sma,
            ecc,
            inc.to_radians(),
            ta.to_radians(),
            aop.to_radians(),
            raan.to_radians(),
        )
    }

    /// [sma, ecc, inc, ta, aop, raan] with angles in degrees
    pub fn to_degrees(&self) -> [f64; 6] {
        [
            self.sma,
            self.ecc,
            self.inc.to_degrees(),
            self.ta.to_degrees(),
            self.aop.to_degrees(),
            self.raan.to_degrees(),
        ]
    }

    pub fn periapsis(&self) -> f64 {
        self.sma * (1.0 - self.ecc)
    }

    pub fn apoapsis(&self) -> f64 {
        self.sma * (1.0 + self.ecc)
    }
}

pub struct OrbitalMechanics;

#[allow(non_snake_case)]
impl OrbitalMechanics {
    /// Converts a Cartesian state to classical orbital elements about a body
    /// with gravitational parameter `mu`.
    ///
    /// Circular orbits get aop = 0 and ta measured from the node (argument of
    /// latitude); equatorial orbits get raan = 0 and angles measured from +x.
    pub fn state_to_elements(state: &State, mu: f64) -> Result<ClassicalElements, PhysicsError> {
        let r = &state.position;
        let v = &state.velocity;
        let r_mag = r.magnitude();
        if r_mag == 0.0 {
            return Err(PhysicsError::ZeroPosition);
        }

        // Angular momentum and node vectors
        let h = specific_angular_momentum(state);
        let h_mag = h.magnitude();
        if h_mag == 0.0 {
            return Err(PhysicsError::RectilinearOrbit);
        }
        let n = na::Vector3::z().cross(&h);
        let n_mag = n.magnitude() / h_mag;

        // Eccentricity vector
        let v_mag = v.magnitude();
        let e_vec = ((v_mag * v_mag - mu / r_mag) * r - r.dot(v) * v) / mu;
        let ecc = e_vec.magnitude();

        let sma = -mu / (2.0 * specific_energy(state, mu)?);
        let inc = (h.z / h_mag).clamp(-1.0, 1.0).acos();

        let raan = if n_mag < NODE_SINGULAR {
            0.0
        } else {
            wrap_angle(n.y.atan2(n.x))
        };

        let h_hat = h / h_mag;
        let aop = if ecc < ECC_SINGULAR {
            0.0
        } else if n_mag < NODE_SINGULAR {
            wrap_angle(e_vec.y.atan2(e_vec.x) * h_hat.z.signum())
        } else {
            wrap_angle(h_hat.dot(&n.cross(&e_vec)).atan2(n.dot(&e_vec)))
        };

        let ta = if ecc < ECC_SINGULAR {
            if n_mag < NODE_SINGULAR {
                wrap_angle(r.y.atan2(r.x) * h_hat.z.signum())
            } else {
                wrap_angle(h_hat.dot(&n.cross(r)).atan2(n.dot(r)))
            }
        } else {
            wrap_angle(h_hat.dot(&e_vec.cross(r)).atan2(e_vec.dot(r)))
        };

        Ok(ClassicalElements {
            sma,
            ecc,
            inc,
            ta,
            aop,
            raan,
        })
    }

    /// Converts classical orbital elements to a massless Cartesian state
    pub fn elements_to_state(elements: &ClassicalElements, mu: f64) -> State {
        let ClassicalElements {
            sma,
            ecc,
            inc,
            ta,
            aop,
            raan,
        } = *elements;

        // Position and velocity in the perifocal frame
        let p = sma * (1.0 - ecc * ecc);
        let r_mag = p / (1.0 + ecc * ta.cos());
        let r_perifocal = na::Vector3::new(r_mag * ta.cos(), r_mag * ta.sin(), 0.0);
        let v_perifocal = na::Vector3::new(
            -(mu / p).sqrt() * ta.sin(),
            (mu / p).sqrt() * (ecc + ta.cos()),
            0.0,
        );

        let transform = rot_z(raan) * rot_x(inc) * rot_z(aop);
        State::new(transform * r_perifocal, transform * v_perifocal, 0.0)
    }

    pub fn orbital_period(sma: f64, mu: f64) -> f64 {
        TWO_PI * (sma.powi(3) / mu).sqrt()
    }

    /// Period of the osculating orbit, `None` for unbound states
    pub fn state_period(state: &State, mu: f64) -> Result<Option<f64>, PhysicsError> {
        let energy = specific_energy(state, mu)?;
        if energy >= 0.0 {
            return Ok(None);
        }
        Ok(Some(Self::orbital_period(-mu / (2.0 * energy), mu)))
    }

    pub fn circular_velocity(r: f64, mu: f64) -> f64 {
        (mu / r).sqrt()
    }

    pub fn escape_velocity(r: f64, mu: f64) -> f64 {
        (2.0 * mu / r).sqrt()
    }

    /// (apoapsis, periapsis) radii of the osculating orbit [km]
    pub fn apsides(state: &State, mu: f64) -> Result<(f64, f64), PhysicsError> {
        let energy = specific_energy(state, mu)?;
        let h_mag2 = specific_angular_momentum(state).norm_squared();

        let e = (2.0 * energy * h_mag2 / (mu * mu) + 1.0).max(0.0).sqrt();
        let a = h_mag2 / mu / (1.0 - e * e);

        Ok((a * (1.0 + e), a * (1.0 - e)))
    }

    /// Periapsis radius of a flyby that turns the V-infinity vector by
    /// `turn_angle` (half the total deflection) [km]
    pub fn close_approach_radius(turn_angle: f64, v_inf: f64, mu: f64) -> f64 {
        mu * (1.0 / turn_angle.sin() - 1.0) / (v_inf * v_inf)
    }

    // Anomaly conversion functions
    pub fn true_to_eccentric_anomaly(nu: f64, e: f64) -> f64 {
        if e < ECC_SINGULAR {
            return wrap_angle(nu);
        }

        let E = ((1.0 - e * e).sqrt() * nu.sin()).atan2(e + nu.cos());
        wrap_angle(E)
    }

    pub fn eccentric_to_true_anomaly(E: f64, e: f64) -> f64 {
        let nu = 2.0 * ((1.0 + e).sqrt() * (E / 2.0).sin()).atan2((1.0 - e).sqrt() * (E / 2.0).cos());
        wrap_angle(nu)
    }

    pub fn eccentric_to_mean_anomaly(E: f64, e: f64) -> f64 {
        wrap_angle(E - e * E.sin())
    }

    /// Solves Kepler's equation `M = E - e sin E` by Newton iteration
    pub fn mean_to_eccentric_anomaly(M: f64, e: f64) -> Result<f64, NumericsError> {
        if e < ECC_SINGULAR {
            return Ok(wrap_angle(M));
        }

        let M = wrap_angle(M);
        let guess = if M < PI { M + e / 2.0 } else { M - e / 2.0 };
        let config = NewtonConfig {
            tol: 1e-13,
            max_steps: 50,
        };
        let solution = newton_root(
            |E: f64| Ok::<f64, NumericsError>(E - e * E.sin() - M),
            |E: f64| Ok(1.0 - e * E.cos()),
            guess,
            &config,
        )?;
        Ok(wrap_angle(solution.root))
    }
}

/// Maps an angle into [0, 2π)
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TWO_PI);
    if wrapped >= TWO_PI {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::EARTH;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra as na;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    fn angle_gap(a: f64, b: f64) -> f64 {
        ((a - b + PI).rem_euclid(TWO_PI) - PI).abs()
    }

    #[test]
    fn zero_position_is_rejected() {
        let state = State::zero();
        assert_eq!(
            OrbitalMechanics::state_to_elements(&state, EARTH.mu),
            Err(PhysicsError::ZeroPosition)
        );
    }

    #[test]
    fn circular_equatorial_orbit() {
        let r = 7000.0;
        let v = OrbitalMechanics::circular_velocity(r, EARTH.mu);
        let state = State::from_array([r, 0.0, 0.0, 0.0, v, 0.0]);
        let elements = OrbitalMechanics::state_to_elements(&state, EARTH.mu).unwrap();
        assert_relative_eq!(elements.sma, r, max_relative = 1e-12);
        assert_abs_diff_eq!(elements.ecc, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(elements.inc, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(elements.ta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn random_elements_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let elements = ClassicalElements::new(
                rng.gen_range(6600.0..60_000.0),
                rng.gen_range(0.01..0.9),
                rng.gen_range(0.05..3.09),
                rng.gen_range(0.0..TWO_PI),
                rng.gen_range(0.0..TWO_PI),
                rng.gen_range(0.0..TWO_PI),
            );
            let state = OrbitalMechanics::elements_to_state(&elements, EARTH.mu);
            let recovered = OrbitalMechanics::state_to_elements(&state, EARTH.mu).unwrap();

            assert_relative_eq!(recovered.sma, elements.sma, max_relative = 1e-6);
            assert_relative_eq!(recovered.ecc, elements.ecc, max_relative = 1e-6);
            assert_abs_diff_eq!(recovered.inc, elements.inc, epsilon = 1e-6);
            assert!(angle_gap(recovered.ta, elements.ta) < 1e-6);
            assert!(angle_gap(recovered.aop, elements.aop) < 1e-6);
            assert!(angle_gap(recovered.raan, elements.raan) < 1e-6);
        }
    }

    #[test]
    fn circular_inclined_orbit_uses_argument_of_latitude() {
        let elements = ClassicalElements::from_degrees(7000.0, 0.0, 45.0, 30.0, 0.0, 60.0);
        let state = OrbitalMechanics::elements_to_state(&elements, EARTH.mu);
        let recovered = OrbitalMechanics::state_to_elements(&state, EARTH.mu).unwrap();
        assert_abs_diff_eq!(recovered.ta, 30.0_f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(recovered.raan, 60.0_f64.to_radians(), epsilon = 1e-9);
        assert_eq!(recovered.aop, 0.0);
    }

    #[test]
    fn hyperbolic_elements_round_trip() {
        let elements = ClassicalElements::new(-20_000.0, 1.5, 0.4, 0.3, 1.0, 2.0);
        let state = OrbitalMechanics::elements_to_state(&elements, EARTH.mu);
        let recovered = OrbitalMechanics::state_to_elements(&state, EARTH.mu).unwrap();
        assert_relative_eq!(recovered.sma, elements.sma, max_relative = 1e-9);
        assert_relative_eq!(recovered.ecc, elements.ecc, max_relative = 1e-9);
        assert_eq!(OrbitalMechanics::state_period(&state, EARTH.mu).unwrap(), None);
    }

    #[test_case(6778.0, 5553.53; "ISS-like orbit")]
    #[test_case(42_164.0, 86_164.79; "geostationary orbit")]
    fn compute_orbital_period(sma: f64, expected: f64) {
        let result = OrbitalMechanics::orbital_period(sma, EARTH.mu);
        assert_abs_diff_eq!(result, expected, epsilon = 1e-2);
    }

    #[test]
    fn apsides_of_eccentric_orbit() {
        let elements = ClassicalElements::from_degrees(10_000.0, 0.2, 28.5, 75.0, 10.0, 20.0);
        let state = OrbitalMechanics::elements_to_state(&elements, EARTH.mu);
        let (ra, rp) = OrbitalMechanics::apsides(&state, EARTH.mu).unwrap();
        assert_relative_eq!(ra, 12_000.0, max_relative = 1e-10);
        assert_relative_eq!(rp, 8_000.0, max_relative = 1e-10);
    }

    #[test]
    fn escape_is_root_two_circular() {
        let r = 7000.0;
        assert_relative_eq!(
            OrbitalMechanics::escape_velocity(r, EARTH.mu),
            2.0_f64.sqrt() * OrbitalMechanics::circular_velocity(r, EARTH.mu),
            max_relative = 1e-14
        );
    }

    #[test_case(0.5, 0.1; "low eccentricity")]
    #[test_case(3.0, 0.7; "high eccentricity")]
    #[test_case(5.9, 0.95; "near parabolic")]
    fn anomaly_round_trip(nu: f64, e: f64) {
        let E = OrbitalMechanics::true_to_eccentric_anomaly(nu, e);
        let M = OrbitalMechanics::eccentric_to_mean_anomaly(E, e);
        let E_back = OrbitalMechanics::mean_to_eccentric_anomaly(M, e).unwrap();
        assert_abs_diff_eq!(E_back, E, epsilon = 1e-10);
        let nu_back = OrbitalMechanics::eccentric_to_true_anomaly(E_back, e);
        assert_abs_diff_eq!(nu_back, nu, epsilon = 1e-9);
    }

    #[test]
    fn close_approach_for_right_angle_turn() {
        // a 90 degree deflection has a 45 degree half angle
        let rp = OrbitalMechanics::close_approach_radius(PI / 4.0, 5.0, EARTH.mu);
        assert_relative_eq!(rp, EARTH.mu * (2.0_f64.sqrt() - 1.0) / 25.0, max_relative = 1e-12);
    }

    #[test]
    fn keplerian_to_cartesian_at_periapsis() {
        let elements = ClassicalElements::new(8000.0, 0.1, 0.0, 0.0, 0.0, 0.0);
        let state = OrbitalMechanics::elements_to_state(&elements, EARTH.mu);
        assert_abs_diff_eq!(state.position, na::Vector3::new(7200.0, 0.0, 0.0), epsilon = 1e-9);
        let vp = (EARTH.mu * 1.1 / 7200.0).sqrt();
        assert_abs_diff_eq!(state.velocity, na::Vector3::new(0.0, vp, 0.0), epsilon = 1e-12);
    }
}
