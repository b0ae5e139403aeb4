use approx::assert_abs_diff_eq;
use astrokit::config::bodies::{EARTH, SUN, VENUS};
use astrokit::constants::{AU_KM, ECLIPTIC_FRAME, SEC_PER_DAY, SUN_ID};
use astrokit::gnc::guidance::lambert::{solve_lambert, LambertConfig, TransferDirection};
use astrokit::models::State;
use astrokit::physics::orbital::ClassicalElements;
use astrokit::propagator::{InitialState, IntegratorSettings, TimeSpan};
use astrokit::{EphemerisProvider, KeplerianEphemeris, Propagator, PropagatorConfig, TerminationStatus};
use nalgebra as na;

fn earth_venus() -> KeplerianEphemeris {
    KeplerianEphemeris::new(SUN_ID, SUN.mu, ECLIPTIC_FRAME, 0.0)
        .with_body(EARTH.id, ClassicalElements::new(AU_KM, 0.0167, 0.0, 0.0, 1.8, 0.0))
        .with_body(VENUS.id, ClassicalElements::new(0.7233 * AU_KM, 0.0068, 0.059, 1.0, 0.96, 1.34))
}

fn split(state: &na::Vector6<f64>) -> (na::Vector3<f64>, na::Vector3<f64>) {
    (state.fixed_rows::<3>(0).into_owned(), state.fixed_rows::<3>(3).into_owned())
}

#[test]
fn propagated_lambert_arc_reaches_the_target() {
    let ephemeris = earth_venus();
    let tof = 100.0 * SEC_PER_DAY;
    let (r_earth, _) = split(&ephemeris.state(EARTH.id, 0.0, ECLIPTIC_FRAME, SUN_ID).unwrap());
    let (r_venus, _) = split(&ephemeris.state(VENUS.id, tof, ECLIPTIC_FRAME, SUN_ID).unwrap());

    let arc = solve_lambert(&r_earth, &r_venus, tof, SUN.mu, TransferDirection::Prograde, &LambertConfig::default())
        .unwrap();

    let config = PropagatorConfig::new(
        SUN.clone(),
        InitialState::Cartesian(State::new(r_earth, arc.v0, 0.0)),
        TimeSpan::Seconds(tof),
    )
    .with_frame(ECLIPTIC_FRAME)
    .with_integrator(IntegratorSettings::adaptive(1e-9, 1e-9));

    let propagation = Propagator::new(config, Some(&ephemeris)).unwrap().run().unwrap();
    assert_eq!(propagation.status, TerminationStatus::TimeSpanExhausted);

    let (epoch, arrival) = propagation.trajectory.last().unwrap();
    assert_abs_diff_eq!(epoch, tof, epsilon = 1e-6);
    assert!((arrival.position - r_venus).magnitude() < 100.0);
    assert!((arrival.velocity - arc.v1).magnitude() < 1e-4);
}

#[test]
fn arc_conserves_angular_momentum_between_endpoints() {
    let ephemeris = earth_venus();
    let tof = 120.0 * SEC_PER_DAY;
    let r0 = ephemeris.position(EARTH.id, 0.0, ECLIPTIC_FRAME, SUN_ID).unwrap();
    let r1 = ephemeris.position(VENUS.id, tof, ECLIPTIC_FRAME, SUN_ID).unwrap();

    let arc = solve_lambert(&r0, &r1, tof, SUN.mu, TransferDirection::Prograde, &LambertConfig::default()).unwrap();
    let h0 = r0.cross(&arc.v0);
    let h1 = r1.cross(&arc.v1);
    assert_abs_diff_eq!(h0, h1, epsilon = 1e-6 * h0.magnitude());

    let energy = |r: &na::Vector3<f64>, v: &na::Vector3<f64>| v.norm_squared() / 2.0 - SUN.mu / r.magnitude();
    assert_abs_diff_eq!(energy(&r0, &arc.v0), energy(&r1, &arc.v1), epsilon = 1e-6);

    // short way moves with the planets
    assert!(h0.z > 0.0);
}
