//! Cylindrical-cone shadow model of a spherical body lit by the Sun.
//!
//! The umbra and penumbra cones are built from the Sun and body diameters and
//! the Sun-body distance; a point is tested by projecting it onto the
//! Sun-body axis and comparing its distance from the axis with the cone radius
//! at that depth.

use crate::config::bodies::SUN;
use crate::constants::SUN_ID;
use crate::coordinates::ground_track::{latitudinal, LatLon};
use crate::ephemeris::{EphemerisError, EphemerisProvider};
use crate::models::body::CentralBody;
use crate::numerics::root::{newton_root_fd, FdNewtonConfig};
use crate::numerics::NumericsError;
use log::info;
use nalgebra as na;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EclipseError {
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error("body '{0}' has no body-fixed frame")]
    MissingBodyFixedFrame(String),
    #[error("epoch and position series differ in length ({epochs} vs {positions})")]
    LengthMismatch { epochs: usize, positions: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shadow {
    NoEclipse,
    Penumbra,
    Umbra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EclipseMethod {
    Umbra,
    Penumbra,
    #[default]
    Either,
}

impl EclipseMethod {
    fn contains(&self, shadow: Shadow) -> bool {
        match self {
            EclipseMethod::Umbra => shadow == Shadow::Umbra,
            EclipseMethod::Penumbra => shadow == Shadow::Penumbra,
            EclipseMethod::Either => shadow != Shadow::NoEclipse,
        }
    }
}

/// Shadow intervals found in a sampled trajectory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EclipseSummary {
    /// `(entrance, exit)` sample indices
    pub intervals: Vec<(usize, usize)>,
    pub epochs: Vec<(f64, f64)>,
    pub durations: Vec<f64>,
    pub total_time: f64,
    pub max_time: f64,
    /// Fraction of the sampled span spent in shadow
    pub ratio: f64,
}

impl EclipseSummary {
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn log_summary(&self) {
        info!("Number of eclipses: {}", self.intervals.len());
        info!("Eclipse durations (seconds): {:.2?}", self.durations);
        info!("Max eclipse duration: {:.2} seconds", self.max_time);
        info!("Eclipse time ratio: {:.3}", self.ratio);
    }
}

/// Half-width of the umbra cone at depth `proj` behind the body
fn umbra_radius(delta: f64, dp: f64, proj: f64) -> f64 {
    let xu = dp * delta / (SUN.diameter() - dp);
    let alpha = (dp / (2.0 * xu)).asin();
    (xu - proj) * alpha.tan()
}

fn penumbra_radius(delta: f64, dp: f64, proj: f64) -> f64 {
    let xp = dp * delta / (SUN.diameter() + dp);
    let alpha = (dp / (2.0 * xp)).asin();
    (xp + proj) * alpha.tan()
}

/// Shadow state of a point `r` relative to `body`. A point on the sunward
/// side of the body is never eclipsed.
pub fn check_eclipse(
    epoch: f64,
    r: &na::Vector3<f64>,
    body: &CentralBody,
    frame: &str,
    provider: &dyn EphemerisProvider,
) -> Result<Shadow, EclipseError> {
    let sun_to_body = provider.position(body.id, epoch, frame, SUN_ID)?;
    Ok(shadow_of(r, &sun_to_body, body.diameter(), 0.0))
}

fn shadow_of(r: &na::Vector3<f64>, sun_to_body: &na::Vector3<f64>, dp: f64, r_target: f64) -> Shadow {
    let delta = sun_to_body.magnitude();
    let s_hat = sun_to_body / delta;
    let proj = r.dot(&s_hat);
    if proj <= 0.0 {
        return Shadow::NoEclipse;
    }

    let rejection = (r - proj * s_hat).magnitude() - r_target;
    if rejection <= umbra_radius(delta, dp, proj) {
        Shadow::Umbra
    } else if rejection <= penumbra_radius(delta, dp, proj) {
        Shadow::Penumbra
    } else {
        Shadow::NoEclipse
    }
}

/// Shadow state at every sample of a trajectory
pub fn eclipse_array(
    epochs: &[f64],
    positions: &[na::Vector3<f64>],
    body: &CentralBody,
    frame: &str,
    provider: &dyn EphemerisProvider,
) -> Result<Vec<Shadow>, EclipseError> {
    if epochs.len() != positions.len() {
        return Err(EclipseError::LengthMismatch {
            epochs: epochs.len(),
            positions: positions.len(),
        });
    }
    epochs
        .iter()
        .zip(positions)
        .map(|(&epoch, r)| check_eclipse(epoch, r, body, frame, provider))
        .collect()
}

/// Extracts shadow intervals from a sampled shadow series.
///
/// The entrance index is the last sample before the shadow starts and the
/// exit index the last sample inside it. A series that starts in shadow
/// opens at 0; one that ends in shadow closes at the last sample.
pub fn find_eclipses(epochs: &[f64], shadows: &[Shadow], method: EclipseMethod) -> EclipseSummary {
    let n = epochs.len().min(shadows.len());
    if n < 2 {
        return EclipseSummary::default();
    }

    let inside: Vec<bool> = shadows[..n].iter().map(|s| method.contains(*s)).collect();
    let mut entrances = Vec::new();
    let mut exits = Vec::new();
    if inside[0] {
        entrances.push(0);
    }
    for (i, pair) in inside.windows(2).enumerate() {
        match (pair[0], pair[1]) {
            (false, true) => entrances.push(i),
            (true, false) => exits.push(i),
            _ => {}
        }
    }
    if inside[n - 1] {
        exits.push(n - 1);
    }

    if entrances.is_empty() {
        return EclipseSummary::default();
    }

    let mut summary = EclipseSummary::default();
    for (&entrance, &exit) in entrances.iter().zip(&exits) {
        let window = (epochs[entrance], epochs[exit]);
        let duration = window.1 - window.0;
        summary.intervals.push((entrance, exit));
        summary.epochs.push(window);
        summary.durations.push(duration);
        summary.total_time += duration;
        summary.max_time = summary.max_time.max(duration);
    }

    let span = epochs[n - 1] - epochs[0];
    summary.ratio = if span > 0.0 { summary.total_time / span } else { 0.0 };
    summary
}

/// Sub-umbral point of a solar eclipse: where the umbra of `occluder` first
/// touches the surface of `target`, in the target's body-fixed frame.
///
/// Returns `None` when the target is not in the occluder's umbra.
pub fn solar_eclipse_point(
    epoch: f64,
    occluder: &CentralBody,
    target: &CentralBody,
    frame: &str,
    provider: &dyn EphemerisProvider,
) -> Result<Option<LatLon>, EclipseError> {
    let body_fixed = target
        .body_fixed_frame
        .as_deref()
        .ok_or_else(|| EclipseError::MissingBodyFixedFrame(target.name.clone()))?;

    let sun_to_occluder = provider.position(occluder.id, epoch, frame, SUN_ID)?;
    let r = provider.position(target.id, epoch, frame, occluder.id)?;
    if shadow_of(&r, &sun_to_occluder, occluder.diameter(), target.radius) != Shadow::Umbra {
        return Ok(None);
    }

    let s_hat = sun_to_occluder.normalize();
    let surface_distance = |sigma: f64| -> Result<f64, NumericsError> { Ok((sigma * s_hat - r).magnitude() - target.radius) };
    let sigma = match newton_root_fd(surface_distance, r.dot(&s_hat) - target.radius, &FdNewtonConfig::default()) {
        Ok(solution) => solution.root,
        Err(_) => return Ok(None),
    };

    let point = sigma * s_hat - r;
    let rotation = provider.rotation(frame, body_fixed, epoch)?;
    Ok(Some(latitudinal(&(rotation * point))))
}
