use super::body::CentralBody;
use super::state::State;
use crate::coordinates::ground_track::{ground_track, LatLon};
use crate::ephemeris::EphemerisProvider;
use crate::physics::eclipse::{eclipse_array, find_eclipses, EclipseError, EclipseMethod, EclipseSummary};
use crate::physics::errors::PhysicsError;
use crate::physics::orbital::{ClassicalElements, OrbitalMechanics};
use csv::Writer;
use nalgebra as na;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("body '{0}' has no body-fixed frame")]
    MissingBodyFixedFrame(String),
    #[error(transparent)]
    Eclipse(#[from] EclipseError),
    #[error(transparent)]
    Ephemeris(#[from] crate::ephemeris::EphemerisError),
}

/// Time-ordered states of one propagation, relative to `central_body` in `frame`
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    epochs: Vec<f64>,
    states: Vec<State>,
    frame: String,
    central_body: CentralBody,
}

impl Trajectory {
    pub(crate) fn new(central_body: CentralBody, frame: &str) -> Self {
        Self {
            epochs: Vec::new(),
            states: Vec::new(),
            frame: frame.to_string(),
            central_body,
        }
    }

    /// Appends a sample; epochs must increase strictly
    pub(crate) fn push(&mut self, epoch: f64, state: State) {
        debug_assert!(self.epochs.last().map_or(true, |&last| epoch > last));
        self.epochs.push(epoch);
        self.states.push(state);
    }

    pub fn epochs(&self) -> &[f64] {
        &self.epochs
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn central_body(&self) -> &CentralBody {
        &self.central_body
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<(f64, &State)> {
        Some((*self.epochs.first()?, self.states.first()?))
    }

    pub fn last(&self) -> Option<(f64, &State)> {
        Some((*self.epochs.last()?, self.states.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &State)> + '_ {
        self.epochs.iter().copied().zip(self.states.iter())
    }

    pub fn positions(&self) -> Vec<na::Vector3<f64>> {
        self.states.iter().map(|s| s.position).collect()
    }

    /// Elapsed time of every sample since the first one [s]
    pub fn elapsed(&self) -> Vec<f64> {
        let t0 = self.epochs.first().copied().unwrap_or(0.0);
        self.epochs.iter().map(|t| t - t0).collect()
    }

    /// Altitude above the mean radius of the central body [km]
    pub fn altitudes(&self) -> Vec<f64> {
        self.states
            .iter()
            .map(|s| s.position.magnitude() - self.central_body.radius)
            .collect()
    }

    pub fn elements(&self) -> Result<Vec<ClassicalElements>, PhysicsError> {
        self.states
            .iter()
            .map(|s| OrbitalMechanics::state_to_elements(s, self.central_body.mu))
            .collect()
    }

    /// Element histories relative to the first sample, `[sma, ecc, inc, ta, aop, raan]`
    pub fn elements_relative(&self) -> Result<Vec<[f64; 6]>, PhysicsError> {
        let elements = self.elements()?;
        let Some(first) = elements.first().map(as_array) else {
            return Ok(Vec::new());
        };
        Ok(elements
            .iter()
            .map(|e| {
                let current = as_array(e);
                std::array::from_fn(|i| current[i] - first[i])
            })
            .collect())
    }

    /// Osculating `(apoapsis, periapsis)` radii of every sample [km]
    pub fn apsides(&self) -> Result<Vec<(f64, f64)>, PhysicsError> {
        Ok(self
            .elements()?
            .iter()
            .map(|e| (e.apoapsis(), e.periapsis()))
            .collect())
    }

    /// Sub-spacecraft points in the central body's body-fixed frame
    pub fn ground_track(&self, provider: &dyn EphemerisProvider) -> Result<Vec<LatLon>, TrajectoryError> {
        let body_fixed = self
            .central_body
            .body_fixed_frame
            .as_deref()
            .ok_or_else(|| TrajectoryError::MissingBodyFixedFrame(self.central_body.name.clone()))?;
        Ok(ground_track(&self.epochs, &self.positions(), &self.frame, body_fixed, provider)?)
    }

    /// Shadow intervals cast by the central body
    pub fn eclipses(&self, provider: &dyn EphemerisProvider, method: EclipseMethod) -> Result<EclipseSummary, TrajectoryError> {
        let shadows = eclipse_array(&self.epochs, &self.positions(), &self.central_body, &self.frame, provider)?;
        Ok(find_eclipses(&self.epochs, &shadows, method))
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TrajectoryError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_csv_to(file)
    }

    /// Writes `epoch, rx, ry, rz, vx, vy, vz, mass` rows
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<(), TrajectoryError> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(["epoch", "rx", "ry", "rz", "vx", "vy", "vz", "mass"])?;
        for (epoch, state) in self.iter() {
            let mut record = Vec::with_capacity(8);
            record.push(epoch.to_string());
            record.extend(state.to_array().iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn as_array(e: &ClassicalElements) -> [f64; 6] {
    [e.sma, e.ecc, e.inc, e.ta, e.aop, e.raan]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bodies::EARTH;
    use approx::assert_abs_diff_eq;

    fn sample() -> Trajectory {
        let mut trajectory = Trajectory::new(EARTH.clone(), "J2000");
        trajectory.push(0.0, State::from_array([7000.0, 0.0, 0.0, 0.0, 7.5, 0.0]));
        trajectory.push(60.0, State::from_array([6990.0, 450.0, 0.0, -0.5, 7.48, 0.0]));
        trajectory
    }

    #[test]
    fn accessors() {
        let trajectory = sample();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.epochs(), &[0.0, 60.0]);
        assert_eq!(trajectory.last().map(|(t, _)| t), Some(60.0));
        assert_eq!(trajectory.elapsed(), vec![0.0, 60.0]);
        assert_abs_diff_eq!(trajectory.altitudes()[0], 7000.0 - EARTH.radius);
    }

    #[test]
    fn first_relative_elements_are_zero() {
        let relative = sample().elements_relative().unwrap();
        assert_eq!(relative[0], [0.0; 6]);
    }

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let mut buffer = Vec::new();
        sample().write_csv_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,rx,ry,rz,vx,vy,vz,mass");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,7000,0,0,0,7.5,0,0"));
    }

    #[test]
    fn ground_track_needs_a_body_fixed_frame() {
        let mut body = EARTH.clone();
        body.body_fixed_frame = None;
        let trajectory = Trajectory::new(body, "J2000");
        let provider = crate::ephemeris::KeplerianEphemeris::new(EARTH.id, EARTH.mu, "J2000", 0.0);
        assert!(matches!(
            trajectory.ground_track(&provider),
            Err(TrajectoryError::MissingBodyFixedFrame(_))
        ));
    }
}
