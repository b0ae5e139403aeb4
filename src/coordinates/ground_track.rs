use crate::ephemeris::{EphemerisError, EphemerisProvider};
use nalgebra as na;

/// Latitudinal coordinates of a point [km, rad, rad]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub radius: f64,
    /// East longitude in (-π, π]
    pub longitude: f64,
    /// Latitude in [-π/2, π/2]
    pub latitude: f64,
}

impl LatLon {
    /// `[radius, longitude°, latitude°]`
    pub fn to_degrees(&self) -> [f64; 3] {
        [self.radius, self.longitude.to_degrees(), self.latitude.to_degrees()]
    }
}

/// Cartesian to latitudinal coordinates. The origin maps to all zeros.
pub fn latitudinal(r: &na::Vector3<f64>) -> LatLon {
    let radius = r.magnitude();
    if radius == 0.0 {
        return LatLon {
            radius,
            longitude: 0.0,
            latitude: 0.0,
        };
    }

    LatLon {
        radius,
        longitude: r.y.atan2(r.x),
        latitude: (r.z / radius).clamp(-1.0, 1.0).asin(),
    }
}

/// Sub-spacecraft points of `positions` given in `frame`, expressed in the
/// body-fixed frame at each epoch.
pub fn ground_track(
    epochs: &[f64],
    positions: &[na::Vector3<f64>],
    frame: &str,
    body_fixed_frame: &str,
    provider: &dyn EphemerisProvider,
) -> Result<Vec<LatLon>, EphemerisError> {
    epochs
        .iter()
        .zip(positions)
        .map(|(&epoch, r)| {
            let rotation = provider.rotation(frame, body_fixed_frame, epoch)?;
            Ok(latitudinal(&(rotation * r)))
        })
        .collect()
}
