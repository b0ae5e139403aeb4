/// Physical constants of a gravitating body, as consumed by the propagator.
#[derive(Debug, Clone, PartialEq)]
pub struct CentralBody {
    pub name: String,
    /// NAIF-style integer id used for ephemeris lookups
    pub id: i32,
    /// Gravitational parameter [km³/s²]
    pub mu: f64,
    /// Mean equatorial radius [km]
    pub radius: f64,
    pub j2: Option<f64>,
    /// Sphere-of-influence radius [km]
    pub soi: Option<f64>,
    /// Altitude below which an orbit counts as deorbited [km]
    pub deorbit_altitude: f64,
    pub body_fixed_frame: Option<String>,
}

impl CentralBody {
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }
}
