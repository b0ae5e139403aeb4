pub const G: f64 = 6.67430e-20; // Gravitational constant (km³/kg/s²)
pub const AU_KM: f64 = 149_597_870.7; // Astronomical unit (km)
pub const SEC_PER_DAY: f64 = 86_400.0;

// Integrator defaults
pub const DEFAULT_ATOL: f64 = 1e-6;
pub const DEFAULT_RTOL: f64 = 1e-6;
pub const DEFAULT_FRAME: &str = "J2000";
pub const ECLIPTIC_FRAME: &str = "ECLIPJ2000";
pub const SOLAR_SYSTEM_BARYCENTER: i32 = 0;
pub const SUN_ID: i32 = 10;

// Singularity thresholds for element conversion
pub const ECC_SINGULAR: f64 = 1e-11;
pub const NODE_SINGULAR: f64 = 1e-11;

// Math
pub const PI: f64 = std::f64::consts::PI;
pub const TWO_PI: f64 = 2.0 * PI;
