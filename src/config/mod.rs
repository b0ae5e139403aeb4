pub mod bodies;
pub mod scenario;

pub use scenario::{ConfigError, Scenario};
