pub mod body;
pub mod state;
pub mod trajectory;

pub use body::CentralBody;
pub use state::State;
pub use trajectory::{Trajectory, TrajectoryError};
