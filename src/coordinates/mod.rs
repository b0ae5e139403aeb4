pub mod ground_track;

pub use ground_track::{ground_track, latitudinal, LatLon};
