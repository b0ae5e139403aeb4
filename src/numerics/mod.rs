pub mod errors;
pub mod root;
pub mod stumpff;
pub mod vector;

pub use errors::NumericsError;
