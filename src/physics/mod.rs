pub mod cr3bp;
pub mod dynamics;
pub mod eclipse;
pub mod energy;
pub mod errors;
pub mod gravity;
pub mod orbital;
pub mod perturbations;
