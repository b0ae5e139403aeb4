pub mod lambert;
pub mod sequence;
pub mod vinfinity;

pub use lambert::{solve_lambert, LambertConfig, LambertError, LambertSolution, TransferDirection};
pub use sequence::{FlybyLeg, FlybySequence, FlybyTarget, SequenceError, SequenceOptions};
pub use vinfinity::{vinfinity_match, VInfinityError, VInfinityMatch, VInfinityOptions};
