pub mod propagation_states;
pub mod state_machine;

pub use propagation_states::PropagationState;
pub use state_machine::PropagationFSM;
