use super::propagation_states::PropagationState;
use log::{debug, info, warn};

/// Life cycle of a single propagation run.
///
/// `Configured -> Integrating <-> RefiningEvent -> Terminated`, with
/// `Aborted` reachable from any non-final state.
pub struct PropagationFSM {
    current_state: PropagationState,
    last_state_change: f64,
    transitions: usize,
}

impl PropagationFSM {
    pub fn new(epoch: f64) -> Self {
        Self {
            current_state: PropagationState::Configured,
            last_state_change: epoch,
            transitions: 0,
        }
    }

    pub fn get_current_state(&self) -> PropagationState {
        self.current_state
    }

    pub fn get_last_state_change(&self) -> f64 {
        self.last_state_change
    }

    pub fn transition_count(&self) -> usize {
        self.transitions
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.current_state,
            PropagationState::Terminated | PropagationState::Aborted
        )
    }

    fn transition_to(&mut self, new_state: PropagationState, epoch: f64) -> bool {
        if self.current_state == new_state {
            return true;
        }

        let allowed = match (self.current_state, new_state) {
            (PropagationState::Configured, PropagationState::Integrating) => true,
            (PropagationState::Integrating, PropagationState::RefiningEvent) => true,
            (PropagationState::RefiningEvent, PropagationState::Integrating) => true,
            (PropagationState::Integrating | PropagationState::RefiningEvent, PropagationState::Terminated) => true,
            (from, PropagationState::Aborted) => !matches!(from, PropagationState::Terminated),
            _ => false,
        };

        if !allowed {
            warn!(
                "Rejected propagation transition at epoch {:.3}: {} -> {}",
                epoch, self.current_state, new_state
            );
            return false;
        }

        debug!(
            "Propagation transition at epoch {:.3}: {} -> {}",
            epoch, self.current_state, new_state
        );
        self.current_state = new_state;
        self.last_state_change = epoch;
        self.transitions += 1;
        true
    }

    pub fn start(&mut self, epoch: f64) -> bool {
        let started = self.transition_to(PropagationState::Integrating, epoch);
        if started {
            info!("Propagating orbit from epoch {:.3}", epoch);
        }
        started
    }

    pub fn begin_refinement(&mut self, epoch: f64) -> bool {
        self.transition_to(PropagationState::RefiningEvent, epoch)
    }

    pub fn end_refinement(&mut self, epoch: f64) -> bool {
        self.transition_to(PropagationState::Integrating, epoch)
    }

    pub fn terminate(&mut self, epoch: f64) -> bool {
        self.transition_to(PropagationState::Terminated, epoch)
    }

    pub fn abort(&mut self, epoch: f64, reason: &str) -> bool {
        let aborted = self.transition_to(PropagationState::Aborted, epoch);
        if aborted {
            warn!("Propagation aborted at epoch {:.3}: {}", epoch, reason);
        }
        aborted
    }
}
