use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationState {
    Configured,
    Integrating,
    RefiningEvent,
    Terminated,
    Aborted,
}

impl fmt::Display for PropagationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropagationState::Configured => write!(f, "Configured"),
            PropagationState::Integrating => write!(f, "Integrating"),
            PropagationState::RefiningEvent => write!(f, "Refining Event"),
            PropagationState::Terminated => write!(f, "Terminated"),
            PropagationState::Aborted => write!(f, "Aborted"),
        }
    }
}
