//! Zero-crossing bookkeeping shared by the integration engines.

/// Direction of a zero crossing that counts as an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingDirection {
    /// g goes from negative to positive
    Increasing,
    /// g goes from positive to negative
    Decreasing,
    #[default]
    Either,
}

/// Settings for the bracketed root refinement of a crossing time
#[derive(Debug, Clone, Copy)]
pub struct EventConfig {
    /// Bracket width at which the crossing time is accepted [s]
    pub root_tol: f64,
    pub max_iter: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            root_tol: 1e-9,
            max_iter: 100,
        }
    }
}

/// True when `g_old -> g_new` crosses zero in `direction`.
///
/// Landing exactly on zero counts as a crossing; leaving zero does not, so an
/// event is never reported twice.
pub fn sign_change_detected(g_old: f64, g_new: f64, direction: CrossingDirection) -> bool {
    if g_old * g_new > 0.0 || g_old == 0.0 {
        return false;
    }

    match direction {
        CrossingDirection::Increasing => g_old < 0.0,
        CrossingDirection::Decreasing => g_old > 0.0,
        CrossingDirection::Either => true,
    }
}

/// Discrete check used by the fixed-step engine: the condition is violated
/// once g has reached or passed zero in `direction`.
pub fn crossed_discretely(g_old: f64, g_new: f64, direction: CrossingDirection) -> bool {
    match direction {
        CrossingDirection::Increasing => g_old < 0.0 && g_new >= 0.0,
        CrossingDirection::Decreasing => g_old > 0.0 && g_new <= 0.0,
        CrossingDirection::Either => {
            (g_old < 0.0 && g_new >= 0.0) || (g_old > 0.0 && g_new <= 0.0)
        }
    }
}
