use crate::state_machine::MapMode;
use waymark_core::StoreError;

/// Errors surfaced by the manager service. Store failures pass through
/// unchanged; the remaining variants come from the operational state machine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transition not present in the mode matrix.
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition { from: MapMode, to: MapMode },

    /// Mutation attempted in the wrong operating mode.
    #[error("operation requires {required} mode, currently {actual}")]
    InvalidMode { required: MapMode, actual: MapMode },

    /// A transition requested while another is in flight is rejected,
    /// never queued.
    #[error("a mode transition is already in progress")]
    TransitionInProgress,
}

impl ManagerError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// True for state-machine rejections that map to a transport conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. } | Self::InvalidMode { .. } | Self::TransitionInProgress
        )
    }
}
