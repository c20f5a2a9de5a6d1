//! Run state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete states of a provisioning run.
///
/// ```text
/// Pending ─► Installing ─► Validating ─► Complete
///               │   │          └───────► Failed
///               │   └──► Complete              (validation skipped)
///               └──► RollingBack ─► Failed
/// Pending ─► Uninstalling ─► Complete | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Installing,
    Validating,
    RollingBack,
    Uninstalling,
    Complete,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Installing => "installing",
            RunState::Validating => "validating",
            RunState::RollingBack => "rolling_back",
            RunState::Uninstalling => "uninstalling",
            RunState::Complete => "complete",
            RunState::Failed => "failed",
        }
    }

    /// All valid transitions from this state.
    pub fn valid_next_states(&self) -> &'static [RunState] {
        match self {
            RunState::Pending => &[
                RunState::Installing,
                RunState::Validating,
                RunState::Uninstalling,
                RunState::Failed,
            ],
            RunState::Installing => &[
                RunState::Validating,
                RunState::RollingBack,
                RunState::Complete,
            ],
            RunState::Validating => &[
                RunState::Complete,
                RunState::Failed,
                RunState::RollingBack,
            ],
            RunState::RollingBack => &[RunState::Failed],
            RunState::Uninstalling => &[RunState::Complete, RunState::Failed],
            RunState::Complete | RunState::Failed => &[],
        }
    }

    /// Check if a transition to the given state is valid.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        self.valid_next_states().contains(&next)
    }

    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Complete | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_valid() {
        assert!(RunState::Pending.can_transition_to(RunState::Installing));
        assert!(RunState::Installing.can_transition_to(RunState::Validating));
        assert!(RunState::Validating.can_transition_to(RunState::Complete));
    }

    #[test]
    fn failure_path_goes_through_rollback() {
        assert!(RunState::Installing.can_transition_to(RunState::RollingBack));
        assert!(RunState::RollingBack.can_transition_to(RunState::Failed));
        assert!(!RunState::Installing.can_transition_to(RunState::Failed));
    }

    #[test]
    fn rollback_cannot_complete() {
        assert!(!RunState::RollingBack.can_transition_to(RunState::Complete));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for state in [RunState::Complete, RunState::Failed] {
            assert!(state.is_terminal());
            assert!(state.valid_next_states().is_empty());
        }
    }

    #[test]
    fn validating_ends_directly_or_unwinds_on_interrupt() {
        assert!(RunState::Validating.can_transition_to(RunState::Failed));
        assert!(RunState::Validating.can_transition_to(RunState::RollingBack));
        assert!(!RunState::Validating.can_transition_to(RunState::Installing));
    }
}
