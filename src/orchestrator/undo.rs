//! Run-scoped undo log.

use crate::toolchain::ComponentSpec;

/// Inverse of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    Uninstall(ComponentSpec),
}

/// Stack of inverse actions for everything this run changed.
///
/// Only components the run itself installed are pushed, so pre-existing
/// packages can never be removed by a rollback.
#[derive(Debug, Default)]
pub struct UndoLog {
    actions: Vec<UndoAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `component` was installed by this run.
    pub fn record_install(&mut self, component: &ComponentSpec) {
        self.actions.push(UndoAction::Uninstall(component.clone()));
    }

    /// Take the most recent action.
    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
