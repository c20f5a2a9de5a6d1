//! Per-component install outcome records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// What was being done to the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeAction {
    Install,
    Uninstall,
    Rollback,
}

/// Result of one operation on one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    /// Installed by this run.
    Installed,
    /// Already installed before this run touched it.
    AlreadyPresent,
    /// The operation failed; see the error.
    Failed,
    /// Installed by this run, then removed during rollback.
    RolledBack,
    /// Skipped because the run aborted first, or nothing to remove.
    NotAttempted,
    /// Removed by an explicit uninstall.
    Removed,
}

impl InstallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallStatus::Installed => "installed",
            InstallStatus::AlreadyPresent => "already present",
            InstallStatus::Failed => "failed",
            InstallStatus::RolledBack => "rolled back",
            InstallStatus::NotAttempted => "not attempted",
            InstallStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one operation on one component.
///
/// A component can appear more than once in a run (installed, then rolled
/// back); each step is a new record, never an edit of an old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    /// Component name.
    pub component: String,

    /// Package name used on this platform.
    pub package: String,

    /// Whether a failure of this component aborts the run.
    pub required: bool,

    pub action: OutcomeAction,

    pub status: InstallStatus,

    /// Failure detail for `Failed` records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl InstallOutcome {
    fn new(
        component: &str,
        package: &str,
        required: bool,
        action: OutcomeAction,
        status: InstallStatus,
    ) -> Self {
        Self {
            component: component.to_string(),
            package: package.to_string(),
            required,
            action,
            status,
            error: None,
        }
    }

    /// Installed by this run.
    pub fn installed(component: &str, package: &str, required: bool) -> Self {
        Self::new(
            component,
            package,
            required,
            OutcomeAction::Install,
            InstallStatus::Installed,
        )
    }

    /// Found already installed.
    pub fn already_present(component: &str, package: &str, required: bool) -> Self {
        Self::new(
            component,
            package,
            required,
            OutcomeAction::Install,
            InstallStatus::AlreadyPresent,
        )
    }

    /// Skipped because the run stopped first.
    pub fn not_attempted(
        component: &str,
        package: &str,
        required: bool,
        action: OutcomeAction,
    ) -> Self {
        Self::new(
            component,
            package,
            required,
            action,
            InstallStatus::NotAttempted,
        )
    }

    /// Removed by the package manager.
    pub fn removed(component: &str, package: &str, required: bool) -> Self {
        Self::new(
            component,
            package,
            required,
            OutcomeAction::Uninstall,
            InstallStatus::Removed,
        )
    }

    /// The operation failed.
    pub fn failed(
        component: &str,
        package: &str,
        required: bool,
        action: OutcomeAction,
        error: ProviderError,
    ) -> Self {
        Self {
            error: Some(error),
            ..Self::new(component, package, required, action, InstallStatus::Failed)
        }
    }

    /// Rollback record derived from the adapter's uninstall result.
    pub fn rollback_of(uninstall: &InstallOutcome) -> Self {
        let status = match uninstall.status {
            InstallStatus::Removed | InstallStatus::NotAttempted => InstallStatus::RolledBack,
            _ => InstallStatus::Failed,
        };
        Self {
            component: uninstall.component.clone(),
            package: uninstall.package.clone(),
            required: uninstall.required,
            action: OutcomeAction::Rollback,
            status,
            error: uninstall.error.clone(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == InstallStatus::Failed
    }

    /// A failed record that decides the run's outcome.
    pub fn is_blocking_failure(&self) -> bool {
        self.is_failure() && (self.required || self.action == OutcomeAction::Rollback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    fn err(component: &str) -> ProviderError {
        ProviderError {
            component: component.to_string(),
            kind: ProviderErrorKind::CommandFailed,
            message: "exit 1".to_string(),
        }
    }

    #[test]
    fn rollback_of_successful_removal() {
        let removed = InstallOutcome::removed("compiler", "gcc-aarch64-linux-gnu", true);
        let rb = InstallOutcome::rollback_of(&removed);
        assert_eq!(rb.status, InstallStatus::RolledBack);
        assert_eq!(rb.action, OutcomeAction::Rollback);
        assert!(rb.error.is_none());
    }

    #[test]
    fn rollback_of_failed_removal_keeps_error() {
        let failed = InstallOutcome::failed(
            "compiler",
            "gcc",
            true,
            OutcomeAction::Uninstall,
            err("compiler"),
        );
        let rb = InstallOutcome::rollback_of(&failed);
        assert_eq!(rb.status, InstallStatus::Failed);
        assert!(rb.error.is_some());
        assert!(rb.is_blocking_failure());
    }

    #[test]
    fn optional_install_failure_is_not_blocking() {
        let failed = InstallOutcome::failed(
            "debugger",
            "gdb-multiarch",
            false,
            OutcomeAction::Install,
            err("debugger"),
        );
        assert!(failed.is_failure());
        assert!(!failed.is_blocking_failure());
    }

    #[test]
    fn serializes_snake_case_status() {
        let o = InstallOutcome::already_present("binutils", "binutils-aarch64-linux-gnu", true);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "already_present");
        assert_eq!(json["action"], "install");
        assert!(json.get("error").is_none());
    }
}
