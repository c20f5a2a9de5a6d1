//! Unified status vocabulary for consistent CLI output.
//!
//! `StatusKind` maps install outcomes, validation checks and run results
//! onto one set of icons and colors.

use crate::provider::InstallStatus;
use crate::report::RunStatus;
use crate::validate::CheckStatus;

use super::theme::Theme;

/// Canonical status kinds used across all crosskit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Operation completed successfully.
    Success,
    /// Operation failed.
    Failed,
    /// Operation was skipped or not needed.
    Skipped,
    /// A change was undone.
    RolledBack,
    /// Non-fatal warning.
    Warning,
}

impl StatusKind {
    /// Unicode icon for TTY output.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Failed => "✗",
            Self::Skipped => "○",
            Self::RolledBack => "↺",
            Self::Warning => "⚠",
        }
    }

    /// Styled icon string using the given theme.
    pub fn styled(self, theme: &Theme) -> String {
        let icon = self.icon();
        match self {
            Self::Success => theme.success.apply_to(icon).to_string(),
            Self::Failed => theme.error.apply_to(icon).to_string(),
            Self::Skipped => theme.dim.apply_to(icon).to_string(),
            Self::RolledBack => theme.info.apply_to(icon).to_string(),
            Self::Warning => theme.warning.apply_to(icon).to_string(),
        }
    }

    /// Format a status line: styled icon + message.
    pub fn format(self, theme: &Theme, msg: &str) -> String {
        format!("{} {}", self.styled(theme), msg)
    }
}

impl From<InstallStatus> for StatusKind {
    fn from(status: InstallStatus) -> Self {
        match status {
            InstallStatus::Installed | InstallStatus::Removed => Self::Success,
            InstallStatus::AlreadyPresent | InstallStatus::NotAttempted => Self::Skipped,
            InstallStatus::Failed => Self::Failed,
            InstallStatus::RolledBack => Self::RolledBack,
        }
    }
}

impl From<CheckStatus> for StatusKind {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Pass => Self::Success,
            CheckStatus::Fail => Self::Failed,
            CheckStatus::Skipped => Self::Skipped,
        }
    }
}

impl From<RunStatus> for StatusKind {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Complete => Self::Success,
            RunStatus::Failed => Self::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [StatusKind; 5] = [
        StatusKind::Success,
        StatusKind::Failed,
        StatusKind::Skipped,
        StatusKind::RolledBack,
        StatusKind::Warning,
    ];

    #[test]
    fn styled_plain_is_icon() {
        let theme = Theme::plain();
        for kind in ALL {
            assert_eq!(kind.styled(&theme), kind.icon());
        }
    }

    #[test]
    fn icons_are_unique() {
        let mut icons: Vec<&str> = ALL.iter().map(|k| k.icon()).collect();
        icons.sort();
        icons.dedup();
        assert_eq!(icons.len(), ALL.len());
    }

    #[test]
    fn install_statuses_map() {
        assert_eq!(StatusKind::from(InstallStatus::Installed), StatusKind::Success);
        assert_eq!(
            StatusKind::from(InstallStatus::AlreadyPresent),
            StatusKind::Skipped
        );
        assert_eq!(
            StatusKind::from(InstallStatus::RolledBack),
            StatusKind::RolledBack
        );
        assert_eq!(StatusKind::from(InstallStatus::Failed), StatusKind::Failed);
    }

    #[test]
    fn check_statuses_map() {
        assert_eq!(StatusKind::from(CheckStatus::Pass), StatusKind::Success);
        assert_eq!(StatusKind::from(CheckStatus::Fail), StatusKind::Failed);
    }

    #[test]
    fn format_includes_icon_and_message() {
        let line = StatusKind::Failed.format(&Theme::plain(), "binutils");
        assert_eq!(line, "✗ binutils");
    }
}
