//! Terminal styles for console output and the human report.

use console::Style;

use super::icons::StatusKind;

/// Styles keyed by role. Every field is `Style::new()` when color is off.
#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Rollback markers.
    pub info: Style,
    pub dim: Style,
    pub header: Style,
    /// Labels such as `Platform:` and section names.
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_color(true)
    }
}

impl Theme {
    /// Colored theme when `use_color`, plain otherwise.
    pub fn for_color(use_color: bool) -> Self {
        let style = |colored: Style| if use_color { colored } else { Style::new() };
        Self {
            success: style(Style::new().green()),
            warning: style(Style::new().yellow()),
            error: style(Style::new().red().bold()),
            info: style(Style::new().magenta()),
            dim: style(Style::new().dim()),
            header: style(Style::new().cyan().bold()),
            key: style(Style::new().bold()),
        }
    }

    /// The uncolored theme.
    pub fn plain() -> Self {
        Self::for_color(false)
    }

    pub fn format_success(&self, msg: &str) -> String {
        StatusKind::Success.format(self, msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        StatusKind::Warning.format(self, msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        StatusKind::Failed.format(self, msg)
    }

    /// `==> title`, used for command banners.
    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.header.apply_to("==>"), self.key.apply_to(title))
    }
}

/// Whether stdout should be colored.
///
/// `--no-color` and a set `NO_COLOR` both turn color off; otherwise color
/// follows whether stdout is a terminal.
pub fn should_use_colors(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_prefixes_icons() {
        let theme = Theme::plain();
        assert_eq!(theme.format_success("compiler installed"), "✓ compiler installed");
        assert_eq!(theme.format_error("binutils failed"), "✗ binutils failed");
        assert!(theme.format_warning("rolled back").starts_with("⚠"));
    }

    #[test]
    fn header_has_banner_marker() {
        let msg = Theme::plain().format_header("crosskit install");
        assert_eq!(msg, "==> crosskit install");
    }

    #[test]
    fn no_color_flag_disables_colors() {
        assert!(!should_use_colors(true));
    }
}
