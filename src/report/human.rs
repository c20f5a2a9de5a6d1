//! Human-readable report formatter.

use std::io::Write;

use crate::provider::{InstallOutcome, InstallStatus, OutcomeAction};
use crate::ui::{StatusKind, Theme};
use crate::validate::ValidationCheck;

use super::{Report, ReportFormatter};

/// Formats a report as an aligned text summary.
pub struct HumanFormatter {
    theme: Theme,
}

impl HumanFormatter {
    /// Create a new human formatter.
    pub fn new(use_color: bool) -> Self {
        Self {
            theme: Theme::for_color(use_color),
        }
    }

    fn outcome_line(&self, outcome: &InstallOutcome, width: usize) -> String {
        let label = match (outcome.action, outcome.status) {
            (OutcomeAction::Rollback, InstallStatus::Failed) => "rollback failed".to_string(),
            (OutcomeAction::Uninstall, InstallStatus::Failed) => "removal failed".to_string(),
            (_, status) => status.to_string(),
        };
        let mut line = format!(
            "{:<width$}  {:<16}  {}",
            outcome.component,
            label,
            self.theme.dim.apply_to(&outcome.package),
            width = width
        );
        if let Some(error) = &outcome.error {
            line.push_str(&format!("\n      {}", self.theme.error.apply_to(&error.message)));
        }
        StatusKind::from(outcome.status).format(&self.theme, &line)
    }

    fn check_line(&self, check: &ValidationCheck, width: usize) -> String {
        let line = format!(
            "{:<width$}  {:<7}  {}",
            check.name,
            check.status.as_str(),
            check.detail,
            width = width
        );
        StatusKind::from(check.status).format(&self.theme, &line)
    }
}

impl ReportFormatter for HumanFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        let title = match &report.target {
            Some(target) => format!("crosskit {} for {}", report.command, target),
            None => format!("crosskit {}", report.command),
        };
        writeln!(writer, "{}", self.theme.header.apply_to(title))?;

        if let Some(platform) = &report.platform {
            writeln!(
                writer,
                "{} {} ({})",
                self.theme.key.apply_to("Platform:"),
                platform.family,
                platform.provider_id
            )?;
        }

        if !report.outcomes.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.theme.key.apply_to("Components"))?;
            let width = report
                .outcomes
                .iter()
                .map(|o| o.component.len())
                .max()
                .unwrap_or(0);
            for outcome in &report.outcomes {
                writeln!(writer, "  {}", self.outcome_line(outcome, width))?;
            }
        }

        if !report.checks.is_empty() {
            writeln!(writer)?;
            match &report.compiler {
                Some(compiler) => writeln!(
                    writer,
                    "{} {}",
                    self.theme.key.apply_to("Validation"),
                    self.theme.dim.apply_to(format!("({})", compiler.version_line))
                )?,
                None => writeln!(writer, "{}", self.theme.key.apply_to("Validation"))?,
            }
            let width = report.checks.iter().map(|c| c.name.len()).max().unwrap_or(0);
            for check in &report.checks {
                writeln!(writer, "  {}", self.check_line(check, width))?;
            }
        }

        if !report.generated_files.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.theme.key.apply_to("Generated"))?;
            for path in &report.generated_files {
                writeln!(writer, "  {}", path.display())?;
            }
        }

        if let Some(error) = &report.error {
            writeln!(writer)?;
            writeln!(writer, "{}", self.theme.format_error(error))?;
        }

        writeln!(writer)?;
        let status = report.overall_status();
        let summary = format!("Result: {} (exit {})", status, report.exit_code());
        writeln!(writer, "{}", StatusKind::from(status).format(&self.theme, &summary))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{check, failed_install_report};
    use crate::validate::{CheckStatus, ValidationSummary};

    fn render(report: &Report) -> String {
        let mut output = Vec::new();
        HumanFormatter::new(false).format(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn lists_outcomes_with_rollback_label() {
        let text = render(&failed_install_report());

        assert!(text.contains("crosskit install for aarch64-unknown-linux-gnu"));
        assert!(text.contains("✗ binutils"));
        assert!(text.contains("apt-get install exited with code 100"));
        assert!(text.contains("↺ compiler  rolled back"));
        assert!(text.contains("Result: failed (exit 3)"));
    }

    #[test]
    fn lists_checks() {
        let mut report = crate::report::Report::new(crate::run_id::RunId::new(), "validate");
        report.add_validation(ValidationSummary {
            compiler: None,
            checks: vec![check("c-hello", CheckStatus::Pass)],
        });

        let text = render(&report);

        assert!(text.contains("Validation"));
        assert!(text.contains("✓ c-hello"));
        assert!(text.contains("Result: complete (exit 0)"));
        assert!(!text.contains("Components"));
    }
}
