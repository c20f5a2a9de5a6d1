//! JSON report formatter.
//!
//! This is the machine-readable contract. Fields are only ever added;
//! existing names and meanings stay fixed, and `schema_version` moves only
//! on an incompatible change.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::orchestrator::RunState;
use crate::platform::PlatformProfile;
use crate::provider::InstallOutcome;
use crate::validate::{CompilerInfo, ValidationCheck};

use super::{ExitCategory, Report, ReportFormatter, RunStatus};

/// Version of the JSON layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Formats reports as JSON.
pub struct JsonFormatter {
    pretty: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    schema_version: u32,
    run_id: String,
    command: &'a str,
    status: RunStatus,
    exit_code: u8,
    exit_category: ExitCategory,
    started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<&'a PlatformProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<RunState>,
    cancelled: bool,
    outcomes: &'a [InstallOutcome],
    checks: &'a [ValidationCheck],
    #[serde(skip_serializing_if = "Option::is_none")]
    compiler: Option<&'a CompilerInfo>,
    generated_files: &'a [PathBuf],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    installed: usize,
    already_present: usize,
    failed: usize,
    rolled_back: usize,
    checks_passed: usize,
    checks_failed: usize,
    checks_skipped: usize,
}

impl JsonFormatter {
    /// Create a pretty-printing JSON formatter.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a formatter emitting one line.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn summary(report: &Report) -> JsonSummary {
        use crate::provider::InstallStatus;
        use crate::validate::CheckStatus;

        let outcomes = |s: InstallStatus| report.outcomes.iter().filter(|o| o.status == s).count();
        let checks = |s: CheckStatus| report.checks.iter().filter(|c| c.status == s).count();

        JsonSummary {
            installed: outcomes(InstallStatus::Installed),
            already_present: outcomes(InstallStatus::AlreadyPresent),
            failed: outcomes(InstallStatus::Failed),
            rolled_back: outcomes(InstallStatus::RolledBack),
            checks_passed: checks(CheckStatus::Pass),
            checks_failed: checks(CheckStatus::Fail),
            checks_skipped: checks(CheckStatus::Skipped),
        }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        let output = JsonReport {
            schema_version: SCHEMA_VERSION,
            run_id: report.run_id.to_string(),
            command: &report.command,
            status: report.overall_status(),
            exit_code: report.exit_code(),
            exit_category: report.exit_category(),
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.map(|t| t.to_rfc3339()),
            platform: report.platform.as_ref(),
            target: report.target.as_deref(),
            state: report.state,
            cancelled: report.cancelled,
            outcomes: &report.outcomes,
            checks: &report.checks,
            compiler: report.compiler.as_ref(),
            generated_files: &report.generated_files,
            error: report.error.as_deref(),
            summary: Self::summary(report),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
