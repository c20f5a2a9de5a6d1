//! Run reports.
//!
//! A [`Report`] gathers the install outcomes and validation checks of one
//! run, decides the overall status and exit code, and renders through a
//! [`ReportFormatter`]. The reporter only reads what the orchestrator and
//! validator produced.

pub mod human;
pub mod json;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CrosskitError, Result};
use crate::orchestrator::RunState;
use crate::platform::PlatformProfile;
use crate::provider::InstallOutcome;
use crate::run_id::RunId;
use crate::validate::{CompilerInfo, ValidationCheck, ValidationSummary};

pub use human::HumanFormatter;
pub use json::{JsonFormatter, SCHEMA_VERSION};

/// File name of the persisted report.
pub const REPORT_FILE: &str = "report.json";

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure category, one per process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCategory {
    Success,
    Other,
    Detection,
    Install,
    Validation,
    Configuration,
    Cancelled,
}

impl ExitCategory {
    /// Process exit code.
    pub fn code(&self) -> u8 {
        match self {
            ExitCategory::Success => 0,
            ExitCategory::Other => 1,
            ExitCategory::Detection => 2,
            ExitCategory::Install => 3,
            ExitCategory::Validation => 4,
            ExitCategory::Configuration => 5,
            ExitCategory::Cancelled => 130,
        }
    }

    /// Category of a run-terminating error.
    pub fn for_error(error: &CrosskitError) -> Self {
        match error {
            CrosskitError::UnsupportedPlatform(_) => ExitCategory::Detection,
            CrosskitError::Provider(_) => ExitCategory::Install,
            CrosskitError::CompileProbe { .. } => ExitCategory::Validation,
            CrosskitError::ConfigSynthesis(_)
            | CrosskitError::ConfigNotFound { .. }
            | CrosskitError::ConfigParseError { .. }
            | CrosskitError::ConfigValidationError { .. }
            | CrosskitError::InvalidTriple { .. } => ExitCategory::Configuration,
            CrosskitError::Cancelled => ExitCategory::Cancelled,
            CrosskitError::CommandFailed { .. }
            | CrosskitError::Io(_)
            | CrosskitError::Other(_) => ExitCategory::Other,
        }
    }
}

/// Externally observable result of one run.
#[derive(Debug, Clone)]
pub struct Report {
    pub run_id: RunId,
    /// Subcommand that produced the report.
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub platform: Option<PlatformProfile>,
    pub target: Option<String>,
    /// Final orchestrator state, when an orchestrator ran.
    pub state: Option<RunState>,
    pub cancelled: bool,
    pub outcomes: Vec<InstallOutcome>,
    pub checks: Vec<ValidationCheck>,
    pub compiler: Option<CompilerInfo>,
    pub generated_files: Vec<PathBuf>,
    /// Run-terminating error, if any.
    pub error: Option<String>,
    error_category: Option<ExitCategory>,
}

impl Report {
    /// Start a report for `command`.
    pub fn new(run_id: RunId, command: &str) -> Self {
        Self {
            started_at: run_id.timestamp(),
            run_id,
            command: command.to_string(),
            finished_at: None,
            platform: None,
            target: None,
            state: None,
            cancelled: false,
            outcomes: Vec::new(),
            checks: Vec::new(),
            compiler: None,
            generated_files: Vec::new(),
            error: None,
            error_category: None,
        }
    }

    pub fn with_platform(mut self, platform: &PlatformProfile) -> Self {
        self.platform = Some(platform.clone());
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// Append install outcomes in the order they were produced.
    pub fn add_outcomes(&mut self, outcomes: impl IntoIterator<Item = InstallOutcome>) {
        self.outcomes.extend(outcomes);
    }

    /// Record a validation run.
    pub fn add_validation(&mut self, summary: ValidationSummary) {
        if summary.compiler.is_some() {
            self.compiler = summary.compiler;
        }
        self.checks.extend(summary.checks);
    }

    /// Record a run-terminating error.
    pub fn fail(&mut self, error: &CrosskitError) {
        self.error = Some(error.to_string());
        self.error_category = Some(ExitCategory::for_error(error));
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True if a failed outcome decides the run (required component or
    /// rollback step).
    pub fn has_blocking_failure(&self) -> bool {
        self.outcomes.iter().any(InstallOutcome::is_blocking_failure)
    }

    /// True if any validation check failed.
    pub fn has_failed_check(&self) -> bool {
        self.checks.iter().any(ValidationCheck::is_failure)
    }

    /// `Complete` iff nothing blocking failed, no check failed, the run was
    /// not cancelled and no run-terminating error occurred.
    pub fn overall_status(&self) -> RunStatus {
        if self.exit_category() == ExitCategory::Success {
            RunStatus::Complete
        } else {
            RunStatus::Failed
        }
    }

    /// Category deciding the exit code.
    pub fn exit_category(&self) -> ExitCategory {
        if let Some(category) = self.error_category {
            return category;
        }
        if self.cancelled {
            ExitCategory::Cancelled
        } else if self.has_blocking_failure() {
            ExitCategory::Install
        } else if self.has_failed_check() {
            ExitCategory::Validation
        } else if self.state == Some(RunState::Failed) {
            ExitCategory::Other
        } else {
            ExitCategory::Success
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_category().code()
    }

    /// Render with `formatter` into a string.
    pub fn render(&self, formatter: &impl ReportFormatter) -> Result<String> {
        let mut buf = Vec::new();
        formatter.format(self, &mut buf)?;
        String::from_utf8(buf).map_err(|e| CrosskitError::Other(e.into()))
    }

    /// Persist the structured form as `report.json` in `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.render(&JsonFormatter::new())?)?;
        Ok(path)
    }
}

/// Trait for formatting reports.
pub trait ReportFormatter {
    /// Format the report to the given writer.
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()>;
}
