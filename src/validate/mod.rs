//! Toolchain validation.
//!
//! The [`Validator`] compiles each probe program with the descriptor's
//! compilers inside a run-scoped temporary directory, then reads the
//! produced binary's header and compares its architecture marker with the
//! target's. Every probe yields one [`ValidationCheck`]; failures are
//! recorded, never raised, and never stop sibling checks.

pub mod inspect;
pub mod probe;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::error::{CompileProbeError, CrosskitError, Result};
use crate::run_id::RunId;
use crate::shell::{CancelToken, CommandOptions, CommandRunner};
use crate::toolchain::ToolchainDescriptor;

pub use inspect::{inspect_bytes, inspect_file, BinaryFormat, BinaryInfo};
pub use probe::{default_probes, ProbeLanguage, ProbeOutput, ProbeSpec};

/// Matches a dotted version number such as `13.2.0`.
static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)?").expect("VERSION_REGEX must compile"));

/// Result of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of compiling and inspecting one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,

    /// Probe program text.
    #[serde(skip)]
    pub probe_source: String,

    /// Marker the binary must carry (`AArch64`, ...).
    pub expected_marker: String,

    /// Marker actually found, when inspection got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_marker: Option<String>,

    pub status: CheckStatus,

    /// Human-readable explanation (diagnostic text on failure).
    pub detail: String,

    #[serde(skip)]
    pub error: Option<CompileProbeError>,
}

impl ValidationCheck {
    fn new(probe: &ProbeSpec, expected: &str) -> Self {
        Self {
            name: probe.name.clone(),
            probe_source: probe.source.clone(),
            expected_marker: expected.to_string(),
            actual_marker: None,
            status: CheckStatus::Skipped,
            detail: String::new(),
            error: None,
        }
    }

    fn pass(mut self, marker: &str) -> Self {
        self.status = CheckStatus::Pass;
        self.actual_marker = Some(marker.to_string());
        self.detail = format!("binary is {}", marker);
        self
    }

    fn fail(mut self, error: CompileProbeError) -> Self {
        self.status = CheckStatus::Fail;
        self.detail = error.to_string();
        self.error = Some(error);
        self
    }

    fn skip(mut self, detail: &str) -> Self {
        self.status = CheckStatus::Skipped;
        self.detail = detail.to_string();
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    /// The failure as a crate error, for logging.
    pub fn to_error(&self) -> Option<CrosskitError> {
        self.error.clone().map(|source| CrosskitError::CompileProbe {
            check: self.name.clone(),
            source,
        })
    }
}

/// Compiler identity recorded alongside the checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerInfo {
    pub path: PathBuf,
    /// First line of `--version` output.
    pub version_line: String,
    /// Dotted version parsed from that line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Everything a validation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub compiler: Option<CompilerInfo>,
    pub checks: Vec<ValidationCheck>,
}

impl ValidationSummary {
    /// True when no check failed.
    pub fn passed(&self) -> bool {
        !self.checks.iter().any(ValidationCheck::is_failure)
    }
}

/// Tunables for a validation run.
#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    /// Kill a compiler invocation after this long.
    pub compile_timeout: Duration,
    /// Checks compiled at once.
    pub max_parallel: usize,
    pub cancel: CancelToken,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            compile_timeout: Duration::from_secs(120),
            max_parallel: 1,
            cancel: CancelToken::new(),
        }
    }
}

/// Compiles probes and checks their architecture.
pub struct Validator {
    runner: Arc<dyn CommandRunner>,
    settings: ValidatorSettings,
}

impl Validator {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: ValidatorSettings) -> Self {
        Self { runner, settings }
    }

    /// Run every probe against the descriptor's toolchain.
    ///
    /// Errors only when the run's scratch directory cannot be created;
    /// everything else is reported per check.
    pub fn validate(
        &self,
        descriptor: &ToolchainDescriptor,
        probes: &[ProbeSpec],
        run_id: &RunId,
    ) -> Result<ValidationSummary> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("crosskit-{}-", run_id))
            .tempdir()?;
        tracing::debug!("Validation scratch dir: {}", scratch.path().display());

        let compiler = self.compiler_info(&descriptor.compilers.cc);

        let mut checks = Vec::with_capacity(probes.len());
        for batch in probes.chunks(self.settings.max_parallel.max(1)) {
            checks.extend(self.run_batch(descriptor, batch, &scratch));
        }

        for check in &checks {
            match check.status {
                CheckStatus::Pass => tracing::info!("Check {} passed", check.name),
                CheckStatus::Fail => match check.to_error() {
                    Some(error) => tracing::warn!("{}", error),
                    None => tracing::warn!("Check {} failed: {}", check.name, check.detail),
                },
                CheckStatus::Skipped => tracing::info!("Check {} skipped: {}", check.name, check.detail),
            }
        }

        Ok(ValidationSummary { compiler, checks })
    }

    fn run_batch(
        &self,
        descriptor: &ToolchainDescriptor,
        batch: &[ProbeSpec],
        scratch: &TempDir,
    ) -> Vec<ValidationCheck> {
        if batch.len() == 1 {
            return vec![self.run_check(descriptor, &batch[0], scratch.path())];
        }

        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|probe| {
                    let handle = scope.spawn(move || self.run_check(descriptor, probe, scratch.path()));
                    (probe, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(probe, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        ValidationCheck::new(probe, descriptor.target.expected_marker()).fail(
                            CompileProbeError::CompileFailed {
                                diagnostic: "validation worker panicked".to_string(),
                            },
                        )
                    })
                })
                .collect()
        })
    }

    /// Compile and inspect one probe inside its own subdirectory.
    fn run_check(
        &self,
        descriptor: &ToolchainDescriptor,
        probe: &ProbeSpec,
        scratch: &Path,
    ) -> ValidationCheck {
        let check = ValidationCheck::new(probe, descriptor.target.expected_marker());

        if self.settings.cancel.is_cancelled() {
            return check.skip("run cancelled");
        }

        let compiler = match probe.language {
            ProbeLanguage::C => &descriptor.compilers.cc,
            ProbeLanguage::Cxx => &descriptor.compilers.cxx,
        };
        if !compiler.is_file() {
            if probe.optional {
                return check.skip(&format!("compiler not found: {}", compiler.display()));
            }
            return check.fail(CompileProbeError::CompilerMissing(compiler.clone()));
        }

        let dir = scratch.join(&probe.name);
        let source = dir.join(format!("probe.{}", probe.language.extension()));
        let output = dir.join(probe.output_file());
        let written = fs::create_dir_all(&dir).and_then(|_| fs::write(&source, &probe.source));
        if let Err(e) = written {
            return check.fail(CompileProbeError::CompileFailed {
                diagnostic: format!("cannot write probe source: {}", e),
            });
        }

        let mut args = descriptor.compile_flags();
        args.extend(probe.compile_args(&source.to_string_lossy(), &output.to_string_lossy()));

        let options = CommandOptions {
            cwd: Some(dir.clone()),
            ..CommandOptions::bounded(self.settings.compile_timeout, self.settings.cancel.clone())
        };
        let program = compiler.to_string_lossy();
        let result = match self.runner.run(&program, &args, &options) {
            Ok(result) => result,
            Err(e) => {
                return check.fail(CompileProbeError::CompileFailed {
                    diagnostic: e.to_string(),
                })
            }
        };

        if result.timed_out {
            return check.fail(CompileProbeError::Timeout {
                seconds: self.settings.compile_timeout.as_secs(),
            });
        }
        if result.cancelled {
            return check.fail(CompileProbeError::CompileFailed {
                diagnostic: "compiler interrupted".to_string(),
            });
        }
        if !result.success {
            let stderr = result.stderr.trim();
            let diagnostic = if stderr.is_empty() {
                result.diagnostic()
            } else {
                stderr.to_string()
            };
            return check.fail(CompileProbeError::CompileFailed { diagnostic });
        }

        if !output.is_file() {
            return check.fail(CompileProbeError::Inspect(format!(
                "compiler produced no {}",
                probe.output_file()
            )));
        }

        match inspect_file(&output) {
            Ok(info) if info.marker == check.expected_marker => check.pass(info.marker),
            Ok(info) => {
                let expected = check.expected_marker.clone();
                let mut failed = check.fail(CompileProbeError::Inspect(format!(
                    "expected {} binary, found {}",
                    expected, info.marker
                )));
                failed.actual_marker = Some(info.marker.to_string());
                failed
            }
            Err(e) => check.fail(e),
        }
    }

    /// Ask the C compiler for its version.
    fn compiler_info(&self, cc: &Path) -> Option<CompilerInfo> {
        if !cc.is_file() {
            return None;
        }
        let options = CommandOptions::bounded(
            self.settings.compile_timeout,
            self.settings.cancel.clone(),
        );
        let result = self
            .runner
            .run(&cc.to_string_lossy(), &["--version".to_string()], &options)
            .ok()
            .filter(|r| r.success)?;

        let version_line = result.stdout.lines().next()?.trim().to_string();
        Some(CompilerInfo {
            path: cc.to_path_buf(),
            version: parse_version(&version_line),
            version_line,
        })
    }
}

/// Last dotted version number on a `--version` line.
///
/// GCC prints its packaging info in parentheses before the real version,
/// e.g. `aarch64-linux-gnu-gcc (Ubuntu 13.2.0-4ubuntu3) 13.2.0`.
pub fn parse_version(line: &str) -> Option<String> {
    VERSION_REGEX
        .find_iter(line)
        .last()
        .map(|m| m.as_str().to_string())
}
