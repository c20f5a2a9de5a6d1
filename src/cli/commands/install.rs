//! Install command implementation.
//!
//! `crosskit install` provisions a toolchain end to end: resolve the plan,
//! render the build-system files, install components (rolling back on a
//! required failure), write the files, validate, and report.
//!
//! An interrupt at any point before the run ends rolls back what this run
//! installed. A validation failure does not.

use std::path::Path;
use std::time::Duration;

use crate::cli::args::InstallArgs;
use crate::error::{CrosskitError, Result};
use crate::orchestrator::{AbortReason, Orchestrator};
use crate::provider::{provider_for, ProviderSettings};
use crate::report::Report;
use crate::run_id::RunId;
use crate::synth::synthesize;
use crate::toolchain::ComponentSpec;
use crate::ui::UserInterface;
use crate::validate::{default_probes, ValidationSummary, Validator, ValidatorSettings};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};
use super::display::{abort, conclude};
use super::generate::write_outputs;

/// The install command implementation.
pub struct InstallCommand {
    args: InstallArgs,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(args: InstallArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }
}

impl Command for InstallCommand {
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = Report::new(RunId::new(), "install");

        let plan = match ctx.plan(self.args.target.as_deref(), self.args.output.as_deref()) {
            Ok(plan) => plan,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        };
        let save_dir = plan.output_dir.clone();
        let mut report = report
            .with_platform(&plan.profile)
            .with_target(plan.target.as_str());

        // Nothing is installed for a descriptor that cannot render.
        let generated = match synthesize(&plan.descriptor) {
            Ok(generated) => generated,
            Err(e) => return Ok(abort(ctx, ui, report, e.into(), Some(&save_dir))),
        };

        let settings = &plan.config.settings;
        let max_parallel = self.args.max_parallel.unwrap_or(settings.max_parallel);
        if max_parallel == 0 {
            let error = CrosskitError::ConfigValidationError {
                message: "--max-parallel must be at least 1".to_string(),
            };
            return Ok(abort(ctx, ui, report, error, Some(&save_dir)));
        }

        let provider_settings = ProviderSettings {
            timeout: Duration::from_secs(settings.install_timeout_secs),
            use_sudo: ctx.use_sudo,
            cancel: ctx.cancel.clone(),
            ..Default::default()
        };
        let provider = match provider_for(&plan.profile, ctx.runner.clone(), provider_settings) {
            Ok(provider) => provider,
            Err(e) => return Ok(abort(ctx, ui, report, e.into(), Some(&save_dir))),
        };

        let components: Vec<ComponentSpec> = plan
            .config
            .components(&plan.target)
            .iter()
            .map(|c| c.resolved_for(plan.profile.family))
            .collect();

        ui.show_header(&format!(
            "Installing {} toolchain with {}",
            plan.target,
            provider.id()
        ));

        let mut orchestrator = Orchestrator::new(provider.as_ref(), max_parallel, ctx.cancel.clone());
        let installed = orchestrator.install(&components);
        for outcome in orchestrator.outcomes() {
            ui.detail(&format!("{}: {}", outcome.component, outcome.status));
        }

        if let Err(reason) = installed {
            ui.warning(&format!("Install aborted ({}); installed components were rolled back", reason));
            report.cancelled = reason == AbortReason::Cancelled;
            report.state = Some(orchestrator.state());
            report.add_outcomes(orchestrator.into_outcomes());
            return Ok(conclude(ctx, ui, report, Some(&save_dir)));
        }
        if orchestrator.cancel_rollback() {
            return Ok(interrupted(ctx, ui, report, orchestrator, &save_dir));
        }
        ui.success(&format!("{} components ready", components.len()));

        match write_outputs(ui, &plan, &generated) {
            Ok(files) => report.generated_files = files,
            Err(e) => {
                report.state = Some(orchestrator.state());
                report.add_outcomes(orchestrator.into_outcomes());
                return Ok(abort(ctx, ui, report, e, Some(&save_dir)));
            }
        }

        if self.args.skip_validate {
            if orchestrator.cancel_rollback() {
                return Ok(interrupted(ctx, ui, report, orchestrator, &save_dir));
            }
            orchestrator.finish();
        } else {
            let validator = Validator::new(
                ctx.runner.clone(),
                ValidatorSettings {
                    compile_timeout: Duration::from_secs(settings.compile_timeout_secs),
                    max_parallel,
                    cancel: ctx.cancel.clone(),
                },
            );
            let run_id = report.run_id.clone();
            let probes = default_probes();
            let validated = orchestrator.validate(
                || validator.validate(&plan.descriptor, &probes, &run_id),
                |result: &Result<ValidationSummary>| result.as_ref().is_ok_and(ValidationSummary::passed),
            );
            match validated {
                Ok(summary) => report.add_validation(summary),
                Err(e) => report.fail(&e),
            }
            if orchestrator.abort_reason() == Some(&AbortReason::Cancelled) {
                return Ok(interrupted(ctx, ui, report, orchestrator, &save_dir));
            }
        }

        report.state = Some(orchestrator.state());
        report.add_outcomes(orchestrator.into_outcomes());
        Ok(conclude(ctx, ui, report, Some(&save_dir)))
    }
}

/// Finish a run whose installs were unwound by an interrupt.
fn interrupted(
    ctx: &CommandContext,
    ui: &mut dyn UserInterface,
    mut report: Report,
    orchestrator: Orchestrator<'_>,
    save_dir: &Path,
) -> CommandResult {
    ui.warning("Install interrupted; installed components were rolled back");
    report.cancelled = true;
    report.state = Some(orchestrator.state());
    report.add_outcomes(orchestrator.into_outcomes());
    conclude(ctx, ui, report, Some(save_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformFamily;
    use crate::report::REPORT_FILE;
    use crate::shell::{MockResponse, MockRunner};
    use crate::synth::{CMAKE_FILE, ENV_SCRIPT_FILE};
    use crate::toolchain::DESCRIPTOR_FILE;
    use crate::ui::MockUI;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(root: &Path, runner: Arc<MockRunner>) -> CommandContext {
        let mut ctx = CommandContext::new(root).with_runner(runner);
        ctx.platform = Some(PlatformFamily::Debian);
        ctx.use_sudo = false;
        ctx
    }

    fn args(skip_validate: bool) -> InstallArgs {
        InstallArgs {
            target: Some("aarch64-unknown-linux-gnu".into()),
            output: Some("out".into()),
            skip_validate,
            max_parallel: None,
        }
    }

    fn read_report(dir: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(dir.join(REPORT_FILE)).unwrap()).unwrap()
    }

    #[test]
    fn installs_and_writes_files() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ctx = context(temp.path(), runner.clone());
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(true)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result, CommandResult::success());
        let out = temp.path().join("out");
        assert!(out.join(CMAKE_FILE).is_file());
        assert!(out.join(ENV_SCRIPT_FILE).is_file());
        assert!(out.join(DESCRIPTOR_FILE).is_file());
        assert_eq!(read_report(&out)["status"], "complete");
        assert_eq!(
            runner.calls_matching("apt-get install")[0],
            "apt-get install -y --no-install-recommends gcc-aarch64-linux-gnu"
        );
    }

    #[test]
    fn required_failure_exits_3_without_writing_files() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new().on(
            "apt-get install -y --no-install-recommends binutils",
            MockResponse::fail(100, "E: Unable to locate package"),
        ));
        let ctx = context(temp.path(), runner.clone());
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(true)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result.exit_code, 3);
        let out = temp.path().join("out");
        assert!(!out.join(CMAKE_FILE).exists());
        let report = read_report(&out);
        assert_eq!(report["state"], "failed");
        assert_eq!(report["exit_category"], "install");
        assert!(runner.calls_matching("apt-get install -y --no-install-recommends libc6").is_empty());
        assert!(ui.has_output("rolled back"));
    }

    #[test]
    fn validation_failure_keeps_install_and_exits_4() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("bin");
        fs::create_dir_all(temp.path().join(".crosskit")).unwrap();
        fs::write(
            temp.path().join(".crosskit/config.yml"),
            format!(
                "compilers:\n  cc: {0}/gcc\n  cxx: {0}/g++\n",
                missing.display()
            ),
        )
        .unwrap();
        let runner = Arc::new(MockRunner::new());
        let ctx = context(temp.path(), runner.clone());
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(false)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result.exit_code, 4);
        assert!(runner.calls_matching("apt-get remove").is_empty());
        let report = read_report(&temp.path().join("out"));
        assert_eq!(report["exit_category"], "validation");
        assert_eq!(report["checks"][0]["name"], "c-hello");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["summary"]["installed"], 6);
    }

    #[test]
    fn bad_descriptor_installs_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".crosskit")).unwrap();
        fs::write(
            temp.path().join(".crosskit/config.yml"),
            "sysroot: relative/sysroot\n",
        )
        .unwrap();
        let runner = Arc::new(MockRunner::new());
        let ctx = context(temp.path(), runner.clone());
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(true)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result.exit_code, 5);
        assert!(runner.calls().is_empty());
    }

    /// Sets the cancel token the first time the target compiler is run.
    struct InterruptOnCompile {
        inner: MockRunner,
        cancel: crate::shell::CancelToken,
    }

    impl crate::shell::CommandRunner for InterruptOnCompile {
        fn run(
            &self,
            program: &str,
            args: &[String],
            options: &crate::shell::CommandOptions,
        ) -> Result<crate::shell::CommandResult> {
            if program.ends_with("gcc") {
                self.cancel.cancel();
            }
            crate::shell::CommandRunner::run(&self.inner, program, args, options)
        }
    }

    #[test]
    fn interrupt_during_validation_rolls_back_and_exits_130() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("gcc"), "").unwrap();
        fs::create_dir_all(temp.path().join(".crosskit")).unwrap();
        fs::write(
            temp.path().join(".crosskit/config.yml"),
            format!("compilers:\n  cc: {}\n", bin.join("gcc").display()),
        )
        .unwrap();
        let mut ctx = CommandContext::new(temp.path());
        ctx.platform = Some(PlatformFamily::Debian);
        ctx.use_sudo = false;
        let runner = Arc::new(InterruptOnCompile {
            inner: MockRunner::new(),
            cancel: ctx.cancel.clone(),
        });
        let ctx = ctx.with_runner(runner);
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(false)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result.exit_code, 130);
        let report = read_report(&temp.path().join("out"));
        assert_eq!(report["cancelled"], true);
        assert_eq!(report["state"], "failed");
        assert_eq!(report["summary"]["installed"], 6);
        assert_eq!(report["summary"]["rolled_back"], 6);
        assert!(ui.has_output("interrupted"));
    }

    #[test]
    fn cancelled_before_start_exits_130() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ctx = context(temp.path(), runner.clone());
        ctx.cancel.cancel();
        let mut ui = MockUI::new();

        let result = InstallCommand::new(args(true)).execute(&ctx, &mut ui).unwrap();

        assert_eq!(result.exit_code, 130);
        assert!(runner.calls_matching("apt-get install").is_empty());
    }
}
