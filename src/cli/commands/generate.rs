//! Generate command implementation.
//!
//! `crosskit generate` renders and writes the build-system files for a
//! target without installing anything.

use std::path::PathBuf;

use crate::cli::args::GenerateArgs;
use crate::error::Result;
use crate::report::Report;
use crate::run_id::RunId;
use crate::synth::{synthesize, write_configs, GeneratedConfigs};
use crate::ui::UserInterface;

use super::context::{CommandContext, Plan};
use super::dispatcher::{Command, CommandResult};
use super::display::{abort, conclude};

/// The generate command implementation.
pub struct GenerateCommand {
    args: GenerateArgs,
}

impl GenerateCommand {
    /// Create a new generate command.
    pub fn new(args: GenerateArgs) -> Self {
        Self { args }
    }
}

impl Command for GenerateCommand {
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = Report::new(RunId::new(), "generate");

        let plan = match ctx.plan(self.args.target.as_deref(), self.args.output.as_deref()) {
            Ok(plan) => plan,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        };
        let mut report = report
            .with_platform(&plan.profile)
            .with_target(plan.target.as_str());

        let generated = match synthesize(&plan.descriptor) {
            Ok(generated) => generated,
            Err(e) => return Ok(abort(ctx, ui, report, e.into(), None)),
        };

        match write_outputs(ui, &plan, &generated) {
            Ok(files) => report.generated_files = files,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        }

        Ok(conclude(ctx, ui, report, None))
    }
}

/// Write the generated files and the descriptor into the plan's output
/// directory. Returns every path, in a fixed order.
pub(super) fn write_outputs(
    ui: &mut dyn UserInterface,
    plan: &Plan,
    generated: &GeneratedConfigs,
) -> Result<Vec<PathBuf>> {
    let summary = write_configs(generated, &plan.output_dir)?;
    for path in &summary.written {
        ui.detail(&format!("wrote {}", path.display()));
    }
    for path in &summary.unchanged {
        ui.detail(&format!("unchanged {}", path.display()));
    }

    let descriptor = plan.descriptor.save(&plan.output_dir)?;

    let mut files: Vec<PathBuf> = generated
        .files()
        .iter()
        .map(|(name, _)| plan.output_dir.join(name))
        .collect();
    files.push(descriptor);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformFamily;
    use crate::synth::{AUTOTOOLS_FILE, CMAKE_FILE, ENV_SCRIPT_FILE, PKGCONFIG_FILE};
    use crate::toolchain::{ToolchainDescriptor, DESCRIPTOR_FILE};
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn context(root: &std::path::Path) -> CommandContext {
        let mut ctx = CommandContext::new(root);
        ctx.platform = Some(PlatformFamily::Fedora);
        ctx
    }

    fn args() -> GenerateArgs {
        GenerateArgs {
            target: Some("aarch64-unknown-linux-gnu".into()),
            output: Some("cross".into()),
        }
    }

    #[test]
    fn writes_every_file() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = GenerateCommand::new(args())
            .execute(&context(temp.path()), &mut ui)
            .unwrap();

        assert_eq!(result, CommandResult::success());
        let out = temp.path().join("cross");
        for name in [CMAKE_FILE, AUTOTOOLS_FILE, PKGCONFIG_FILE, ENV_SCRIPT_FILE, DESCRIPTOR_FILE] {
            assert!(out.join(name).is_file(), "{} missing", name);
        }
        let descriptor = ToolchainDescriptor::load(&out).unwrap();
        assert_eq!(
            descriptor.sysroot,
            PathBuf::from("/usr/aarch64-linux-gnu/sys-root")
        );
    }

    #[test]
    fn second_run_leaves_files_unchanged() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        GenerateCommand::new(args())
            .execute(&ctx, &mut MockUI::new())
            .unwrap();
        let first = fs::read_to_string(temp.path().join("cross").join(CMAKE_FILE)).unwrap();

        let mut ui = MockUI::new();
        GenerateCommand::new(args()).execute(&ctx, &mut ui).unwrap();

        let second = fs::read_to_string(temp.path().join("cross").join(CMAKE_FILE)).unwrap();
        assert_eq!(first, second);
        assert!(ui.details().iter().all(|d| d.starts_with("unchanged")));
    }

    #[test]
    fn unparseable_target_exits_5() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();
        let args = GenerateArgs {
            target: Some("sparc".into()),
            output: None,
        };

        let result = GenerateCommand::new(args)
            .execute(&context(temp.path()), &mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 5);
        assert!(ui.has_output("sparc"));
    }
}
