//! Uninstall command implementation.

use std::time::Duration;

use crate::cli::args::UninstallArgs;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::provider::{provider_for, ProviderSettings};
use crate::report::Report;
use crate::run_id::RunId;
use crate::toolchain::ComponentSpec;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};
use super::display::{abort, conclude};

/// The uninstall command implementation.
///
/// Removes every installed required component of the target in reverse
/// declaration order. Optional components (debugger, emulator) are often
/// shared with other targets, so they are kept unless `--include-optional`
/// is given. Generated files are left in place.
pub struct UninstallCommand {
    args: UninstallArgs,
}

impl UninstallCommand {
    /// Create a new uninstall command.
    pub fn new(args: UninstallArgs) -> Self {
        Self { args }
    }
}

impl Command for UninstallCommand {
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = Report::new(RunId::new(), "uninstall");

        let plan = match ctx.plan(self.args.target.as_deref(), None) {
            Ok(plan) => plan,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        };
        let mut report = report
            .with_platform(&plan.profile)
            .with_target(plan.target.as_str());

        let settings = ProviderSettings {
            timeout: Duration::from_secs(plan.config.settings.install_timeout_secs),
            use_sudo: ctx.use_sudo,
            cancel: ctx.cancel.clone(),
            ..Default::default()
        };
        let provider = match provider_for(&plan.profile, ctx.runner.clone(), settings) {
            Ok(provider) => provider,
            Err(e) => return Ok(abort(ctx, ui, report, e.into(), None)),
        };

        let (components, kept): (Vec<ComponentSpec>, Vec<ComponentSpec>) = plan
            .config
            .components(&plan.target)
            .iter()
            .map(|c| c.resolved_for(plan.profile.family))
            .partition(|c| self.args.include_optional || c.required);

        ui.show_header(&format!(
            "Removing {} toolchain with {}",
            plan.target,
            provider.id()
        ));
        for component in &kept {
            ui.detail(&format!(
                "Keeping optional {} ({}); pass --include-optional to remove it",
                component.name, component.package
            ));
        }

        let mut orchestrator = Orchestrator::new(provider.as_ref(), 1, ctx.cancel.clone());
        if !orchestrator.uninstall(&components) {
            ui.warning("Some components could not be removed");
        }

        report.cancelled = ctx.cancel.is_cancelled();
        report.state = Some(orchestrator.state());
        report.add_outcomes(orchestrator.into_outcomes());
        Ok(conclude(ctx, ui, report, None))
    }
}
