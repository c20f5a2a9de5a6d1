//! Validate command implementation.
//!
//! `crosskit validate` re-runs the probe compilations against the
//! toolchain recorded in `toolchain.json`, or against the configured one
//! when nothing has been generated yet.

use std::time::Duration;

use crate::cli::args::ValidateArgs;
use crate::error::{CrosskitError, Result};
use crate::platform::PlatformProfile;
use crate::report::Report;
use crate::run_id::RunId;
use crate::toolchain::ToolchainDescriptor;
use crate::ui::UserInterface;
use crate::validate::{default_probes, Validator, ValidatorSettings};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};
use super::display::{abort, conclude};

/// The validate command implementation.
pub struct ValidateCommand {
    args: ValidateArgs,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(args: ValidateArgs) -> Self {
        Self { args }
    }

    /// The persisted descriptor, or one derived from config.
    fn descriptor(
        &self,
        ctx: &CommandContext,
        config: &crate::config::CrosskitConfig,
        output_dir: &std::path::Path,
    ) -> Result<(ToolchainDescriptor, Option<PlatformProfile>)> {
        match ToolchainDescriptor::load(output_dir) {
            Ok(descriptor) => {
                if let Some(wanted) = self.args.target.as_deref() {
                    if wanted != descriptor.target.as_str() {
                        return Err(CrosskitError::ConfigValidationError {
                            message: format!(
                                "{} describes {}, not {}",
                                output_dir.display(),
                                descriptor.target,
                                wanted
                            ),
                        });
                    }
                }
                tracing::debug!("Validating descriptor from {}", output_dir.display());
                Ok((descriptor, None))
            }
            Err(CrosskitError::ConfigNotFound { .. }) => {
                let target = ctx.target(self.args.target.as_deref(), config)?;
                let profile = ctx.platform(config)?;
                let descriptor = config.descriptor(target, &profile);
                Ok((descriptor, Some(profile)))
            }
            Err(e) => Err(e),
        }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = Report::new(RunId::new(), "validate");

        let config = match ctx.load_config() {
            Ok(config) => config,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        };
        let output_dir = ctx.output_dir(self.args.output.as_deref(), &config);

        let (descriptor, profile) = match self.descriptor(ctx, &config, &output_dir) {
            Ok(found) => found,
            Err(e) => return Ok(abort(ctx, ui, report, e, None)),
        };
        let mut report = report.with_target(descriptor.target.as_str());
        if let Some(profile) = &profile {
            report = report.with_platform(profile);
        }

        ui.show_header(&format!("Validating {} toolchain", descriptor.target));
        let validator = Validator::new(
            ctx.runner.clone(),
            ValidatorSettings {
                compile_timeout: Duration::from_secs(config.settings.compile_timeout_secs),
                max_parallel: config.settings.max_parallel,
                cancel: ctx.cancel.clone(),
            },
        );

        match validator.validate(&descriptor, &default_probes(), &report.run_id) {
            Ok(summary) => report.add_validation(summary),
            Err(e) => return Ok(abort(ctx, ui, report, e, Some(&output_dir))),
        }
        report.cancelled = ctx.cancel.is_cancelled();

        Ok(conclude(ctx, ui, report, Some(&output_dir)))
    }
}
