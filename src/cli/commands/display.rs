//! Shared report output for commands.

use std::path::Path;

use crate::error::CrosskitError;
use crate::report::{HumanFormatter, JsonFormatter, Report};
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::CommandResult;

/// Print the report in the selected format.
pub fn show_report(ctx: &CommandContext, ui: &mut dyn UserInterface, report: &Report) {
    let rendered = if ctx.json {
        report.render(&JsonFormatter::new())
    } else {
        report.render(&HumanFormatter::new(ctx.use_color))
    };

    match rendered {
        Ok(text) => ui.block(&text),
        Err(e) => ui.error(&format!("Failed to render report: {}", e)),
    }
}

/// Finish the report, print it, optionally persist it, and turn it into a result.
pub fn conclude(
    ctx: &CommandContext,
    ui: &mut dyn UserInterface,
    mut report: Report,
    save_dir: Option<&Path>,
) -> CommandResult {
    report.finish();

    if let Some(dir) = save_dir {
        match report.save(dir) {
            Ok(path) => tracing::debug!("Report written to {}", path.display()),
            Err(e) => ui.warning(&format!("Could not write report: {}", e)),
        }
    }

    show_report(ctx, ui, &report);
    CommandResult::from_report(&report)
}

/// Record a run-terminating error and conclude.
pub fn abort(
    ctx: &CommandContext,
    ui: &mut dyn UserInterface,
    mut report: Report,
    error: CrosskitError,
    save_dir: Option<&Path>,
) -> CommandResult {
    tracing::debug!("Run terminated: {}", error);
    report.fail(&error);
    conclude(ctx, ui, report, save_dir)
}
