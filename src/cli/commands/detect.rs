//! Detect command implementation.
//!
//! `crosskit detect` prints the platform profile a run would use.

use crate::error::Result;
use crate::report::ExitCategory;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The detect command implementation.
pub struct DetectCommand;

impl Command for DetectCommand {
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let profile = match ctx.load_config().and_then(|config| ctx.platform(&config)) {
            Ok(profile) => profile,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(ExitCategory::for_error(&e).code()));
            }
        };

        if ctx.json {
            let json = serde_json::to_string_pretty(&profile).map_err(anyhow::Error::from)?;
            ui.block(&json);
            return Ok(CommandResult::success());
        }

        let hints: Vec<String> = profile
            .path_hints
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let mut text = String::new();
        text.push_str(&format!("Platform: {}\n", profile.family));
        text.push_str(&format!("Provider: {}\n", profile.provider_id));
        if let Some(os_id) = &profile.os_id {
            text.push_str(&format!("OS: {}\n", os_id));
        }
        text.push_str(&format!("Tool paths: {}\n", hints.join(", ")));
        ui.block(&text);

        Ok(CommandResult::success())
    }
}
