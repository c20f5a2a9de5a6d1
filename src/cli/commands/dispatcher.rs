//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::report::Report;
use crate::ui::UserInterface;

use super::context::CommandContext;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// Run-terminating failures are folded into the returned exit code;
    /// `Err` is reserved for failures outside any run.
    fn execute(&self, ctx: &CommandContext, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Process exit code.
    pub exit_code: u8,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: u8) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result matching a finished report.
    pub fn from_report(report: &Report) -> Self {
        match report.exit_code() {
            0 => Self::success(),
            code => Self::failure(code),
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    ctx: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    /// Shared context handed to every command.
    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Install(args) => {
                super::install::InstallCommand::new(args.clone()).execute(&self.ctx, ui)
            }
            Commands::Validate(args) => {
                super::validate::ValidateCommand::new(args.clone()).execute(&self.ctx, ui)
            }
            Commands::Uninstall(args) => {
                super::uninstall::UninstallCommand::new(args.clone()).execute(&self.ctx, ui)
            }
            Commands::Generate(args) => {
                super::generate::GenerateCommand::new(args.clone()).execute(&self.ctx, ui)
            }
            Commands::Detect => super::detect::DetectCommand.execute(&self.ctx, ui),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StaticHost;
    use crate::ui::MockUI;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(3);
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn dispatches_detect() {
        let temp = TempDir::new().unwrap();
        let ctx = CommandContext::new(temp.path())
            .with_host(StaticHost::new("linux").with_command("dnf"));
        let dispatcher = CommandDispatcher::new(ctx);
        let cli = Cli::parse_from(["crosskit", "detect"]);
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();

        assert_eq!(result, CommandResult::success());
        assert!(ui.has_output("fedora"));
    }
}
