//! crosskit CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use crosskit::cli::{Cli, CommandContext, CommandDispatcher};
use crosskit::report::ExitCategory;
use crosskit::ui::{create_ui, should_use_colors, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("crosskit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crosskit=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("crosskit starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let use_color = should_use_colors(cli.no_color);
    let mut ui = create_ui(use_color, output_mode);

    let project_root = cli
        .project
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut ctx = CommandContext::new(&project_root);
    ctx.config_path = cli.config.clone();
    ctx.platform = cli.platform;
    ctx.json = cli.json;
    ctx.use_color = use_color;

    if let Err(e) = ctx.cancel.install_interrupt_handler() {
        tracing::warn!("Could not install interrupt handler: {}", e);
    }

    let dispatcher = CommandDispatcher::new(ctx);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(ExitCategory::for_error(&e).code())
        }
    }
}
