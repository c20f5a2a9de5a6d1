//! User-facing terminal output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`ConsoleUI`] writing to stdout/stderr
//! - [`MockUI`] capturing output for tests
//!
//! # Example
//!
//! ```
//! use crosskit::ui::{MockUI, OutputMode, UserInterface};
//!
//! let mut ui = MockUI::with_mode(OutputMode::Normal);
//! ui.show_header("crosskit install");
//! ui.success("compiler installed");
//! assert_eq!(ui.successes(), &["compiler installed".to_string()]);
//! ```

pub mod console;
pub mod icons;
pub mod mock;
pub mod output;
pub mod theme;

pub use console::ConsoleUI;
pub use icons::StatusKind;
pub use mock::MockUI;
pub use output::OutputMode;
pub use theme::{should_use_colors, Theme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a message only in verbose mode.
    fn detail(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Emit preformatted output (a rendered report). Shown in every mode.
    fn block(&mut self, text: &str);
}

/// Create the console UI for the given flags.
pub fn create_ui(use_color: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    Box::new(ConsoleUI::new(mode, use_color))
}
