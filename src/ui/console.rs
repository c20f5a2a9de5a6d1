//! Console UI writing to stdout and stderr.

use super::theme::Theme;
use super::{OutputMode, UserInterface};

/// UI implementation for terminal and CI use.
///
/// Status goes to stdout, warnings and errors to stderr. Nothing here ever
/// waits for input.
pub struct ConsoleUI {
    mode: OutputMode,
    theme: Theme,
}

impl ConsoleUI {
    /// Create a console UI.
    pub fn new(mode: OutputMode, use_color: bool) -> Self {
        Self {
            mode,
            theme: Theme::for_color(use_color),
        }
    }
}

impl UserInterface for ConsoleUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn detail(&mut self, msg: &str) {
        if self.mode.shows_detail() {
            println!("  {}", self.theme.dim.apply_to(msg));
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", self.theme.format_header(title));
        }
    }

    fn block(&mut self, text: &str) {
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }
}
