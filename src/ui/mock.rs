//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
///
/// Everything is captured regardless of output mode; the mode is only
/// reported back through [`UserInterface::output_mode`].
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    details: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    blocks: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured verbose-only messages.
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all captured preformatted blocks.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Check if a message containing `needle` was shown on any channel.
    pub fn has_output(&self, needle: &str) -> bool {
        [
            &self.messages,
            &self.details,
            &self.successes,
            &self.warnings,
            &self.errors,
            &self.headers,
            &self.blocks,
        ]
        .iter()
        .any(|channel| channel.iter().any(|m| m.contains(needle)))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn detail(&mut self, msg: &str) {
        self.details.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn block(&mut self, text: &str) {
        self.blocks.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_each_channel() {
        let mut ui = MockUI::new();
        ui.message("m");
        ui.detail("d");
        ui.success("s");
        ui.warning("w");
        ui.error("e");
        ui.show_header("h");
        ui.block("report\n");

        assert_eq!(ui.messages(), &["m".to_string()]);
        assert_eq!(ui.details(), &["d".to_string()]);
        assert_eq!(ui.successes(), &["s".to_string()]);
        assert_eq!(ui.warnings(), &["w".to_string()]);
        assert_eq!(ui.errors(), &["e".to_string()]);
        assert_eq!(ui.headers(), &["h".to_string()]);
        assert_eq!(ui.blocks(), &["report\n".to_string()]);
    }

    #[test]
    fn has_output_searches_all_channels() {
        let mut ui = MockUI::with_mode(OutputMode::Quiet);
        ui.warning("rolling back compiler");
        assert!(ui.has_output("rolling back"));
        assert!(!ui.has_output("installed"));
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }
}
