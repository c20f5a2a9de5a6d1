//! Scripted command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without touching the host. It
//! answers each invocation from a list of rules matched against the
//! rendered command line, and records every invocation for later assertion.
//!
//! # Example
//!
//! ```
//! use crosskit::shell::{CommandOptions, CommandRunner, MockRunner, MockResponse};
//!
//! let runner = MockRunner::new()
//!     .on("dpkg-query", MockResponse::fail(1, "no packages found"))
//!     .on("apt-get install", MockResponse::ok(""));
//!
//! let result = runner
//!     .run("dpkg-query", &["-W".to_string()], &CommandOptions::default())
//!     .unwrap();
//! assert!(!result.success);
//! assert_eq!(runner.calls(), vec!["dpkg-query -W".to_string()]);
//! ```

use std::sync::Mutex;
use std::time::Duration;

use crate::error::{CrosskitError, Result};

use super::command::{display_command, CommandOptions, CommandResult, CommandRunner};

/// Canned answer for a matched command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Exit with the given code and output.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Behave as if killed by the timeout.
    Timeout,
    /// Behave as if killed by cancellation.
    Cancelled,
    /// Fail to spawn.
    SpawnError,
}

impl MockResponse {
    /// Exit zero with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self::Exit {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Exit with `code` and the given stderr.
    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Command runner that answers from scripted rules.
///
/// Rules are checked in insertion order; the first whose prefix matches the
/// start of the rendered command line wins. Unmatched commands exit zero.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Vec<(String, MockResponse)>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for command lines starting with `prefix`.
    pub fn on(mut self, prefix: &str, response: MockResponse) -> Self {
        self.rules.push((prefix.to_string(), response));
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Command lines that start with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _options: &CommandOptions,
    ) -> Result<CommandResult> {
        let line = display_command(program, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let response = self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| MockResponse::ok(""));

        match response {
            MockResponse::Exit {
                code: 0,
                stdout,
                stderr,
            } => Ok(CommandResult::success(stdout, stderr, Duration::ZERO)),
            MockResponse::Exit {
                code,
                stdout,
                stderr,
            } => Ok(CommandResult::failure(
                Some(code),
                stdout,
                stderr,
                Duration::ZERO,
            )),
            MockResponse::Timeout => Ok(CommandResult::timeout(
                String::new(),
                String::new(),
                Duration::ZERO,
            )),
            MockResponse::Cancelled => Ok(CommandResult::cancelled(
                String::new(),
                String::new(),
                Duration::ZERO,
            )),
            MockResponse::SpawnError => Err(CrosskitError::CommandFailed {
                command: line,
                code: None,
            }),
        }
    }
}
