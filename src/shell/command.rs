//! External process execution with timeouts and cancellation.

use crate::error::{CrosskitError, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use super::cancel::CancelToken;

/// How often a running child is polled for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to keep reading pipes after a kill. Anything that still holds
/// them open past this is abandoned.
const KILL_DRAIN: Duration = Duration::from_millis(500);

/// Result of executing an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code (None if killed by signal, timed out or cancelled).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed because it exceeded its timeout.
    pub timed_out: bool,

    /// Whether the command was killed because the run was cancelled.
    pub cancelled: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
            cancelled: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
            cancelled: false,
        }
    }

    /// Create a result for a command killed after its timeout.
    pub fn timeout(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::failure(None, stdout, stderr, duration)
        }
    }

    /// Create a result for a command killed by cancellation.
    pub fn cancelled(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            cancelled: true,
            ..Self::failure(None, stdout, stderr, duration)
        }
    }

    /// Last non-empty line of stderr, falling back to stdout.
    ///
    /// Package managers and compilers put the useful diagnostic at the end.
    pub fn diagnostic(&self) -> String {
        let pick = |s: &str| {
            s.lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
        };
        pick(&self.stderr)
            .or_else(|| pick(&self.stdout))
            .unwrap_or_default()
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: BTreeMap<String, String>,

    /// Kill the child after this long (None = no timeout).
    pub timeout: Option<Duration>,

    /// Kill the child when this token is cancelled.
    pub cancel: Option<CancelToken>,
}

impl CommandOptions {
    /// Options with a timeout and cancellation token.
    pub fn bounded(timeout: Duration, cancel: CancelToken) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: Some(cancel),
            ..Default::default()
        }
    }
}

/// Capability to run external programs.
///
/// Package provider adapters and the validator only talk to the outside
/// world through this trait, so tests can substitute a scripted runner.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, returning its captured output.
    ///
    /// Non-zero exits, timeouts and cancellation are reported through the
    /// returned [`CommandResult`]. `Err` means the program could not be
    /// started at all.
    fn run(&self, program: &str, args: &[String], options: &CommandOptions)
        -> Result<CommandResult>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        execute(program, args, options)
    }
}

/// Execute a program directly (no shell), capturing stdout and stderr.
pub fn execute(program: &str, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let cmd_line = display_command(program, args);
    tracing::debug!("Executing: {}", cmd_line);

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    // Own process group, so a kill reaches helpers the child forked
    // (sudo's package manager, the gcc driver's cc1/as/ld).
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn {}: {}", program, e);
        CrosskitError::CommandFailed {
            command: cmd_line.clone(),
            code: None,
        }
    })?;

    // Drain both pipes on their own threads so a chatty child never blocks
    // on a full pipe while we poll it.
    let stdout_rx = child.stdout.take().map(spawn_reader);
    let stderr_rx = child.stderr.take().map(spawn_reader);

    let ending = wait_bounded(&mut child, options, start);

    // A child that exited on its own may have left a background process
    // holding the pipes; bound that wait by what is left of the timeout.
    let deadline = match ending {
        Ending::Exited(_) => options
            .timeout
            .map(|t| Instant::now() + t.saturating_sub(start.elapsed()).max(KILL_DRAIN)),
        _ => Some(Instant::now() + KILL_DRAIN),
    };
    let stdout = collect(stdout_rx, deadline);
    let stderr = collect(stderr_rx, deadline);
    let duration = start.elapsed();

    let result = match ending {
        Ending::Exited(status) if status.success() => {
            CommandResult::success(stdout, stderr, duration)
        }
        Ending::Exited(status) => CommandResult::failure(status.code(), stdout, stderr, duration),
        Ending::TimedOut => {
            tracing::warn!("Command timed out after {:?}: {}", duration, cmd_line);
            CommandResult::timeout(stdout, stderr, duration)
        }
        Ending::Cancelled => {
            tracing::warn!("Command cancelled: {}", cmd_line);
            CommandResult::cancelled(stdout, stderr, duration)
        }
        Ending::WaitFailed => CommandResult::failure(None, stdout, stderr, duration),
    };

    tracing::debug!(
        "Finished in {:?} (exit {:?}): {}",
        result.duration,
        result.exit_code,
        cmd_line
    );

    Ok(result)
}

/// Render a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

enum Ending {
    Exited(std::process::ExitStatus),
    TimedOut,
    Cancelled,
    WaitFailed,
}

fn wait_bounded(child: &mut Child, options: &CommandOptions, start: Instant) -> Ending {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ending::Exited(status),
            Ok(None) => {}
            Err(_) => return Ending::WaitFailed,
        }

        if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            kill(child);
            return Ending::Cancelled;
        }

        if options.timeout.is_some_and(|t| start.elapsed() >= t) {
            kill(child);
            return Ending::TimedOut;
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn kill(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: signals only the process group created for this child.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    rx
}

/// Output of one reader, waiting no later than `deadline` (if any).
fn collect(rx: Option<Receiver<String>>, deadline: Option<Instant>) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    match deadline {
        Some(deadline) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default(),
        None => rx.recv().unwrap_or_default(),
    }
}
