//! Run-wide cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag set when the user interrupts a run.
///
/// Cloning shares the flag. The command runner polls it while waiting on a
/// child and the orchestrator checks it between components.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Cancel this token when the process receives Ctrl-C.
    ///
    /// Only one handler can be installed per process.
    pub fn install_interrupt_handler(&self) -> anyhow::Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("Interrupt received, cancelling run");
            token.cancel();
        })?;
        Ok(())
    }
}
