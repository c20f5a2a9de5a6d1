//! Installation orchestration with rollback.
//!
//! The [`Orchestrator`] walks the component list in declaration order,
//! asks the provider to install what is missing, and keeps an [`UndoLog`]
//! of what it installed. A failed required component (or a cancelled run)
//! unwinds that log in reverse before the run ends `Failed`.
//!
//! # Example
//!
//! ```
//! use crosskit::orchestrator::{Orchestrator, RunState};
//! use crosskit::provider::{InMemoryProvider, InstallStatus};
//! use crosskit::shell::CancelToken;
//! use crosskit::toolchain::ComponentSpec;
//!
//! let provider = InMemoryProvider::new();
//! let components = vec![ComponentSpec::required("compiler", "gcc-aarch64-linux-gnu")];
//!
//! let mut orchestrator = Orchestrator::new(&provider, 1, CancelToken::new());
//! assert!(orchestrator.install(&components).is_ok());
//! orchestrator.finish();
//!
//! assert_eq!(orchestrator.state(), RunState::Complete);
//! assert_eq!(orchestrator.outcomes()[0].status, InstallStatus::Installed);
//! ```

pub mod state;
pub mod undo;

use std::thread;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::provider::{InstallOutcome, InstallStatus, OutcomeAction, PackageProvider};
use crate::shell::CancelToken;
use crate::toolchain::ComponentSpec;

pub use state::RunState;
pub use undo::{UndoAction, UndoLog};

/// Why an install phase stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A required component failed to install.
    RequiredFailed { component: String },
    /// The user interrupted the run.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::RequiredFailed { component } => {
                write!(f, "required component '{}' failed to install", component)
            }
            AbortReason::Cancelled => f.write_str("run cancelled"),
        }
    }
}

/// Drives one run's install, rollback and uninstall operations.
pub struct Orchestrator<'a> {
    provider: &'a dyn PackageProvider,
    max_parallel: usize,
    cancel: CancelToken,
    state: RunState,
    history: Vec<RunState>,
    outcomes: Vec<InstallOutcome>,
    undo: UndoLog,
    abort: Option<AbortReason>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator in the `Pending` state.
    ///
    /// `max_parallel` bounds how many independent installs run at once;
    /// `0` is treated as `1`.
    pub fn new(provider: &'a dyn PackageProvider, max_parallel: usize, cancel: CancelToken) -> Self {
        Self {
            provider,
            max_parallel: max_parallel.max(1),
            cancel,
            state: RunState::Pending,
            history: vec![RunState::Pending],
            outcomes: Vec::new(),
            undo: UndoLog::new(),
            abort: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state the run has been in, in order.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Outcome records in the order they were produced.
    pub fn outcomes(&self) -> &[InstallOutcome] {
        &self.outcomes
    }

    /// Why the install phase aborted, if it did.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort.as_ref()
    }

    /// Consume the orchestrator, handing its records to the reporter.
    pub fn into_outcomes(self) -> Vec<InstallOutcome> {
        self.outcomes
    }

    fn transition(&mut self, next: RunState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            // Programming error; keep the run moving but make it visible.
            tracing::error!("Invalid run transition {} -> {}", self.state, next);
        }
        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Install every component, rolling back on a required failure.
    ///
    /// Returns `Ok(())` when the install phase succeeded; the run then stays
    /// in `Installing` until [`validate`](Self::validate) or
    /// [`finish`](Self::finish). On abort the run is already `Failed`.
    pub fn install(&mut self, components: &[ComponentSpec]) -> Result<(), AbortReason> {
        self.transition(RunState::Installing);

        let mut attempted = 0;
        for batch in components.chunks(self.max_parallel) {
            if self.cancel.is_cancelled() {
                self.abort = Some(AbortReason::Cancelled);
                break;
            }

            let results = self.install_batch(batch);
            attempted += batch.len();

            for (spec, outcome) in batch.iter().zip(results) {
                if outcome.status == InstallStatus::Installed {
                    self.undo.record_install(spec);
                }
                if outcome.is_failure() && spec.required && self.abort.is_none() {
                    let cancelled = outcome
                        .error
                        .as_ref()
                        .is_some_and(|e| e.kind == ProviderErrorKind::Cancelled);
                    self.abort = Some(if cancelled {
                        AbortReason::Cancelled
                    } else {
                        AbortReason::RequiredFailed {
                            component: spec.name.clone(),
                        }
                    });
                }
                self.outcomes.push(outcome);
            }

            if self.abort.is_some() {
                break;
            }
        }

        if self.abort.is_none() && self.cancel.is_cancelled() {
            self.abort = Some(AbortReason::Cancelled);
        }

        match self.abort.clone() {
            None => Ok(()),
            Some(reason) => {
                tracing::warn!("Install aborted: {}", reason);
                for spec in &components[attempted.min(components.len())..] {
                    self.outcomes.push(InstallOutcome::not_attempted(
                        &spec.name,
                        &spec.package,
                        spec.required,
                        OutcomeAction::Install,
                    ));
                }
                self.rollback();
                Err(reason)
            }
        }
    }

    /// Install one batch, concurrently when it has more than one member.
    ///
    /// Results come back in the batch's declaration order.
    fn install_batch(&self, batch: &[ComponentSpec]) -> Vec<InstallOutcome> {
        let provider = self.provider;
        if batch.len() == 1 {
            return vec![install_one(provider, &batch[0])];
        }

        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|spec| (spec, scope.spawn(move || install_one(provider, spec))))
                .collect();

            handles
                .into_iter()
                .map(|(spec, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        InstallOutcome::failed(
                            &spec.name,
                            &spec.package,
                            spec.required,
                            OutcomeAction::Install,
                            ProviderError {
                                component: spec.name.clone(),
                                kind: ProviderErrorKind::CommandFailed,
                                message: "install worker panicked".to_string(),
                            },
                        )
                    })
                })
                .collect()
        })
    }

    /// Undo everything this run installed, most recent first.
    ///
    /// Removal failures are recorded and never raised; the run ends `Failed`
    /// either way.
    fn rollback(&mut self) {
        self.transition(RunState::RollingBack);
        if !self.undo.is_empty() {
            tracing::warn!("Rolling back {} component(s)", self.undo.len());
        }

        while let Some(action) = self.undo.pop() {
            match action {
                UndoAction::Uninstall(spec) => {
                    let removal = self.provider.uninstall(&spec);
                    let record = InstallOutcome::rollback_of(&removal);
                    if record.is_failure() {
                        tracing::warn!("Rollback of {} failed", spec.name);
                    } else {
                        tracing::info!("Rolled back {}", spec.name);
                    }
                    self.outcomes.push(record);
                }
            }
        }

        self.transition(RunState::Failed);
    }

    /// Run validation after a successful install phase.
    ///
    /// `passed` decides the final state from the validator's result. A
    /// failed validation ends the run `Failed` but leaves every installed
    /// component in place. An interrupt during validation unwinds the
    /// install instead.
    pub fn validate<T>(&mut self, run: impl FnOnce() -> T, passed: impl Fn(&T) -> bool) -> T {
        self.transition(RunState::Validating);
        let result = run();
        if self.cancel_rollback() {
            return result;
        }
        if passed(&result) {
            self.transition(RunState::Complete);
        } else {
            self.transition(RunState::Failed);
        }
        result
    }

    /// Unwind this run's installs if the run was interrupted.
    ///
    /// Only acts between a successful install phase and the end of the run.
    /// Returns `true` when a rollback happened.
    pub fn cancel_rollback(&mut self) -> bool {
        let live = matches!(self.state, RunState::Installing | RunState::Validating);
        if !live || !self.cancel.is_cancelled() {
            return false;
        }
        tracing::warn!("Run interrupted after install; rolling back");
        self.abort = Some(AbortReason::Cancelled);
        self.rollback();
        true
    }

    /// End a successful run without validation.
    pub fn finish(&mut self) {
        if !self.state.is_terminal() {
            self.transition(RunState::Complete);
        }
    }

    /// Remove components in reverse declaration order.
    ///
    /// Components that are not installed are recorded as `NotAttempted`.
    /// Returns `true` when nothing failed.
    pub fn uninstall(&mut self, components: &[ComponentSpec]) -> bool {
        self.transition(RunState::Uninstalling);

        let mut ok = true;
        for spec in components.iter().rev() {
            if self.cancel.is_cancelled() {
                self.outcomes.push(InstallOutcome::not_attempted(
                    &spec.name,
                    &spec.package,
                    spec.required,
                    OutcomeAction::Uninstall,
                ));
                ok = false;
                continue;
            }

            let outcome = self.provider.uninstall(spec);
            if outcome.is_failure() {
                ok = false;
            }
            self.outcomes.push(outcome);
        }

        if self.cancel.is_cancelled() {
            self.abort = Some(AbortReason::Cancelled);
        }
        self.transition(if ok {
            RunState::Complete
        } else {
            RunState::Failed
        });
        ok
    }
}

fn install_one(provider: &dyn PackageProvider, spec: &ComponentSpec) -> InstallOutcome {
    if provider.is_installed(spec) {
        tracing::debug!("{} already installed, skipping", spec.name);
        return InstallOutcome::already_present(&spec.name, &spec.package, spec.required);
    }
    provider.install(spec)
}
