//! In-memory package provider for testing.
//!
//! `InMemoryProvider` keeps a set of installed packages and can be told to
//! fail specific operations, which makes orchestrator behavior (idempotence,
//! rollback order, optional failures) observable without a package manager.
//!
//! # Example
//!
//! ```
//! use crosskit::provider::{InMemoryProvider, InstallStatus, PackageProvider};
//! use crosskit::toolchain::ComponentSpec;
//!
//! let provider = InMemoryProvider::new().fail_install("binutils");
//! let compiler = ComponentSpec::required("compiler", "gcc");
//!
//! assert_eq!(provider.install(&compiler).status, InstallStatus::Installed);
//! assert_eq!(provider.install(&compiler).status, InstallStatus::AlreadyPresent);
//! ```

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::toolchain::ComponentSpec;

use super::outcome::{InstallOutcome, OutcomeAction};
use super::PackageProvider;

/// A package provider that only exists in memory.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    installed: Mutex<BTreeSet<String>>,
    fail_install: HashSet<String>,
    fail_uninstall: HashSet<String>,
    log: Mutex<Vec<String>>,
}

impl InMemoryProvider {
    /// A provider with nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a package as installed before the run.
    pub fn with_installed(self, package: &str) -> Self {
        if let Ok(mut set) = self.installed.lock() {
            set.insert(package.to_string());
        }
        self
    }

    /// Make installing this component fail.
    pub fn fail_install(mut self, component: &str) -> Self {
        self.fail_install.insert(component.to_string());
        self
    }

    /// Make removing this component fail.
    pub fn fail_uninstall(mut self, component: &str) -> Self {
        self.fail_uninstall.insert(component.to_string());
        self
    }

    /// Currently installed packages, sorted.
    pub fn installed_packages(&self) -> Vec<String> {
        self.installed
            .lock()
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Mutating operations in the order they happened (`install:pkg`, `remove:pkg`).
    pub fn log(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn record(&self, entry: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry);
        }
    }

    fn error(component: &ComponentSpec, message: &str) -> ProviderError {
        ProviderError {
            component: component.name.clone(),
            kind: ProviderErrorKind::CommandFailed,
            message: message.to_string(),
        }
    }
}

impl PackageProvider for InMemoryProvider {
    fn id(&self) -> &str {
        "memory"
    }

    fn is_installed(&self, component: &ComponentSpec) -> bool {
        self.installed
            .lock()
            .map(|s| s.contains(&component.package))
            .unwrap_or(false)
    }

    fn install(&self, component: &ComponentSpec) -> InstallOutcome {
        let package = &component.package;
        if self.is_installed(component) {
            return InstallOutcome::already_present(&component.name, package, component.required);
        }
        if self.fail_install.contains(&component.name) {
            return InstallOutcome::failed(
                &component.name,
                package,
                component.required,
                OutcomeAction::Install,
                Self::error(component, "simulated install failure"),
            );
        }
        if let Ok(mut set) = self.installed.lock() {
            set.insert(package.clone());
        }
        self.record(format!("install:{}", package));
        InstallOutcome::installed(&component.name, package, component.required)
    }

    fn uninstall(&self, component: &ComponentSpec) -> InstallOutcome {
        let package = &component.package;
        if !self.is_installed(component) {
            return InstallOutcome::not_attempted(
                &component.name,
                package,
                component.required,
                OutcomeAction::Uninstall,
            );
        }
        if self.fail_uninstall.contains(&component.name) {
            return InstallOutcome::failed(
                &component.name,
                package,
                component.required,
                OutcomeAction::Uninstall,
                Self::error(component, "simulated removal failure"),
            );
        }
        if let Ok(mut set) = self.installed.lock() {
            set.remove(package);
        }
        self.record(format!("remove:{}", package));
        InstallOutcome::removed(&component.name, package, component.required)
    }
}
