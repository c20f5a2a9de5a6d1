//! Package provider capability and its platform adapters.
//!
//! The orchestrator only ever holds a `&dyn PackageProvider`; which package
//! manager sits behind it is decided once, from the detected platform.

pub mod adapter;
pub mod memory;
pub mod outcome;

use std::sync::Arc;

use crate::error::UnsupportedPlatformError;
use crate::platform::PlatformProfile;
use crate::shell::CommandRunner;
use crate::toolchain::ComponentSpec;

pub use adapter::{AdapterKind, PackageCommand, ProviderSettings, SystemAdapter};
pub use memory::InMemoryProvider;
pub use outcome::{InstallOutcome, InstallStatus, OutcomeAction};

/// Uniform interface over a host package manager.
///
/// Implementations never return errors: every failure is captured inside
/// the returned [`InstallOutcome`].
pub trait PackageProvider: Send + Sync {
    /// Short adapter identifier (`apt`, `dnf`, ...).
    fn id(&self) -> &str;

    /// Whether the component's package is currently installed.
    fn is_installed(&self, component: &ComponentSpec) -> bool;

    /// Install the component. Reports `AlreadyPresent` without side effects
    /// when it is installed already.
    fn install(&self, component: &ComponentSpec) -> InstallOutcome;

    /// Remove the component.
    fn uninstall(&self, component: &ComponentSpec) -> InstallOutcome;
}

/// Select the provider for a platform.
pub fn provider_for(
    profile: &PlatformProfile,
    runner: Arc<dyn CommandRunner>,
    settings: ProviderSettings,
) -> Result<Box<dyn PackageProvider>, UnsupportedPlatformError> {
    SystemAdapter::for_profile(profile, runner, settings)
        .map(|a| Box::new(a) as Box<dyn PackageProvider>)
        .ok_or_else(|| UnsupportedPlatformError {
            reason: format!("no package provider for '{}'", profile.family),
        })
}
