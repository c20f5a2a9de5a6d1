//! Package manager adapters.
//!
//! Every supported family is one variant of [`AdapterKind`]. A variant only
//! contributes its command table; query, install and remove handling is the
//! same for all of them, which keeps callers free of family branches.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::platform::{PlatformFamily, PlatformProfile};
use crate::shell::{display_command, CancelToken, CommandOptions, CommandResult, CommandRunner};
use crate::toolchain::ComponentSpec;

use super::outcome::{InstallOutcome, OutcomeAction};
use super::PackageProvider;

/// The closed set of package managers crosskit drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Apt,
    Dnf,
    Pacman,
    Homebrew,
}

/// Argument vectors for one package operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl AdapterKind {
    /// Adapter for a platform family.
    pub fn for_family(family: PlatformFamily) -> Option<Self> {
        match family {
            PlatformFamily::Debian => Some(AdapterKind::Apt),
            PlatformFamily::Fedora => Some(AdapterKind::Dnf),
            PlatformFamily::Arch => Some(AdapterKind::Pacman),
            PlatformFamily::Macos => Some(AdapterKind::Homebrew),
            PlatformFamily::Unsupported => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            AdapterKind::Apt => "apt",
            AdapterKind::Dnf => "dnf",
            AdapterKind::Pacman => "pacman",
            AdapterKind::Homebrew => "brew",
        }
    }

    pub fn family(&self) -> PlatformFamily {
        match self {
            AdapterKind::Apt => PlatformFamily::Debian,
            AdapterKind::Dnf => PlatformFamily::Fedora,
            AdapterKind::Pacman => PlatformFamily::Arch,
            AdapterKind::Homebrew => PlatformFamily::Macos,
        }
    }

    /// Whether install and remove need root.
    pub fn needs_root(&self) -> bool {
        !matches!(self, AdapterKind::Homebrew)
    }

    /// Command that exits zero iff the package is installed.
    pub fn query(&self, package: &str) -> PackageCommand {
        let (program, args): (&'static str, &[&str]) = match self {
            AdapterKind::Apt => ("dpkg-query", &["-W", "-f=${Status}"]),
            AdapterKind::Dnf => ("rpm", &["-q"]),
            AdapterKind::Pacman => ("pacman", &["-Q"]),
            AdapterKind::Homebrew => ("brew", &["list", "--versions"]),
        };
        command(program, args, package)
    }

    pub fn install(&self, package: &str) -> PackageCommand {
        let (program, args): (&'static str, &[&str]) = match self {
            AdapterKind::Apt => ("apt-get", &["install", "-y", "--no-install-recommends"]),
            AdapterKind::Dnf => ("dnf", &["install", "-y"]),
            AdapterKind::Pacman => ("pacman", &["-S", "--noconfirm", "--needed"]),
            AdapterKind::Homebrew => ("brew", &["install"]),
        };
        command(program, args, package)
    }

    pub fn remove(&self, package: &str) -> PackageCommand {
        let (program, args): (&'static str, &[&str]) = match self {
            AdapterKind::Apt => ("apt-get", &["remove", "-y"]),
            AdapterKind::Dnf => ("dnf", &["remove", "-y"]),
            AdapterKind::Pacman => ("pacman", &["-R", "--noconfirm"]),
            AdapterKind::Homebrew => ("brew", &["uninstall"]),
        };
        command(program, args, package)
    }

    /// Interpret a successful query's output.
    ///
    /// `dpkg-query` exits zero for removed-but-configured packages, and
    /// `brew list --versions` exits zero with empty output for unknown ones.
    fn query_confirms(&self, result: &CommandResult) -> bool {
        if !result.success {
            return false;
        }
        match self {
            AdapterKind::Apt => result.stdout.contains("install ok installed"),
            AdapterKind::Homebrew => !result.stdout.trim().is_empty(),
            AdapterKind::Dnf | AdapterKind::Pacman => true,
        }
    }

    /// Environment needed to keep the package manager non-interactive.
    fn env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        match self {
            AdapterKind::Apt => {
                env.insert("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string());
            }
            AdapterKind::Homebrew => {
                env.insert("HOMEBREW_NO_AUTO_UPDATE".to_string(), "1".to_string());
            }
            AdapterKind::Dnf | AdapterKind::Pacman => {}
        }
        env
    }
}

fn command(program: &'static str, args: &[&str], package: &str) -> PackageCommand {
    let mut args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    args.push(package.to_string());
    PackageCommand { program, args }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Query,
    Install,
    Remove,
}

/// Knobs shared by every adapter call in a run.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Upper bound for one install or remove.
    pub timeout: Duration,

    /// Upper bound for one installed-query.
    pub query_timeout: Duration,

    /// Prefix privileged commands with `sudo -n`.
    pub use_sudo: bool,

    pub cancel: CancelToken,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(900),
            query_timeout: Duration::from_secs(30),
            use_sudo: false,
            cancel: CancelToken::new(),
        }
    }
}

/// A package provider backed by a host package manager.
///
/// Installs and removals take `db_lock`, so concurrent workers never race
/// for the dpkg/rpm/pacman database. Queries stay unlocked.
pub struct SystemAdapter {
    kind: AdapterKind,
    runner: Arc<dyn CommandRunner>,
    settings: ProviderSettings,
    db_lock: Mutex<()>,
}

impl SystemAdapter {
    pub fn new(
        kind: AdapterKind,
        runner: Arc<dyn CommandRunner>,
        settings: ProviderSettings,
    ) -> Self {
        Self {
            kind,
            runner,
            settings,
            db_lock: Mutex::new(()),
        }
    }

    /// Adapter for a detected platform.
    pub fn for_profile(
        profile: &PlatformProfile,
        runner: Arc<dyn CommandRunner>,
        settings: ProviderSettings,
    ) -> Option<Self> {
        AdapterKind::for_family(profile.family).map(|kind| Self::new(kind, runner, settings))
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// A panicked worker leaves no database state behind, so a poisoned
    /// lock is still usable.
    fn lock_db(&self) -> MutexGuard<'_, ()> {
        self.db_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn package<'a>(&self, component: &'a ComponentSpec) -> &'a str {
        component.package_for(self.kind.family())
    }

    /// Run a package command, elevating through sudo when configured.
    ///
    /// Only installs observe the cancel token. Queries and removals must
    /// still work while a cancelled run rolls back, so they are bounded by
    /// their timeout alone.
    fn run(&self, cmd: &PackageCommand, op: Operation) -> crate::error::Result<CommandResult> {
        let env = self.kind.env();
        let (timeout, cancel) = match op {
            Operation::Query => (self.settings.query_timeout, None),
            Operation::Install => (self.settings.timeout, Some(self.settings.cancel.clone())),
            Operation::Remove => (self.settings.timeout, None),
        };
        let options = CommandOptions {
            env: env.clone(),
            timeout: Some(timeout),
            cancel,
            ..Default::default()
        };

        let privileged = op != Operation::Query;
        if privileged && self.settings.use_sudo && self.kind.needs_root() {
            let mut args = vec!["-n".to_string()];
            if !env.is_empty() {
                let keys: Vec<&str> = env.keys().map(String::as_str).collect();
                args.push(format!("--preserve-env={}", keys.join(",")));
            }
            args.push(cmd.program.to_string());
            args.extend(cmd.args.iter().cloned());
            self.runner.run("sudo", &args, &options)
        } else {
            self.runner.run(cmd.program, &cmd.args, &options)
        }
    }

    /// Turn a package manager invocation into an error record, if it failed.
    fn check(
        &self,
        component: &ComponentSpec,
        cmd: &PackageCommand,
        result: crate::error::Result<CommandResult>,
    ) -> Option<ProviderError> {
        let line = display_command(cmd.program, &cmd.args);
        let (kind, message) = match result {
            Ok(r) if r.success => return None,
            Ok(r) if r.timed_out => (
                ProviderErrorKind::Timeout,
                format!("{} timed out after {}s", line, self.settings.timeout.as_secs()),
            ),
            Ok(r) if r.cancelled => (
                ProviderErrorKind::Cancelled,
                format!("{} was cancelled", line),
            ),
            Ok(r) => {
                let code = r
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let diagnostic = r.diagnostic();
                let message = if diagnostic.is_empty() {
                    format!("{} exited with code {}", line, code)
                } else {
                    format!("{} exited with code {}: {}", line, code, diagnostic)
                };
                (ProviderErrorKind::CommandFailed, message)
            }
            Err(e) => (ProviderErrorKind::Spawn, e.to_string()),
        };

        Some(ProviderError {
            component: component.name.clone(),
            kind,
            message,
        })
    }
}

impl PackageProvider for SystemAdapter {
    fn id(&self) -> &str {
        self.kind.id()
    }

    fn is_installed(&self, component: &ComponentSpec) -> bool {
        let cmd = self.kind.query(self.package(component));
        match self.run(&cmd, Operation::Query) {
            Ok(result) => self.kind.query_confirms(&result),
            Err(e) => {
                tracing::debug!("Query for {} failed: {}", component.name, e);
                false
            }
        }
    }

    fn install(&self, component: &ComponentSpec) -> InstallOutcome {
        let package = self.package(component);
        // Held across the re-query so two components sharing a package
        // install it once.
        let _db = self.lock_db();

        if self.is_installed(component) {
            tracing::debug!("{} ({}) already installed", component.name, package);
            return InstallOutcome::already_present(&component.name, package, component.required);
        }

        let cmd = self.kind.install(package);
        let result = self.run(&cmd, Operation::Install);
        match self.check(component, &cmd, result) {
            None => {
                tracing::info!("Installed {} ({})", component.name, package);
                InstallOutcome::installed(&component.name, package, component.required)
            }
            Some(error) => {
                tracing::warn!("Install of {} failed: {}", component.name, error.message);
                InstallOutcome::failed(
                    &component.name,
                    package,
                    component.required,
                    OutcomeAction::Install,
                    error,
                )
            }
        }
    }

    fn uninstall(&self, component: &ComponentSpec) -> InstallOutcome {
        let package = self.package(component);
        let _db = self.lock_db();

        if !self.is_installed(component) {
            return InstallOutcome::not_attempted(
                &component.name,
                package,
                component.required,
                OutcomeAction::Uninstall,
            );
        }

        let cmd = self.kind.remove(package);
        let result = self.run(&cmd, Operation::Remove);
        match self.check(component, &cmd, result) {
            None => {
                tracing::info!("Removed {} ({})", component.name, package);
                InstallOutcome::removed(&component.name, package, component.required)
            }
            Some(error) => {
                tracing::warn!("Removal of {} failed: {}", component.name, error.message);
                InstallOutcome::failed(
                    &component.name,
                    package,
                    component.required,
                    OutcomeAction::Uninstall,
                    error,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Orchestrator;
    use crate::provider::InstallStatus;
    use crate::shell::{MockResponse, MockRunner};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn compiler() -> ComponentSpec {
        ComponentSpec::required("compiler", "gcc-aarch64-linux-gnu")
            .with_override(PlatformFamily::Arch, "aarch64-linux-gnu-gcc")
    }

    fn adapter(kind: AdapterKind, runner: MockRunner) -> (SystemAdapter, Arc<MockRunner>) {
        let runner = Arc::new(runner);
        let adapter = SystemAdapter::new(kind, runner.clone(), ProviderSettings::default());
        (adapter, runner)
    }

    #[test]
    fn apt_install_when_missing() {
        let (adapter, runner) = adapter(
            AdapterKind::Apt,
            MockRunner::new().on("dpkg-query", MockResponse::fail(1, "no packages found")),
        );

        let outcome = adapter.install(&compiler());

        assert_eq!(outcome.status, InstallStatus::Installed);
        assert_eq!(outcome.package, "gcc-aarch64-linux-gnu");
        assert_eq!(
            runner.calls_matching("apt-get"),
            vec!["apt-get install -y --no-install-recommends gcc-aarch64-linux-gnu".to_string()]
        );
    }

    #[test]
    fn install_already_present_runs_no_installer() {
        let (adapter, runner) = adapter(
            AdapterKind::Apt,
            MockRunner::new().on("dpkg-query", MockResponse::ok("install ok installed")),
        );

        let outcome = adapter.install(&compiler());

        assert_eq!(outcome.status, InstallStatus::AlreadyPresent);
        assert!(runner.calls_matching("apt-get").is_empty());
    }

    #[test]
    fn apt_deinstalled_status_is_not_installed() {
        let (adapter, _) = adapter(
            AdapterKind::Apt,
            MockRunner::new().on("dpkg-query", MockResponse::ok("deinstall ok config-files")),
        );
        assert!(!adapter.is_installed(&compiler()));
    }

    #[test]
    fn pacman_uses_family_override() {
        let (adapter, runner) = adapter(
            AdapterKind::Pacman,
            MockRunner::new().on("pacman -Q", MockResponse::fail(1, "not found")),
        );

        adapter.install(&compiler());

        assert_eq!(
            runner.calls_matching("pacman -S"),
            vec!["pacman -S --noconfirm --needed aarch64-linux-gnu-gcc".to_string()]
        );
    }

    #[test]
    fn install_failure_becomes_provider_error() {
        let (adapter, _) = adapter(
            AdapterKind::Dnf,
            MockRunner::new()
                .on("rpm -q", MockResponse::fail(1, "not installed"))
                .on("dnf install", MockResponse::fail(1, "Error: Unable to find a match")),
        );

        let outcome = adapter.install(&compiler());

        assert_eq!(outcome.status, InstallStatus::Failed);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, ProviderErrorKind::CommandFailed);
        assert_eq!(error.component, "compiler");
        assert!(error.message.contains("Unable to find a match"));
    }

    #[test]
    fn install_timeout_becomes_provider_error() {
        let (adapter, _) = adapter(
            AdapterKind::Apt,
            MockRunner::new()
                .on("dpkg-query", MockResponse::fail(1, ""))
                .on("apt-get install", MockResponse::Timeout),
        );

        let outcome = adapter.install(&compiler());

        assert_eq!(outcome.error.unwrap().kind, ProviderErrorKind::Timeout);
    }

    #[test]
    fn missing_package_manager_becomes_spawn_error() {
        let (adapter, _) = adapter(
            AdapterKind::Homebrew,
            MockRunner::new().on("brew", MockResponse::SpawnError),
        );

        let outcome = adapter.install(&compiler());

        assert_eq!(outcome.status, InstallStatus::Failed);
        assert_eq!(outcome.error.unwrap().kind, ProviderErrorKind::Spawn);
    }

    #[test]
    fn homebrew_empty_listing_is_not_installed() {
        let (adapter, _) = adapter(
            AdapterKind::Homebrew,
            MockRunner::new().on("brew list", MockResponse::ok("")),
        );
        assert!(!adapter.is_installed(&compiler()));
    }

    #[test]
    fn uninstall_not_installed_is_not_attempted() {
        let (adapter, runner) = adapter(
            AdapterKind::Dnf,
            MockRunner::new().on("rpm -q", MockResponse::fail(1, "")),
        );

        let outcome = adapter.uninstall(&compiler());

        assert_eq!(outcome.status, InstallStatus::NotAttempted);
        assert!(runner.calls_matching("dnf remove").is_empty());
    }

    #[test]
    fn uninstall_installed_package() {
        let (adapter, runner) = adapter(AdapterKind::Pacman, MockRunner::new());

        let outcome = adapter.uninstall(&compiler());

        assert_eq!(outcome.status, InstallStatus::Removed);
        assert_eq!(
            runner.calls_matching("pacman -R"),
            vec!["pacman -R --noconfirm aarch64-linux-gnu-gcc".to_string()]
        );
    }

    #[test]
    fn sudo_prefix_when_enabled() {
        let runner = Arc::new(MockRunner::new().on("dpkg-query", MockResponse::fail(1, "")));
        let settings = ProviderSettings {
            use_sudo: true,
            ..Default::default()
        };
        let adapter = SystemAdapter::new(AdapterKind::Apt, runner.clone(), settings);

        adapter.install(&compiler());

        assert_eq!(
            runner.calls_matching("sudo"),
            vec![
                "sudo -n --preserve-env=DEBIAN_FRONTEND apt-get install -y --no-install-recommends gcc-aarch64-linux-gnu"
                    .to_string()
            ]
        );
        // Queries never need root.
        assert_eq!(runner.calls_matching("dpkg-query").len(), 1);
    }

    #[test]
    fn homebrew_never_uses_sudo() {
        let runner = Arc::new(MockRunner::new().on("brew list", MockResponse::ok("")));
        let settings = ProviderSettings {
            use_sudo: true,
            ..Default::default()
        };
        let adapter = SystemAdapter::new(AdapterKind::Homebrew, runner.clone(), settings);

        adapter.install(&compiler());

        assert!(runner.calls_matching("sudo").is_empty());
        assert_eq!(runner.calls_matching("brew install").len(), 1);
    }

    /// Stateful pacman stand-in that records how many installs overlap.
    #[derive(Default)]
    struct PacmanDb {
        installed: Mutex<std::collections::BTreeSet<String>>,
        active: AtomicUsize,
        peak: AtomicUsize,
        installs: AtomicUsize,
    }

    impl CommandRunner for PacmanDb {
        fn run(
            &self,
            _program: &str,
            args: &[String],
            _options: &CommandOptions,
        ) -> crate::error::Result<CommandResult> {
            let package = args.last().cloned().unwrap_or_default();
            let done = || CommandResult::success(String::new(), String::new(), Duration::ZERO);
            match args.first().map(String::as_str) {
                Some("-Q") if self.installed.lock().unwrap().contains(&package) => Ok(done()),
                Some("-Q") => Ok(CommandResult::failure(
                    Some(1),
                    String::new(),
                    format!("error: package '{}' was not found", package),
                    Duration::ZERO,
                )),
                Some("-S") => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    self.peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(25));
                    self.installed.lock().unwrap().insert(package);
                    self.installs.fetch_add(1, Ordering::SeqCst);
                    self.active.fetch_sub(1, Ordering::SeqCst);
                    Ok(done())
                }
                _ => Ok(done()),
            }
        }
    }

    #[test]
    fn parallel_installs_take_turns_on_the_package_database() {
        let db = Arc::new(PacmanDb::default());
        let adapter = SystemAdapter::new(AdapterKind::Pacman, db.clone(), ProviderSettings::default());
        let components = vec![
            ComponentSpec::required("compiler", "aarch64-linux-gnu-gcc"),
            ComponentSpec::required("cxx-compiler", "aarch64-linux-gnu-gcc"),
            ComponentSpec::required("binutils", "aarch64-linux-gnu-binutils"),
            ComponentSpec::required("headers", "aarch64-linux-gnu-glibc"),
        ];
        let mut orchestrator = Orchestrator::new(&adapter, 4, CancelToken::new());

        assert!(orchestrator.install(&components).is_ok());

        assert_eq!(db.peak.load(Ordering::SeqCst), 1);
        // The shared gcc package is installed once.
        assert_eq!(db.installs.load(Ordering::SeqCst), 3);
        let count = |status: InstallStatus| {
            orchestrator
                .outcomes()
                .iter()
                .filter(|o| o.status == status)
                .count()
        };
        assert_eq!(count(InstallStatus::Installed), 3);
        assert_eq!(count(InstallStatus::AlreadyPresent), 1);
    }

    #[test]
    fn for_profile_selects_adapter() {
        let profile = PlatformProfile::for_family(PlatformFamily::Fedora).unwrap();
        let adapter = SystemAdapter::for_profile(
            &profile,
            Arc::new(MockRunner::new()),
            ProviderSettings::default(),
        )
        .unwrap();
        assert_eq!(adapter.id(), "dnf");
    }
}
