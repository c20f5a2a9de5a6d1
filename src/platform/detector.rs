//! Host platform detection.
//!
//! Detection is read-only: it looks for package manager executables on PATH
//! and reads OS identification files. Nothing is installed or modified.
//!
//! # Tie-break order
//!
//! Hosts sometimes carry more than one package manager (an Arch box with
//! `apt-get` from a compatibility package, a Debian container with `dnf`
//! installed for testing). The first family in [`DETECTION_ORDER`] whose
//! package manager is present wins:
//!
//! 1. Debian family (`apt-get`)
//! 2. Fedora family (`dnf`)
//! 3. Arch family (`pacman`)
//! 4. Generic fallback: Homebrew (`brew`), mapped to the macOS family
//!
//! The order follows relative popularity among supported distributions.
//! On a macOS host only Homebrew is considered.
//!
//! OS identification files (`/etc/debian_version`, `/etc/os-release`, ...)
//! never change which family wins. When no package manager is on PATH they
//! name the distribution and the missing tool in the error.

use std::fs;
use std::path::Path;

use crate::error::UnsupportedPlatformError;
use crate::shell::which;

use super::profile::{PlatformFamily, PlatformProfile};

/// A candidate family and the evidence that identifies it.
#[derive(Debug, Clone, Copy)]
pub struct FamilyProbe {
    pub family: PlatformFamily,
    /// Package manager executable that must be on PATH.
    pub command: &'static str,
    /// OS identification files that name the family.
    pub marker_files: &'static [&'static str],
}

/// Families checked on Linux hosts, in tie-break order.
pub const DETECTION_ORDER: [FamilyProbe; 3] = [
    FamilyProbe {
        family: PlatformFamily::Debian,
        command: "apt-get",
        marker_files: &["/etc/debian_version"],
    },
    FamilyProbe {
        family: PlatformFamily::Fedora,
        command: "dnf",
        marker_files: &["/etc/fedora-release", "/etc/redhat-release"],
    },
    FamilyProbe {
        family: PlatformFamily::Arch,
        command: "pacman",
        marker_files: &["/etc/arch-release"],
    },
];

/// Generic fallback when no distribution package manager is present.
pub const FALLBACK: FamilyProbe = FamilyProbe {
    family: PlatformFamily::Macos,
    command: "brew",
    marker_files: &[],
};

/// Read-only view of the host used by detection.
pub trait HostProbe {
    /// Operating system name as in `std::env::consts::OS`.
    fn os(&self) -> &str;

    /// Whether an executable is available on PATH.
    fn has_command(&self, name: &str) -> bool;

    /// Contents of a file, if it exists and is readable.
    fn read_file(&self, path: &Path) -> Option<String>;
}

/// Probes the real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn os(&self) -> &str {
        std::env::consts::OS
    }

    fn has_command(&self, name: &str) -> bool {
        which(name).is_some()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }
}

/// Fixed host description for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    os: String,
    commands: Vec<String>,
    files: Vec<(String, String)>,
}

impl StaticHost {
    /// A host running the given OS with nothing installed.
    pub fn new(os: &str) -> Self {
        Self {
            os: os.to_string(),
            ..Default::default()
        }
    }

    /// Add an executable to PATH.
    pub fn with_command(mut self, name: &str) -> Self {
        self.commands.push(name.to_string());
        self
    }

    /// Add a readable file.
    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((path.to_string(), contents.to_string()));
        self
    }
}

impl HostProbe for StaticHost {
    fn os(&self) -> &str {
        &self.os
    }

    fn has_command(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c == name)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        self.files
            .iter()
            .find(|(p, _)| Path::new(p) == path)
            .map(|(_, c)| c.clone())
    }
}

/// Detect the host platform.
///
/// # Errors
///
/// Returns [`UnsupportedPlatformError`] when no known family is recognized.
/// This is terminal for the run.
pub fn detect(host: &dyn HostProbe) -> Result<PlatformProfile, UnsupportedPlatformError> {
    let os_id = os_release_field(host, "ID");

    if host.os() == "macos" {
        return if host.has_command(FALLBACK.command) {
            tracing::debug!("Detected macOS host with Homebrew");
            PlatformProfile::for_family(PlatformFamily::Macos)
        } else {
            Err(UnsupportedPlatformError {
                reason: "macOS host without Homebrew (brew not found on PATH)".to_string(),
            })
        };
    }

    if host.os() != "linux" {
        return Err(UnsupportedPlatformError {
            reason: format!("host OS '{}' is not supported", host.os()),
        });
    }

    let present: Vec<&FamilyProbe> = DETECTION_ORDER
        .iter()
        .filter(|probe| host.has_command(probe.command))
        .collect();

    if present.len() > 1 {
        let names: Vec<&str> = present.iter().map(|p| p.command).collect();
        tracing::debug!(
            "Multiple package managers present ({}), choosing {} by tie-break order",
            names.join(", "),
            present[0].family
        );
    }

    if let Some(probe) = present.first() {
        return Ok(PlatformProfile::for_family(probe.family)?.with_os_id(os_id));
    }

    if host.has_command(FALLBACK.command) {
        tracing::debug!("No distribution package manager; falling back to Homebrew");
        return Ok(PlatformProfile::for_family(FALLBACK.family)?.with_os_id(os_id));
    }

    let reason = match (identify(host), os_id) {
        (Some((probe, evidence)), _) => format!(
            "{} host (identified by {}) but {} is not on PATH",
            probe.family, evidence, probe.command
        ),
        (None, Some(id)) => format!("no supported package manager found on '{}'", id),
        (None, None) => "no supported package manager found".to_string(),
    };
    Err(UnsupportedPlatformError { reason })
}

/// First family in tie-break order that the identification files name,
/// with the file that named it.
fn identify(host: &dyn HostProbe) -> Option<(&'static FamilyProbe, &'static str)> {
    DETECTION_ORDER.iter().find_map(|probe| {
        let marker = probe
            .marker_files
            .iter()
            .find(|f| host.read_file(Path::new(f)).is_some())
            .copied();
        marker
            .or_else(|| os_release_matches(host, probe.family).then_some("/etc/os-release"))
            .map(|evidence| (probe, evidence))
    })
}

/// Resolve the platform, honoring an explicit override.
pub fn resolve(
    host: &dyn HostProbe,
    platform_override: Option<PlatformFamily>,
) -> Result<PlatformProfile, UnsupportedPlatformError> {
    match platform_override {
        Some(family) => {
            tracing::debug!("Platform overridden to {}", family);
            PlatformProfile::for_family(family)
        }
        None => detect(host),
    }
}

/// Read a field from `/etc/os-release`, unquoted.
fn os_release_field(host: &dyn HostProbe, key: &str) -> Option<String> {
    let contents = host
        .read_file(Path::new("/etc/os-release"))
        .or_else(|| host.read_file(Path::new("/usr/lib/os-release")))?;
    contents.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

fn os_release_matches(host: &dyn HostProbe, family: PlatformFamily) -> bool {
    let ids: Vec<String> = ["ID", "ID_LIKE"]
        .iter()
        .filter_map(|k| os_release_field(host, k))
        .flat_map(|v| {
            v.split_whitespace()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    ids.iter()
        .any(|id| id.parse::<PlatformFamily>().ok() == Some(family))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_debian() {
        let host = StaticHost::new("linux")
            .with_command("apt-get")
            .with_file("/etc/debian_version", "12.5")
            .with_file("/etc/os-release", "ID=debian\n");

        let profile = detect(&host).unwrap();

        assert_eq!(profile.family, PlatformFamily::Debian);
        assert_eq!(profile.provider_id, "apt");
        assert_eq!(profile.os_id.as_deref(), Some("debian"));
    }

    #[test]
    fn detect_fedora() {
        let host = StaticHost::new("linux").with_command("dnf");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Fedora);
    }

    #[test]
    fn detect_arch() {
        let host = StaticHost::new("linux")
            .with_command("pacman")
            .with_file("/etc/os-release", "ID=arch\n");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Arch);
    }

    #[test]
    fn debian_wins_over_arch() {
        let host = StaticHost::new("linux")
            .with_command("pacman")
            .with_command("apt-get")
            .with_file("/etc/os-release", "ID=arch\n");

        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Debian);
    }

    #[test]
    fn fedora_wins_over_arch() {
        let host = StaticHost::new("linux")
            .with_command("pacman")
            .with_command("dnf");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Fedora);
    }

    #[test]
    fn distribution_manager_wins_over_linuxbrew() {
        let host = StaticHost::new("linux")
            .with_command("brew")
            .with_command("dnf");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Fedora);
    }

    #[test]
    fn linuxbrew_is_the_fallback() {
        let host = StaticHost::new("linux").with_command("brew");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Macos);
    }

    #[test]
    fn detect_macos_with_brew() {
        let host = StaticHost::new("macos")
            .with_command("brew")
            .with_command("apt-get");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Macos);
    }

    #[test]
    fn macos_without_brew_is_unsupported() {
        let host = StaticHost::new("macos");
        let err = detect(&host).unwrap_err();
        assert!(err.reason.contains("Homebrew"));
    }

    #[test]
    fn no_manager_is_unsupported() {
        let host = StaticHost::new("linux").with_file("/etc/os-release", "ID=alpine\n");
        let err = detect(&host).unwrap_err();
        assert!(err.reason.contains("alpine"));
    }

    #[test]
    fn identified_distribution_without_its_manager_names_the_tool() {
        let host = StaticHost::new("linux").with_file("/etc/fedora-release", "Fedora release 40");
        let err = detect(&host).unwrap_err();
        assert_eq!(
            err.reason,
            "fedora host (identified by /etc/fedora-release) but dnf is not on PATH"
        );
    }

    #[test]
    fn os_release_id_like_identifies_family() {
        let host = StaticHost::new("linux")
            .with_file("/etc/os-release", "ID=ubuntu\nID_LIKE=debian\n");
        let err = detect(&host).unwrap_err();
        assert!(err.reason.contains("identified by /etc/os-release"));
        assert!(err.reason.contains("apt-get"));
    }

    #[test]
    fn identification_files_do_not_override_tie_break() {
        let host = StaticHost::new("linux")
            .with_command("apt-get")
            .with_command("pacman")
            .with_file("/etc/arch-release", "");
        assert_eq!(detect(&host).unwrap().family, PlatformFamily::Debian);
    }

    #[test]
    fn windows_is_unsupported() {
        let host = StaticHost::new("windows").with_command("winget");
        assert!(detect(&host).is_err());
    }

    #[test]
    fn detection_is_deterministic() {
        let host = StaticHost::new("linux")
            .with_command("pacman")
            .with_command("dnf")
            .with_command("apt-get");
        assert_eq!(detect(&host).unwrap(), detect(&host).unwrap());
    }

    #[test]
    fn override_skips_probing() {
        let host = StaticHost::new("linux");
        let profile = resolve(&host, Some(PlatformFamily::Arch)).unwrap();
        assert_eq!(profile.provider_id, "pacman");
    }

    #[test]
    fn unsupported_override_fails() {
        let host = StaticHost::new("linux").with_command("apt-get");
        assert!(resolve(&host, Some(PlatformFamily::Unsupported)).is_err());
    }

    #[test]
    fn os_release_values_are_unquoted() {
        let host = StaticHost::new("linux")
            .with_file("/etc/os-release", "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n");
        assert_eq!(os_release_field(&host, "NAME").as_deref(), Some("Ubuntu"));
        assert!(os_release_matches(&host, PlatformFamily::Debian));
    }
}
