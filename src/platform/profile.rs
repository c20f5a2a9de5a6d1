//! Platform family and profile types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedPlatformError;

/// Host distribution family, which decides the package provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Debian,
    Fedora,
    Macos,
    Arch,
    Unsupported,
}

impl PlatformFamily {
    /// Every family that has a package provider.
    pub const SUPPORTED: [PlatformFamily; 4] = [
        PlatformFamily::Debian,
        PlatformFamily::Fedora,
        PlatformFamily::Arch,
        PlatformFamily::Macos,
    ];

    /// Lowercase name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::Fedora => "fedora",
            PlatformFamily::Macos => "macos",
            PlatformFamily::Arch => "arch",
            PlatformFamily::Unsupported => "unsupported",
        }
    }

    /// Identifier of the package provider adapter for this family.
    pub fn provider_id(&self) -> Option<&'static str> {
        match self {
            PlatformFamily::Debian => Some("apt"),
            PlatformFamily::Fedora => Some("dnf"),
            PlatformFamily::Arch => Some("pacman"),
            PlatformFamily::Macos => Some("brew"),
            PlatformFamily::Unsupported => None,
        }
    }

    /// Directories where this family's packages put cross tools.
    pub fn default_path_hints(&self) -> Vec<PathBuf> {
        match self {
            PlatformFamily::Debian | PlatformFamily::Fedora | PlatformFamily::Arch => {
                vec![PathBuf::from("/usr/bin")]
            }
            PlatformFamily::Macos => vec![
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/usr/local/bin"),
            ],
            PlatformFamily::Unsupported => Vec::new(),
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debian" | "ubuntu" | "apt" => Ok(Self::Debian),
            "fedora" | "rhel" | "dnf" => Ok(Self::Fedora),
            "macos" | "darwin" | "brew" | "homebrew" => Ok(Self::Macos),
            "arch" | "archlinux" | "pacman" => Ok(Self::Arch),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(format!("unknown platform family: {}", s)),
        }
    }
}

/// What the detector learned about the host. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Distribution family.
    pub family: PlatformFamily,

    /// Package provider adapter identifier (apt, dnf, pacman, brew).
    pub provider_id: String,

    /// Directories where installed cross tools are expected.
    pub path_hints: Vec<PathBuf>,

    /// `ID` from os-release, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_id: Option<String>,
}

impl PlatformProfile {
    /// Build a profile for an explicitly chosen family.
    pub fn for_family(family: PlatformFamily) -> Result<Self, UnsupportedPlatformError> {
        let provider_id = family.provider_id().ok_or_else(|| UnsupportedPlatformError {
            reason: format!("'{}' has no package provider", family),
        })?;

        Ok(Self {
            family,
            provider_id: provider_id.to_string(),
            path_hints: family.default_path_hints(),
            os_id: None,
        })
    }

    /// Attach the os-release identifier.
    pub fn with_os_id(mut self, os_id: Option<String>) -> Self {
        self.os_id = os_id;
        self
    }
}
