//! The canonical toolchain descriptor.
//!
//! [`ToolchainDescriptor`] is the single source of truth for a provisioned
//! toolchain. Every generated build-system file is a pure projection of it,
//! and it is persisted as `toolchain.json` next to those files so later
//! commands (`validate`) work from exactly the same values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CrosskitError, Result};
use crate::platform::{PlatformFamily, PlatformProfile};

use super::triple::TargetTriple;

/// File name of the persisted descriptor.
pub const DESCRIPTOR_FILE: &str = "toolchain.json";

/// Paths of the cross tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerPaths {
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ar: PathBuf,
    pub ranlib: PathBuf,
    pub strip: PathBuf,
}

impl CompilerPaths {
    /// Tools named `<prefix>-gcc`, `<prefix>-g++`, ... inside `bin_dir`.
    pub fn gnu(bin_dir: &Path, prefix: &str) -> Self {
        let tool = |name: &str| bin_dir.join(format!("{}-{}", prefix, name));
        Self {
            cc: tool("gcc"),
            cxx: tool("g++"),
            ar: tool("ar"),
            ranlib: tool("ranlib"),
            strip: tool("strip"),
        }
    }

    /// Every tool with its conventional variable name, in a fixed order.
    pub fn entries(&self) -> [(&'static str, &Path); 5] {
        [
            ("CC", &self.cc),
            ("CXX", &self.cxx),
            ("AR", &self.ar),
            ("RANLIB", &self.ranlib),
            ("STRIP", &self.strip),
        ]
    }
}

/// Canonical configuration of a cross toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainDescriptor {
    /// Target the toolchain produces binaries for.
    pub target: TargetTriple,

    /// Root of the target's headers and libraries.
    pub sysroot: PathBuf,

    /// Cross tool paths.
    pub compilers: CompilerPaths,

    /// CPU to tune for (e.g. `cortex-a72`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_tuning: Option<String>,

    /// Additional compiler flags, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_flags: Vec<String>,
}

impl ToolchainDescriptor {
    /// Conventional descriptor for a target on a platform.
    ///
    /// Linux distributions install `<gnu-prefix>-gcc` into `/usr/bin` with a
    /// sysroot under `/usr/<gnu-prefix>` (Fedora nests it in `sys-root`).
    /// Homebrew cross formulas use the full triple as the tool prefix.
    pub fn for_target(target: TargetTriple, profile: &PlatformProfile) -> Self {
        let bin_dir = profile
            .path_hints
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("/usr/bin"));

        let (prefix, sysroot) = match profile.family {
            PlatformFamily::Macos => {
                let triple = target.as_str().to_string();
                let brew_root = bin_dir.parent().unwrap_or(Path::new("/opt/homebrew"));
                let sysroot = brew_root
                    .join("opt")
                    .join(&triple)
                    .join("toolchain")
                    .join(&triple)
                    .join("sysroot");
                (triple, sysroot)
            }
            PlatformFamily::Fedora => {
                let prefix = target.gnu_prefix();
                let sysroot = PathBuf::from("/usr").join(&prefix).join("sys-root");
                (prefix, sysroot)
            }
            _ => {
                let prefix = target.gnu_prefix();
                let sysroot = PathBuf::from("/usr").join(&prefix);
                (prefix, sysroot)
            }
        };

        Self {
            compilers: CompilerPaths::gnu(&bin_dir, &prefix),
            target,
            sysroot,
            cpu_tuning: None,
            extra_flags: Vec::new(),
        }
    }

    /// Compiler flags derived from the descriptor, in a stable order.
    pub fn compile_flags(&self) -> Vec<String> {
        let mut flags = vec![format!("--sysroot={}", self.sysroot.display())];
        if let Some(cpu) = &self.cpu_tuning {
            flags.push(format!("{}={}", self.target.arch().tuning_flag(), cpu));
        }
        flags.extend(self.extra_flags.iter().cloned());
        flags
    }

    /// Hex SHA-256 of the canonical JSON form.
    ///
    /// Embedded in every generated file so a consumer can tell which
    /// descriptor produced it.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Persist as pretty JSON in `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(DESCRIPTOR_FILE);
        let json = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;
        fs::write(&path, format!("{}\n", json))?;
        Ok(path)
    }

    /// Load a descriptor saved by [`save`](Self::save).
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DESCRIPTOR_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CrosskitError::ConfigNotFound { path: path.clone() },
            _ => CrosskitError::Io(e),
        })?;
        serde_json::from_str(&contents).map_err(|e| CrosskitError::ConfigParseError {
            path,
            message: e.to_string(),
        })
    }
}
