//! Target triple parsing and per-architecture facts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrosskitError;

/// CPU architecture of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Aarch64,
    Arm,
    X86_64,
    X86,
    Riscv64,
    Mips,
    Powerpc64,
}

impl Arch {
    /// Parse the architecture component of a triple.
    pub fn from_triple_component(s: &str) -> Option<Self> {
        match s {
            "aarch64" | "arm64" | "aarch64_be" => Some(Arch::Aarch64),
            "x86_64" | "amd64" => Some(Arch::X86_64),
            "i386" | "i486" | "i586" | "i686" => Some(Arch::X86),
            s if s.starts_with("riscv64") => Some(Arch::Riscv64),
            s if s.starts_with("mips") => Some(Arch::Mips),
            s if s.starts_with("powerpc64") || s.starts_with("ppc64") => Some(Arch::Powerpc64),
            s if s.starts_with("arm") || s.starts_with("thumb") => Some(Arch::Arm),
            _ => None,
        }
    }

    /// Architecture marker as reported by binary inspection tools.
    pub fn marker(&self) -> &'static str {
        match self {
            Arch::Aarch64 => "AArch64",
            Arch::Arm => "ARM",
            Arch::X86_64 => "X86-64",
            Arch::X86 => "Intel 80386",
            Arch::Riscv64 => "RISC-V",
            Arch::Mips => "MIPS",
            Arch::Powerpc64 => "PowerPC64",
        }
    }

    /// Value for `CMAKE_SYSTEM_PROCESSOR`.
    pub fn cmake_processor(&self) -> &'static str {
        match self {
            Arch::Aarch64 => "aarch64",
            Arch::Arm => "arm",
            Arch::X86_64 => "x86_64",
            Arch::X86 => "i686",
            Arch::Riscv64 => "riscv64",
            Arch::Mips => "mips",
            Arch::Powerpc64 => "ppc64",
        }
    }

    /// Flag used to apply CPU tuning for this architecture.
    pub fn tuning_flag(&self) -> &'static str {
        match self {
            Arch::Aarch64 | Arch::Arm | Arch::Powerpc64 | Arch::Riscv64 => "-mcpu",
            Arch::X86_64 | Arch::X86 | Arch::Mips => "-march",
        }
    }

    /// Debian multiarch name, used in cross libc package names.
    pub fn debian_arch(&self, raw: &str, env: Option<&str>) -> &'static str {
        match self {
            Arch::Aarch64 => "arm64",
            Arch::Arm if env.is_some_and(|e| e.ends_with("hf")) => "armhf",
            Arch::Arm => "armel",
            Arch::X86_64 => "amd64",
            Arch::X86 => "i386",
            Arch::Riscv64 => "riscv64",
            Arch::Mips if raw.ends_with("el") => "mipsel",
            Arch::Mips => "mips",
            Arch::Powerpc64 if raw.ends_with("le") => "ppc64el",
            Arch::Powerpc64 => "ppc64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_processor())
    }
}

const KNOWN_OSES: &[&str] = &["linux", "darwin", "windows", "none", "freebsd", "android"];

/// A parsed `arch-vendor-os[-env]` target identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetTriple {
    raw: String,
    arch: Arch,
    arch_name: String,
    vendor: String,
    os: String,
    env: Option<String>,
}

impl TargetTriple {
    /// Parse a triple like `aarch64-unknown-linux-gnu` or `aarch64-linux-gnu`.
    pub fn parse(s: &str) -> Result<Self, CrosskitError> {
        let invalid = |message: &str| CrosskitError::InvalidTriple {
            triple: s.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() < 3 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("expected arch-vendor-os or arch-vendor-os-env"));
        }

        let arch_name = parts[0].to_string();
        let arch = Arch::from_triple_component(&arch_name)
            .ok_or_else(|| invalid("unsupported architecture"))?;

        // A three-part triple may omit the vendor (aarch64-linux-gnu).
        let (vendor, os, env) = if KNOWN_OSES.contains(&parts[1]) {
            if parts.len() == 4 {
                return Err(invalid("too many components after the OS"));
            }
            ("unknown", parts[1], parts.get(2).copied())
        } else {
            (parts[1], parts[2], parts.get(3).copied())
        };

        if !KNOWN_OSES.contains(&os) {
            return Err(invalid("unsupported operating system"));
        }

        Ok(Self {
            raw: s.trim().to_string(),
            arch,
            arch_name,
            vendor: vendor.to_string(),
            os: os.to_string(),
            env: env.map(|e| e.to_string()),
        })
    }

    /// The triple exactly as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// The architecture component as written (e.g. `armv7`).
    pub fn arch_name(&self) -> &str {
        &self.arch_name
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Architecture marker a binary built for this target must carry.
    pub fn expected_marker(&self) -> &'static str {
        self.arch.marker()
    }

    /// GNU tool prefix without vendor, as used by distribution packages
    /// (`aarch64-linux-gnu`, `arm-linux-gnueabihf`, `riscv64-linux-gnu`).
    pub fn gnu_prefix(&self) -> String {
        let arch = match self.arch {
            Arch::Arm => "arm",
            Arch::Riscv64 => "riscv64",
            Arch::Aarch64 => "aarch64",
            _ => self.arch_name.as_str(),
        };
        match &self.env {
            Some(env) => format!("{}-{}-{}", arch, self.os, env),
            None => format!("{}-{}", arch, self.os),
        }
    }

    /// Value for `CMAKE_SYSTEM_NAME`.
    pub fn cmake_system_name(&self) -> &'static str {
        match self.os.as_str() {
            "linux" | "android" => "Linux",
            "darwin" => "Darwin",
            "windows" => "Windows",
            "freebsd" => "FreeBSD",
            _ => "Generic",
        }
    }

    /// Debian multiarch name for this target.
    pub fn debian_arch(&self) -> &'static str {
        self.arch.debian_arch(&self.arch_name, self.env())
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TargetTriple {
    type Err = CrosskitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = CrosskitError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TargetTriple> for String {
    fn from(t: TargetTriple) -> Self {
        t.raw
    }
}
