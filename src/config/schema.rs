//! Configuration schema definitions for crosskit.
//!
//! This module contains the struct definitions that map to the
//! `.crosskit/config.yml` file format. Every field is optional; missing
//! values fall back to what the target triple implies.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::{PlatformFamily, PlatformProfile};
use crate::toolchain::{components_for, ComponentSpec, TargetTriple, ToolchainDescriptor};

/// Directory generated files go to when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = ".crosskit/out";

/// Root configuration structure for `.crosskit/config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosskitConfig {
    /// Target triple to provision for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Platform family, bypassing detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformFamily>,

    /// Sysroot to use instead of the platform convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysroot: Option<PathBuf>,

    /// Where generated files and the report are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// CPU to tune for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_tuning: Option<String>,

    /// Additional compiler flags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_flags: Vec<String>,

    /// Per-tool path overrides.
    pub compilers: CompilerOverrides,

    /// Replaces the component set derived from the target triple.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ComponentSpec>>,

    /// Run settings.
    pub settings: Settings,
}

/// Tool paths that replace the conventional ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxx: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ar: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranlib: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip: Option<PathBuf>,
}

/// Concurrency and timeout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Components installed or checks compiled at once.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Upper bound for one package install or removal, in seconds.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,

    /// Upper bound for one probe compilation, in seconds.
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            install_timeout_secs: default_install_timeout(),
            compile_timeout_secs: default_compile_timeout(),
        }
    }
}

fn default_max_parallel() -> usize {
    1
}

fn default_install_timeout() -> u64 {
    900
}

fn default_compile_timeout() -> u64 {
    120
}

impl CrosskitConfig {
    /// Output directory, resolved against the project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        if dir.is_absolute() {
            dir
        } else {
            project_root.join(dir)
        }
    }

    /// Components to install, in order.
    pub fn components(&self, target: &TargetTriple) -> Vec<ComponentSpec> {
        match &self.components {
            Some(components) => components.clone(),
            None => components_for(target),
        }
    }

    /// Descriptor for `target` on `profile` with this config's overrides applied.
    pub fn descriptor(&self, target: TargetTriple, profile: &PlatformProfile) -> ToolchainDescriptor {
        let mut descriptor = ToolchainDescriptor::for_target(target, profile);

        if let Some(sysroot) = &self.sysroot {
            descriptor.sysroot = sysroot.clone();
        }
        let tools = &self.compilers;
        let compilers = &mut descriptor.compilers;
        for (slot, value) in [
            (&mut compilers.cc, &tools.cc),
            (&mut compilers.cxx, &tools.cxx),
            (&mut compilers.ar, &tools.ar),
            (&mut compilers.ranlib, &tools.ranlib),
            (&mut compilers.strip, &tools.strip),
        ] {
            if let Some(path) = value {
                *slot = path.clone();
            }
        }
        descriptor.cpu_tuning = self.cpu_tuning.clone();
        descriptor.extra_flags = self.extra_flags.clone();

        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aarch64() -> TargetTriple {
        TargetTriple::parse("aarch64-unknown-linux-gnu").unwrap()
    }

    fn debian() -> PlatformProfile {
        PlatformProfile::for_family(PlatformFamily::Debian).unwrap()
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_parallel, 1);
        assert_eq!(settings.install_timeout_secs, 900);
        assert_eq!(settings.compile_timeout_secs, 120);
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let config: CrosskitConfig =
            serde_yaml::from_str("settings:\n  max_parallel: 4\n").unwrap();
        assert_eq!(config.settings.max_parallel, 4);
        assert_eq!(config.settings.compile_timeout_secs, 120);
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
target: aarch64-unknown-linux-gnu
platform: arch
sysroot: /opt/sysroots/aarch64
output_dir: build/cross
cpu_tuning: cortex-a72
extra_flags: ["-O2"]
compilers:
  cc: /opt/cross/bin/aarch64-gcc
components:
  - name: compiler
    package: gcc-aarch64-linux-gnu
    overrides:
      arch: aarch64-linux-gnu-gcc
  - name: docs
    package: gcc-doc
    required: false
"#;
        let config: CrosskitConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.platform, Some(PlatformFamily::Arch));
        assert_eq!(config.extra_flags, vec!["-O2".to_string()]);
        let components = config.components.unwrap();
        assert!(components[0].required);
        assert!(!components[1].required);
        assert_eq!(
            components[0].package_for(PlatformFamily::Arch),
            "aarch64-linux-gnu-gcc"
        );
    }

    #[test]
    fn descriptor_applies_overrides() {
        let config = CrosskitConfig {
            sysroot: Some(PathBuf::from("/opt/sysroot")),
            cpu_tuning: Some("cortex-a72".into()),
            compilers: CompilerOverrides {
                cc: Some(PathBuf::from("/opt/cross/bin/cc")),
                ..Default::default()
            },
            ..Default::default()
        };

        let descriptor = config.descriptor(aarch64(), &debian());

        assert_eq!(descriptor.sysroot, PathBuf::from("/opt/sysroot"));
        assert_eq!(descriptor.compilers.cc, PathBuf::from("/opt/cross/bin/cc"));
        assert_eq!(
            descriptor.compilers.cxx,
            PathBuf::from("/usr/bin/aarch64-linux-gnu-g++")
        );
        assert_eq!(descriptor.cpu_tuning.as_deref(), Some("cortex-a72"));
    }

    #[test]
    fn components_default_to_triple_set() {
        let config = CrosskitConfig::default();
        let names: Vec<String> = config
            .components(&aarch64())
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names[0], "compiler");
        assert!(names.contains(&"binutils".to_string()));
    }

    #[test]
    fn output_dir_is_resolved_against_root() {
        let config = CrosskitConfig::default();
        assert_eq!(
            config.output_dir(Path::new("/work")),
            PathBuf::from("/work/.crosskit/out")
        );

        let config = CrosskitConfig {
            output_dir: Some(PathBuf::from("/tmp/cross")),
            ..Default::default()
        };
        assert_eq!(config.output_dir(Path::new("/work")), PathBuf::from("/tmp/cross"));
    }
}
