//! Build-system configuration synthesis.
//!
//! [`synthesize`] projects a [`ToolchainDescriptor`] into a CMake toolchain
//! file, an autotools site file, a pkg-config file and a sourceable shell
//! script. Rendering is pure: the same descriptor always yields the same
//! bytes. Only [`write_configs`] touches the filesystem.

mod autotools;
mod cmake;
mod env_script;
mod pkgconfig;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigSynthesisError, Result};
use crate::toolchain::ToolchainDescriptor;

/// CMake toolchain file name.
pub const CMAKE_FILE: &str = "toolchain.cmake";
/// Autotools site file name.
pub const AUTOTOOLS_FILE: &str = "config.site";
/// pkg-config file name.
pub const PKGCONFIG_FILE: &str = "cross-toolchain.pc";
/// Environment script file name.
pub const ENV_SCRIPT_FILE: &str = "env.sh";

/// Rendered text of every generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfigs {
    pub cmake: String,
    pub autotools_site: String,
    pub pkg_config: String,
    pub env_script: String,
}

impl GeneratedConfigs {
    /// File name and contents pairs, in a fixed order.
    pub fn files(&self) -> [(&'static str, &str); 4] {
        [
            (CMAKE_FILE, &self.cmake),
            (AUTOTOOLS_FILE, &self.autotools_site),
            (PKGCONFIG_FILE, &self.pkg_config),
            (ENV_SCRIPT_FILE, &self.env_script),
        ]
    }
}

/// Descriptor values checked and converted to text once, shared by every
/// renderer.
pub(crate) struct RenderContext {
    pub fingerprint: String,
    pub triple: String,
    pub system_name: &'static str,
    pub processor: &'static str,
    pub sysroot: String,
    /// `(variable, path)` pairs in `CC, CXX, AR, RANLIB, STRIP` order.
    pub tools: Vec<(&'static str, String)>,
    /// Directory holding the C compiler.
    pub compiler_dir: String,
    /// Every compiler flag, `--sysroot` first.
    pub flags: Vec<String>,
    /// Flags minus `--sysroot`, for tools that set the sysroot separately.
    pub tuning_flags: Vec<String>,
}

impl RenderContext {
    fn new(descriptor: &ToolchainDescriptor) -> std::result::Result<Self, ConfigSynthesisError> {
        let sysroot = path_text("sysroot", &descriptor.sysroot)?;

        let mut tools = Vec::new();
        for (var, path) in descriptor.compilers.entries() {
            tools.push((var, path_text(&var.to_lowercase(), path)?));
        }

        let compiler_dir = descriptor
            .compilers
            .cc
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigSynthesisError {
                field: "cc".to_string(),
                message: "compiler path has no parent directory".to_string(),
            })?;

        if let Some(cpu) = &descriptor.cpu_tuning {
            check_value("cpu_tuning", cpu)?;
            if cpu.contains(char::is_whitespace) {
                return Err(ConfigSynthesisError {
                    field: "cpu_tuning".to_string(),
                    message: format!("'{}' contains whitespace", cpu),
                });
            }
        }
        for flag in &descriptor.extra_flags {
            check_value("extra_flags", flag)?;
        }

        let flags = descriptor.compile_flags();
        let tuning_flags = flags.iter().skip(1).cloned().collect();

        Ok(Self {
            fingerprint: descriptor.fingerprint(),
            triple: descriptor.target.as_str().to_string(),
            system_name: descriptor.target.cmake_system_name(),
            processor: descriptor.target.arch().cmake_processor(),
            sysroot,
            tools,
            compiler_dir,
            flags,
            tuning_flags,
        })
    }

    /// Path of one tool by variable name.
    pub fn tool(&self, var: &str) -> &str {
        self.tools
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, p)| p.as_str())
            .unwrap_or_default()
    }

    /// Comment line identifying the descriptor that produced a file.
    pub fn header(&self) -> String {
        format!(
            "# Generated by crosskit for {}. Do not edit.\n# descriptor-sha256: {}\n",
            self.triple, self.fingerprint
        )
    }
}

/// Characters that cannot appear inside the double-quoted strings every
/// renderer emits.
const FORBIDDEN: &[char] = &['"', '\n', '\r', '\\', '$', '`'];

fn check_value(field: &str, value: &str) -> std::result::Result<(), ConfigSynthesisError> {
    if value.is_empty() {
        return Err(ConfigSynthesisError {
            field: field.to_string(),
            message: "value is empty".to_string(),
        });
    }
    if let Some(c) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(ConfigSynthesisError {
            field: field.to_string(),
            message: format!("{:?} contains unquotable character {:?}", value, c),
        });
    }
    Ok(())
}

fn path_text(field: &str, path: &Path) -> std::result::Result<String, ConfigSynthesisError> {
    let text = path.to_str().ok_or_else(|| ConfigSynthesisError {
        field: field.to_string(),
        message: format!("{} is not valid UTF-8", path.display()),
    })?;
    check_value(field, text)?;
    if !path.is_absolute() {
        return Err(ConfigSynthesisError {
            field: field.to_string(),
            message: format!("'{}' must be an absolute path", text),
        });
    }
    Ok(text.to_string())
}

/// Render every configuration file for a descriptor.
pub fn synthesize(
    descriptor: &ToolchainDescriptor,
) -> std::result::Result<GeneratedConfigs, ConfigSynthesisError> {
    let ctx = RenderContext::new(descriptor)?;
    Ok(GeneratedConfigs {
        cmake: cmake::render(&ctx),
        autotools_site: autotools::render(&ctx),
        pkg_config: pkgconfig::render(&ctx),
        env_script: env_script::render(&ctx),
    })
}

/// Files touched by [`write_configs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files created or whose content changed.
    pub written: Vec<PathBuf>,
    /// Files left alone because their content already matched.
    pub unchanged: Vec<PathBuf>,
}

/// Write generated files into `dir`, creating it if needed.
///
/// A file whose current content is identical is not rewritten, so its
/// modification time is preserved for build systems that cache on it.
pub fn write_configs(configs: &GeneratedConfigs, dir: &Path) -> Result<WriteSummary> {
    fs::create_dir_all(dir)?;

    let mut summary = WriteSummary::default();
    for (name, contents) in configs.files() {
        let path = dir.join(name);
        let current = fs::read(&path).ok();
        if current.as_deref() == Some(contents.as_bytes()) {
            tracing::debug!("{} unchanged", path.display());
            summary.unchanged.push(path);
            continue;
        }
        fs::write(&path, contents)?;
        tracing::debug!("Wrote {}", path.display());
        summary.written.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformFamily, PlatformProfile};
    use crate::toolchain::TargetTriple;
    use tempfile::TempDir;

    fn descriptor() -> ToolchainDescriptor {
        let profile = PlatformProfile::for_family(PlatformFamily::Debian).unwrap();
        let target = TargetTriple::parse("aarch64-unknown-linux-gnu").unwrap();
        let mut d = ToolchainDescriptor::for_target(target, &profile);
        d.cpu_tuning = Some("cortex-a72".into());
        d.extra_flags = vec!["-O2".into()];
        d
    }

    /// Pull the value following `key` up to the next quote, space or newline.
    fn value_after<'a>(text: &'a str, key: &str) -> &'a str {
        let start = text
            .find(key)
            .unwrap_or_else(|| panic!("{} missing in:\n{}", key, text))
            + key.len();
        let rest = &text[start..];
        let end = rest
            .find(|c: char| c == '"' || c == '\n' || c == ' ')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    #[test]
    fn synthesize_is_deterministic() {
        let d = descriptor();
        assert_eq!(synthesize(&d).unwrap(), synthesize(&d).unwrap());
        assert_eq!(synthesize(&d).unwrap(), synthesize(&d.clone()).unwrap());
    }

    #[test]
    fn every_file_agrees_on_compiler_and_sysroot() {
        let d = descriptor();
        let cc = d.compilers.cc.to_str().unwrap();
        let sysroot = d.sysroot.to_str().unwrap();
        let out = synthesize(&d).unwrap();

        assert_eq!(value_after(&out.cmake, "set(CMAKE_C_COMPILER \""), cc);
        assert_eq!(value_after(&out.cmake, "set(CMAKE_SYSROOT \""), sysroot);

        assert_eq!(value_after(&out.autotools_site, "CC=\""), cc);
        assert_eq!(value_after(&out.autotools_site, "with_sysroot=\""), sysroot);

        assert_eq!(value_after(&out.pkg_config, "cc="), cc);
        assert_eq!(value_after(&out.pkg_config, "sysroot="), sysroot);

        assert_eq!(value_after(&out.env_script, "export CC=\""), cc);
        assert_eq!(value_after(&out.env_script, "export CROSS_SYSROOT=\""), sysroot);
    }

    #[test]
    fn every_file_carries_fingerprint() {
        let d = descriptor();
        let fp = d.fingerprint();
        let out = synthesize(&d).unwrap();
        for (name, contents) in out.files() {
            assert!(contents.contains(&fp), "{} lacks fingerprint", name);
        }
    }

    #[test]
    fn descriptor_change_changes_output() {
        let a = descriptor();
        let mut b = a.clone();
        b.extra_flags.push("-g".into());
        assert_ne!(synthesize(&a).unwrap(), synthesize(&b).unwrap());
    }

    #[test]
    fn rejects_relative_sysroot() {
        let mut d = descriptor();
        d.sysroot = PathBuf::from("sysroot");
        let err = synthesize(&d).unwrap_err();
        assert_eq!(err.field, "sysroot");
    }

    #[test]
    fn rejects_empty_compiler() {
        let mut d = descriptor();
        d.compilers.cxx = PathBuf::new();
        let err = synthesize(&d).unwrap_err();
        assert_eq!(err.field, "cxx");
    }

    #[test]
    fn rejects_quote_in_flag() {
        let mut d = descriptor();
        d.extra_flags.push("-DNAME=\"x\"".into());
        let err = synthesize(&d).unwrap_err();
        assert_eq!(err.field, "extra_flags");
    }

    #[test]
    fn rejects_newline_in_path() {
        let mut d = descriptor();
        d.compilers.ar = PathBuf::from("/usr/bin/ar\nrm -rf /");
        assert_eq!(synthesize(&d).unwrap_err().field, "ar");
    }

    #[test]
    fn write_skips_unchanged_files() {
        let temp = TempDir::new().unwrap();
        let out = synthesize(&descriptor()).unwrap();

        let first = write_configs(&out, temp.path()).unwrap();
        assert_eq!(first.written.len(), 4);
        assert!(first.unchanged.is_empty());

        let second = write_configs(&out, temp.path()).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), 4);

        let on_disk = fs::read_to_string(temp.path().join(CMAKE_FILE)).unwrap();
        assert_eq!(on_disk, out.cmake);
    }

    #[test]
    fn write_replaces_stale_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(ENV_SCRIPT_FILE), "stale").unwrap();
        let out = synthesize(&descriptor()).unwrap();

        let summary = write_configs(&out, temp.path()).unwrap();

        assert!(summary
            .written
            .contains(&temp.path().join(ENV_SCRIPT_FILE)));
        assert_eq!(
            fs::read_to_string(temp.path().join(ENV_SCRIPT_FILE)).unwrap(),
            out.env_script
        );
    }
}
