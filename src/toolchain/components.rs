//! Installable toolchain components.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformFamily;

use super::triple::TargetTriple;

/// One installable unit of a cross toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Stable name used in reports (`compiler`, `binutils`, ...).
    pub name: String,

    /// Package name used when no family override exists.
    pub package: String,

    /// Package names for families whose naming differs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<PlatformFamily, String>,

    /// Whether failure to install aborts and rolls back the run.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ComponentSpec {
    /// A required component with the same package name everywhere.
    pub fn required(name: &str, package: &str) -> Self {
        Self {
            name: name.to_string(),
            package: package.to_string(),
            overrides: BTreeMap::new(),
            required: true,
        }
    }

    /// An optional component with the same package name everywhere.
    pub fn optional(name: &str, package: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, package)
        }
    }

    /// Use a different package name on one family.
    pub fn with_override(mut self, family: PlatformFamily, package: &str) -> Self {
        self.overrides.insert(family, package.to_string());
        self
    }

    /// Package name on the given family.
    pub fn package_for(&self, family: PlatformFamily) -> &str {
        self.overrides
            .get(&family)
            .map(String::as_str)
            .unwrap_or(&self.package)
    }

    /// This component with its package name fixed for one family.
    pub fn resolved_for(&self, family: PlatformFamily) -> Self {
        Self {
            name: self.name.clone(),
            package: self.package_for(family).to_string(),
            overrides: BTreeMap::new(),
            required: self.required,
        }
    }
}

/// The component set for a target, in install order.
///
/// Canonical names follow Debian packaging; other families override.
/// Homebrew ships the whole GNU toolchain for a triple as one formula, so
/// every required component maps to it and later ones report as present.
pub fn components_for(target: &TargetTriple) -> Vec<ComponentSpec> {
    let prefix = target.gnu_prefix();
    let brew_formula = format!("messense/macos-cross-toolchains/{}", target.as_str());

    vec![
        ComponentSpec::required("compiler", &format!("gcc-{}", prefix))
            .with_override(PlatformFamily::Fedora, &format!("gcc-{}", prefix))
            .with_override(PlatformFamily::Arch, &format!("{}-gcc", prefix))
            .with_override(PlatformFamily::Macos, &brew_formula),
        ComponentSpec::required("cxx-compiler", &format!("g++-{}", prefix))
            .with_override(PlatformFamily::Fedora, &format!("gcc-c++-{}", prefix))
            .with_override(PlatformFamily::Arch, &format!("{}-gcc", prefix))
            .with_override(PlatformFamily::Macos, &brew_formula),
        ComponentSpec::required("binutils", &format!("binutils-{}", prefix))
            .with_override(PlatformFamily::Arch, &format!("{}-binutils", prefix))
            .with_override(PlatformFamily::Macos, &brew_formula),
        ComponentSpec::required(
            "libc-headers",
            &format!("libc6-dev-{}-cross", target.debian_arch()),
        )
        .with_override(PlatformFamily::Fedora, &format!("{}-glibc", prefix))
        .with_override(PlatformFamily::Arch, &format!("{}-glibc", prefix))
        .with_override(PlatformFamily::Macos, &brew_formula),
        ComponentSpec::optional("debugger", "gdb-multiarch")
            .with_override(PlatformFamily::Fedora, "gdb")
            .with_override(PlatformFamily::Arch, &format!("{}-gdb", prefix))
            .with_override(PlatformFamily::Macos, "gdb"),
        ComponentSpec::optional("emulator", "qemu-user-static")
            .with_override(PlatformFamily::Macos, "qemu"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aarch64() -> TargetTriple {
        TargetTriple::parse("aarch64-unknown-linux-gnu").unwrap()
    }

    #[test]
    fn package_for_uses_override() {
        let spec = ComponentSpec::required("compiler", "gcc-aarch64-linux-gnu")
            .with_override(PlatformFamily::Arch, "aarch64-linux-gnu-gcc");

        assert_eq!(spec.package_for(PlatformFamily::Debian), "gcc-aarch64-linux-gnu");
        assert_eq!(spec.package_for(PlatformFamily::Arch), "aarch64-linux-gnu-gcc");
    }

    #[test]
    fn resolved_for_drops_overrides() {
        let spec = ComponentSpec::optional("debugger", "gdb-multiarch")
            .with_override(PlatformFamily::Fedora, "gdb");

        let resolved = spec.resolved_for(PlatformFamily::Fedora);
        assert_eq!(resolved.package, "gdb");
        assert!(resolved.overrides.is_empty());
        assert!(!resolved.required);
    }

    #[test]
    fn default_set_is_ordered_compiler_first() {
        let names: Vec<String> = components_for(&aarch64())
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "compiler",
                "cxx-compiler",
                "binutils",
                "libc-headers",
                "debugger",
                "emulator"
            ]
        );
    }

    #[test]
    fn debian_packages_for_aarch64() {
        let set = components_for(&aarch64());
        let packages: Vec<&str> = set
            .iter()
            .map(|c| c.package_for(PlatformFamily::Debian))
            .collect();
        assert_eq!(packages[0], "gcc-aarch64-linux-gnu");
        assert_eq!(packages[3], "libc6-dev-arm64-cross");
    }

    #[test]
    fn optional_components_are_not_required() {
        let set = components_for(&aarch64());
        assert!(set.iter().filter(|c| !c.required).all(|c| c.name == "debugger" || c.name == "emulator"));
    }

    #[test]
    fn yaml_defaults_required_to_true() {
        let spec: ComponentSpec =
            serde_yaml::from_str("name: compiler\npackage: gcc-arm-linux-gnueabihf\n").unwrap();
        assert!(spec.required);
        assert!(spec.overrides.is_empty());
    }

    #[test]
    fn yaml_overrides_keyed_by_family() {
        let yaml = "name: compiler\npackage: gcc\noverrides:\n  arch: cross-gcc\nrequired: false\n";
        let spec: ComponentSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.package_for(PlatformFamily::Arch), "cross-gcc");
        assert!(!spec.required);
    }
}
