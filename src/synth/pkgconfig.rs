//! pkg-config metadata describing the toolchain.

use super::RenderContext;

pub(crate) fn render(ctx: &RenderContext) -> String {
    let mut out = ctx.header();
    out.push('\n');

    out.push_str(&format!("triple={}\n", ctx.triple));
    out.push_str(&format!("sysroot={}\n", ctx.sysroot));
    out.push_str(&format!("cc={}\n", ctx.tool("CC")));
    out.push_str(&format!("cxx={}\n", ctx.tool("CXX")));
    out.push('\n');

    out.push_str("Name: cross-toolchain\n");
    out.push_str(&format!("Description: Cross toolchain for {}\n", ctx.triple));
    out.push_str(&format!("Version: {}\n", env!("CARGO_PKG_VERSION")));

    let mut cflags = vec!["--sysroot=${sysroot}".to_string()];
    cflags.extend(ctx.tuning_flags.iter().cloned());
    out.push_str(&format!("Cflags: {}\n", cflags.join(" ")));
    out
}

#[cfg(test)]
mod tests {
    use crate::platform::{PlatformFamily, PlatformProfile};
    use crate::synth::synthesize;
    use crate::toolchain::{TargetTriple, ToolchainDescriptor};

    #[test]
    fn cflags_reference_sysroot_variable() {
        let profile = PlatformProfile::for_family(PlatformFamily::Fedora).unwrap();
        let target = TargetTriple::parse("aarch64-unknown-linux-gnu").unwrap();
        let text = synthesize(&ToolchainDescriptor::for_target(target, &profile))
            .unwrap()
            .pkg_config;

        assert!(text.contains("sysroot=/usr/aarch64-linux-gnu/sys-root\n"));
        assert!(text.contains("Cflags: --sysroot=${sysroot}\n"));
        assert!(text.contains("Name: cross-toolchain\n"));
    }
}
