//! POSIX shell script exporting the toolchain environment.
//!
//! Sourcing it any number of times leaves the same environment: every
//! variable is assigned outright and the compiler directory is added to
//! `PATH` only when missing.

use super::RenderContext;

pub(crate) fn render(ctx: &RenderContext) -> String {
    let mut out = ctx.header();
    out.push_str("# Usage: . ./env.sh\n\n");

    out.push_str(&format!("export CROSS_TRIPLE=\"{}\"\n", ctx.triple));
    out.push_str(&format!("export CROSS_SYSROOT=\"{}\"\n", ctx.sysroot));
    for (var, path) in &ctx.tools {
        out.push_str(&format!("export {}=\"{}\"\n", var, path));
    }
    out.push_str(&format!("export CFLAGS=\"{}\"\n", ctx.flags.join(" ")));
    out.push_str(&format!("export PKG_CONFIG_SYSROOT_DIR=\"{}\"\n", ctx.sysroot));
    out.push_str(&format!(
        "export PKG_CONFIG_LIBDIR=\"{0}/usr/lib/pkgconfig:{0}/usr/share/pkgconfig\"\n",
        ctx.sysroot
    ));
    out.push('\n');

    out.push_str("case \":${PATH}:\" in\n");
    out.push_str(&format!("  *\":{}:\"*) ;;\n", ctx.compiler_dir));
    out.push_str(&format!(
        "  *) export PATH=\"{}${{PATH:+:${{PATH}}}}\" ;;\n",
        ctx.compiler_dir
    ));
    out.push_str("esac\n");
    out
}
