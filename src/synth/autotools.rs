//! Autotools `config.site`.
//!
//! Picked up by `configure` through `CONFIG_SITE=<dir>/config.site`.

use super::RenderContext;

pub(crate) fn render(ctx: &RenderContext) -> String {
    let mut out = ctx.header();
    out.push('\n');

    out.push_str(&format!("host_alias=\"{}\"\n", ctx.triple));
    out.push_str(&format!("with_sysroot=\"{}\"\n", ctx.sysroot));
    out.push('\n');

    for (var, path) in &ctx.tools {
        out.push_str(&format!("{}=\"{}\"\n", var, path));
    }

    let flags = ctx.flags.join(" ");
    out.push_str(&format!("CFLAGS=\"{}\"\n", flags));
    out.push_str(&format!("CXXFLAGS=\"{}\"\n", flags));
    out.push_str(&format!("LDFLAGS=\"--sysroot={}\"\n", ctx.sysroot));
    out
}
