//! CMake toolchain file.

use super::RenderContext;

pub(crate) fn render(ctx: &RenderContext) -> String {
    let mut out = ctx.header();
    out.push('\n');

    out.push_str(&format!("set(CMAKE_SYSTEM_NAME {})\n", ctx.system_name));
    out.push_str(&format!("set(CMAKE_SYSTEM_PROCESSOR {})\n", ctx.processor));
    out.push_str(&format!("set(CMAKE_SYSROOT \"{}\")\n", ctx.sysroot));
    out.push('\n');

    out.push_str(&format!("set(CMAKE_C_COMPILER \"{}\")\n", ctx.tool("CC")));
    out.push_str(&format!("set(CMAKE_C_COMPILER_TARGET {})\n", ctx.triple));
    out.push_str(&format!("set(CMAKE_CXX_COMPILER \"{}\")\n", ctx.tool("CXX")));
    out.push_str(&format!("set(CMAKE_CXX_COMPILER_TARGET {})\n", ctx.triple));
    for (var, label) in [("AR", "Archiver"), ("RANLIB", "Ranlib"), ("STRIP", "Strip")] {
        out.push_str(&format!(
            "set(CMAKE_{} \"{}\" CACHE FILEPATH \"{}\")\n",
            var,
            ctx.tool(var),
            label
        ));
    }

    if !ctx.tuning_flags.is_empty() {
        let flags = ctx.tuning_flags.join(" ");
        out.push('\n');
        out.push_str(&format!("set(CMAKE_C_FLAGS_INIT \"{}\")\n", flags));
        out.push_str(&format!("set(CMAKE_CXX_FLAGS_INIT \"{}\")\n", flags));
    }

    out.push('\n');
    out.push_str(&format!("set(CMAKE_FIND_ROOT_PATH \"{}\")\n", ctx.sysroot));
    out.push_str("set(CMAKE_FIND_ROOT_PATH_MODE_PROGRAM NEVER)\n");
    out.push_str("set(CMAKE_FIND_ROOT_PATH_MODE_LIBRARY ONLY)\n");
    out.push_str("set(CMAKE_FIND_ROOT_PATH_MODE_INCLUDE ONLY)\n");
    out.push_str("set(CMAKE_FIND_ROOT_PATH_MODE_PACKAGE ONLY)\n");
    out
}
