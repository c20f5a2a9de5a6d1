//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::platform::PlatformFamily;

/// crosskit - Cross-compilation toolchain provisioning.
#[derive(Debug, Parser)]
#[command(name = "crosskit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .crosskit/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Platform family to use instead of detecting it (debian, fedora, arch, macos)
    #[arg(long, global = true, value_name = "FAMILY")]
    pub platform: Option<PlatformFamily>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install, configure and validate a cross toolchain
    Install(InstallArgs),

    /// Compile probe programs and check their architecture
    Validate(ValidateArgs),

    /// Remove the toolchain's packages
    Uninstall(UninstallArgs),

    /// Write build-system files without installing anything
    Generate(GenerateArgs),

    /// Print the detected platform
    Detect,
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, Args)]
pub struct InstallArgs {
    /// Target triple (e.g. aarch64-unknown-linux-gnu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Directory for generated files and the report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip probe compilation after installing
    #[arg(long)]
    pub skip_validate: bool,

    /// Components installed at once
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ValidateArgs {
    /// Target triple (e.g. aarch64-unknown-linux-gnu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Directory holding toolchain.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `uninstall` command.
#[derive(Debug, Clone, Default, Args)]
pub struct UninstallArgs {
    /// Target triple (e.g. aarch64-unknown-linux-gnu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Also remove optional tools (debugger, emulator) other targets may share
    #[arg(long)]
    pub include_optional: bool,
}

/// Arguments for the `generate` command.
#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Target triple (e.g. aarch64-unknown-linux-gnu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Directory for generated files
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
