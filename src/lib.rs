//! crosskit - Cross-compilation toolchain provisioning.
//!
//! crosskit installs a cross toolchain through the host's package manager,
//! writes matching CMake, Autotools, pkg-config and shell environment files,
//! and proves the result by compiling probe programs and checking the
//! architecture of what comes out. A failed required install is rolled back.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`orchestrator`] - Install state machine, rollback and uninstall
//! - [`platform`] - Host platform detection
//! - [`provider`] - Package manager adapters
//! - [`report`] - Run reports and exit codes
//! - [`shell`] - External command execution and cancellation
//! - [`synth`] - Build-system file generation
//! - [`toolchain`] - Target triples, components and the toolchain descriptor
//! - [`ui`] - Terminal output
//! - [`validate`] - Probe compilation and binary inspection
//!
//! # Example
//!
//! ```
//! use crosskit::platform::{PlatformFamily, PlatformProfile};
//! use crosskit::synth::synthesize;
//! use crosskit::toolchain::ToolchainDescriptor;
//!
//! let profile = PlatformProfile::for_family(PlatformFamily::Debian).unwrap();
//! let target = "aarch64-unknown-linux-gnu".parse().unwrap();
//! let descriptor = ToolchainDescriptor::for_target(target, &profile);
//!
//! let configs = synthesize(&descriptor).unwrap();
//! assert!(configs.cmake.contains("/usr/bin/aarch64-linux-gnu-gcc"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod provider;
pub mod report;
pub mod run_id;
pub mod shell;
pub mod synth;
pub mod toolchain;
pub mod ui;
pub mod validate;

pub use error::{CrosskitError, Result};
