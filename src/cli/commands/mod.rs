//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Global flags and host handles are
//! resolved once into a [`CommandContext`] that every command shares.

pub mod context;
pub mod detect;
pub mod dispatcher;
pub mod display;
pub mod generate;
pub mod install;
pub mod uninstall;
pub mod validate;

pub use context::{CommandContext, Plan};
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
