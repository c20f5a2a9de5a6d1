//! Error types for crosskit operations.
//!
//! This module defines [`CrosskitError`], the primary error type used
//! throughout the application, the component-scoped error records that are
//! captured into outcomes instead of being propagated, and a [`Result`]
//! type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - [`UnsupportedPlatformError`] and [`ConfigSynthesisError`] terminate a run
//! - [`ProviderError`] is carried inside an install outcome, never raised past
//!   the adapter boundary
//! - [`CompileProbeError`] is carried inside a validation check and never
//!   causes installed components to be removed
//! - Use `anyhow::Error` (via `CrosskitError::Other`) for unexpected errors

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// No known platform family could be recognized on this host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported platform: {reason}")]
pub struct UnsupportedPlatformError {
    pub reason: String,
}

/// Category of a package provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The package manager exited non-zero.
    CommandFailed,
    /// The package manager did not finish within the configured timeout.
    Timeout,
    /// The run was interrupted while the package manager was running.
    Cancelled,
    /// The package manager could not be started at all.
    Spawn,
}

/// A package manager failure, scoped to one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{component}: {message}")]
pub struct ProviderError {
    pub component: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

/// A probe program failed to build or produced an unusable binary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileProbeError {
    #[error("compiler not found: {0}")]
    CompilerMissing(PathBuf),

    #[error("compilation failed: {diagnostic}")]
    CompileFailed { diagnostic: String },

    #[error("compiler timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("cannot inspect binary: {0}")]
    Inspect(String),
}

/// The toolchain descriptor cannot be rendered into build-system files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot render {field}: {message}")]
pub struct ConfigSynthesisError {
    pub field: String,
    pub message: String,
}

/// Core error type for crosskit operations.
#[derive(Debug, Error)]
pub enum CrosskitError {
    /// Host platform detection failed.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),

    /// A package manager operation failed.
    #[error("Package provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A probe compilation failed.
    #[error("Probe '{check}' failed: {source}")]
    CompileProbe {
        check: String,
        #[source]
        source: CompileProbeError,
    },

    /// Build-system file synthesis hit an invariant violation.
    #[error(transparent)]
    ConfigSynthesis(#[from] ConfigSynthesisError),

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Target triple could not be parsed or is not supported.
    #[error("Invalid target triple '{triple}': {message}")]
    InvalidTriple { triple: String, message: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// The run was interrupted by the user.
    #[error("Run cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for crosskit operations.
pub type Result<T> = std::result::Result<T, CrosskitError>;
