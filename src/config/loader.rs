//! Configuration file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::CrosskitConfig;
use crate::error::{CrosskitError, Result};

/// Directory holding project configuration.
pub const CONFIG_DIR: &str = ".crosskit";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Conventional config path for a project.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Find the project root by walking up from `start`.
///
/// Looks for:
/// 1. `.crosskit` directory (primary indicator)
/// 2. `.git` directory (fallback)
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<CrosskitConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CrosskitError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CrosskitError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a [`CrosskitConfig`].
///
/// `source_path` is only used for error reporting. An empty document is
/// the default configuration.
pub fn parse_config(content: &str, source_path: &Path) -> Result<CrosskitConfig> {
    if content.trim().is_empty() {
        return Ok(CrosskitConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| CrosskitError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config with optional path override.
///
/// An explicit path must exist. Without one, the project's
/// `.crosskit/config.yml` is used when present and the defaults otherwise.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<CrosskitConfig> {
    if let Some(path) = config_override {
        return load_config_file(path);
    }

    let path = project_config_path(project_root);
    if path.is_file() {
        tracing::debug!("Loading config from {}", path.display());
        load_config_file(&path)
    } else {
        tracing::debug!("No config at {}; using defaults", path.display());
        Ok(CrosskitConfig::default())
    }
}
