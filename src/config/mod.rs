//! Configuration loading, parsing, and validation for crosskit.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use crosskit::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".crosskit");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "target: aarch64-unknown-linux-gnu").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.target.as_deref(), Some("aarch64-unknown-linux-gnu"));
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{
    find_project_root, load_config, load_config_file, parse_config, project_config_path,
    CONFIG_DIR, CONFIG_FILE,
};
pub use schema::{CompilerOverrides, CrosskitConfig, Settings, DEFAULT_OUTPUT_DIR};
pub use validator::{validate, validate_config, ValidationError};
