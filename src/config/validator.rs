//! Configuration validation rules.
//!
//! - `max_parallel` and the timeouts must be positive
//! - component names must be unique and packages non-empty
//! - `target`, when given, must parse as a triple

use std::collections::HashSet;

use crate::config::schema::CrosskitConfig;
use crate::error::{CrosskitError, Result};
use crate::toolchain::TargetTriple;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Component name if error is component-specific
    pub component: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            component: None,
        }
    }

    fn for_component(rule: &str, component: &str, message: String) -> Self {
        Self {
            component: Some(component.to_string()),
            ..Self::new(rule, message)
        }
    }
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &CrosskitConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_settings(config));
    errors.extend(validate_components(config));

    if let Some(target) = &config.target {
        if let Err(e) = TargetTriple::parse(target) {
            errors.push(ValidationError::new("invalid-target", e.to_string()));
        }
    }

    errors
}

fn validate_settings(config: &CrosskitConfig) -> Vec<ValidationError> {
    let settings = &config.settings;
    let mut errors = Vec::new();

    if settings.max_parallel == 0 {
        errors.push(ValidationError::new(
            "zero-parallelism",
            "settings.max_parallel must be at least 1".to_string(),
        ));
    }
    for (field, value) in [
        ("install_timeout_secs", settings.install_timeout_secs),
        ("compile_timeout_secs", settings.compile_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(
                "zero-timeout",
                format!("settings.{} must be at least 1", field),
            ));
        }
    }

    errors
}

fn validate_components(config: &CrosskitConfig) -> Vec<ValidationError> {
    let Some(components) = &config.components else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for component in components {
        if !seen.insert(component.name.as_str()) {
            errors.push(ValidationError::for_component(
                "duplicate-component",
                &component.name,
                format!("Component '{}' is declared more than once", component.name),
            ));
        }

        let empty_override = component
            .overrides
            .iter()
            .find(|(_, package)| package.trim().is_empty());
        if component.package.trim().is_empty() {
            errors.push(ValidationError::for_component(
                "empty-package",
                &component.name,
                format!("Component '{}' has an empty package name", component.name),
            ));
        } else if let Some((family, _)) = empty_override {
            errors.push(ValidationError::for_component(
                "empty-package",
                &component.name,
                format!(
                    "Component '{}' has an empty package name for {}",
                    component.name, family
                ),
            ));
        }
    }

    errors
}

/// Validate and fail on the first batch of errors.
pub fn validate(config: &CrosskitConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(CrosskitError::ConfigValidationError { message })
    }
}
