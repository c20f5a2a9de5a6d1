//! State shared by every command in one invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_config, validate, CrosskitConfig};
use crate::error::{CrosskitError, Result};
use crate::platform::{resolve, HostProbe, PlatformFamily, PlatformProfile, SystemHost};
use crate::shell::{is_elevated, CancelToken, CommandRunner, SystemRunner};
use crate::toolchain::{TargetTriple, ToolchainDescriptor};

/// Global options and host handles for one invocation.
pub struct CommandContext {
    pub project_root: PathBuf,
    pub config_path: Option<PathBuf>,
    /// `--platform` override.
    pub platform: Option<PlatformFamily>,
    pub json: bool,
    pub use_color: bool,
    /// Prefix privileged package commands with `sudo -n`.
    pub use_sudo: bool,
    pub cancel: CancelToken,
    pub runner: Arc<dyn CommandRunner>,
    host: Box<dyn HostProbe>,
}

/// Everything a command needs to act on one target.
#[derive(Debug, Clone)]
pub struct Plan {
    pub config: CrosskitConfig,
    pub profile: PlatformProfile,
    pub target: TargetTriple,
    pub descriptor: ToolchainDescriptor,
    pub output_dir: PathBuf,
}

impl CommandContext {
    /// Context backed by the real host.
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: None,
            platform: None,
            json: false,
            use_color: false,
            use_sudo: !is_elevated(),
            cancel: CancelToken::new(),
            runner: Arc::new(SystemRunner),
            host: Box::new(SystemHost),
        }
    }

    /// Replace the command runner.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the host probe used for detection.
    pub fn with_host(mut self, host: impl HostProbe + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    /// Load and validate configuration.
    pub fn load_config(&self) -> Result<CrosskitConfig> {
        let config = load_config(&self.project_root, self.config_path.as_deref())?;
        validate(&config)?;
        Ok(config)
    }

    /// Resolve the platform: command line, then config, then detection.
    pub fn platform(&self, config: &CrosskitConfig) -> Result<PlatformProfile> {
        let family = self.platform.or(config.platform);
        Ok(resolve(self.host.as_ref(), family)?)
    }

    /// Resolve the target triple: command line, then config.
    pub fn target(&self, arg: Option<&str>, config: &CrosskitConfig) -> Result<TargetTriple> {
        match arg.or(config.target.as_deref()) {
            Some(triple) => TargetTriple::parse(triple),
            None => Err(CrosskitError::ConfigValidationError {
                message: "no target triple; pass --target or set 'target' in the config".into(),
            }),
        }
    }

    /// Resolve the output directory: command line, then config.
    pub fn output_dir(&self, arg: Option<&Path>, config: &CrosskitConfig) -> PathBuf {
        match arg {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.project_root.join(dir),
            None => config.output_dir(&self.project_root),
        }
    }

    /// Resolve config, platform, target and descriptor.
    pub fn plan(&self, target: Option<&str>, output: Option<&Path>) -> Result<Plan> {
        let config = self.load_config()?;
        let target = self.target(target, &config)?;
        let profile = self.platform(&config)?;
        let descriptor = config.descriptor(target.clone(), &profile);
        let output_dir = self.output_dir(output, &config);

        tracing::debug!(
            "Plan: {} on {} ({}), output {}",
            target,
            profile.family,
            profile.provider_id,
            output_dir.display()
        );

        Ok(Plan {
            config,
            profile,
            target,
            descriptor,
            output_dir,
        })
    }
}
