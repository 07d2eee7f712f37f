use crate::error::FetchError;
use crate::substitution::{Arch, LibcFlavor};
use crate::util::logging::parse_level;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;

const DEFAULT_ARCH: &str = "amd64";
const DEFAULT_LIBC: &str = "gnu";
const DEFAULT_LOG_LEVEL: &str = "error";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid architecture: {0}. Valid options: amd64, arm64, arm, 386, riscv64, ppc64le, s390x")]
    InvalidArch(String),

    #[error("Invalid libc flavor: {0}. Valid options: gnu, musl")]
    InvalidLibc(String),

    #[error("Invalid variable override '{0}'. Expected KEY=VALUE")]
    InvalidOverride(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

impl From<ConfigError> for FetchError {
    fn from(err: ConfigError) -> Self {
        FetchError::Configuration(err.to_string())
    }
}

/// Runtime settings for one invocation.
///
/// Defaults come from `FETCH_MELANGE_*` environment variables; command line
/// flags are layered on top by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub arch: String,
    pub libc: String,
    pub pipeline_dirs: Vec<PathBuf>,
    pub overrides: BTreeMap<String, String>,
    pub log_level: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let arch = env::var("FETCH_MELANGE_ARCH").unwrap_or_else(|_| DEFAULT_ARCH.to_string());
        let libc = env::var("FETCH_MELANGE_LIBC").unwrap_or_else(|_| DEFAULT_LIBC.to_string());

        let pipeline_dirs = env::var("FETCH_MELANGE_PIPELINE_DIRS")
            .ok()
            .map(|dirs| {
                dirs.split(':')
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let log_level = env::var("FETCH_MELANGE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            arch,
            libc,
            pipeline_dirs,
            overrides: BTreeMap::new(),
            log_level,
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arch()?;
        self.libc()?;

        self.level()?;

        if let Some(key) = self.overrides.keys().find(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidOverride(format!("{}=", key)));
        }

        Ok(())
    }

    pub fn arch(&self) -> Result<Arch, ConfigError> {
        self.arch
            .parse()
            .map_err(|_| ConfigError::InvalidArch(self.arch.clone()))
    }

    /// Level the tracing subscriber is installed with.
    pub fn level(&self) -> Result<Level, ConfigError> {
        parse_level(&self.log_level).ok_or_else(|| {
            ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                self.log_level
            ))
        })
    }

    pub fn libc(&self) -> Result<LibcFlavor, ConfigError> {
        self.libc
            .parse()
            .map_err(|_| ConfigError::InvalidLibc(self.libc.clone()))
    }

    /// Adds a `KEY=VALUE` override. Later entries for the same key win.
    pub fn add_override(&mut self, entry: &str) -> Result<(), ConfigError> {
        let (key, value) = parse_override(entry)?;
        self.overrides.insert(key, value);
        Ok(())
    }
}

pub fn parse_override(entry: &str) -> Result<(String, String), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidOverride(entry.to_string())),
    }
}
