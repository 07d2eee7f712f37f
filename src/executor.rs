//! Runs a compiled step's command inside the destination directory.

use crate::error::{FetchError, Result};
use crate::pipeline::CompiledStep;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const DEFAULT_SHELL: &str = "/bin/sh";

pub struct CommandExecutor {
    shell: PathBuf,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::with_shell(DEFAULT_SHELL)
    }

    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Creates `destination` (and parents) if needed and makes it the process
    /// working directory. Succeeds when the directory already exists.
    pub fn prepare_destination(&self, destination: &Path) -> Result<()> {
        fs::create_dir_all(destination).map_err(|source| FetchError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        env::set_current_dir(destination).map_err(|source| FetchError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        debug!("Working directory is now {}", destination.display());
        Ok(())
    }

    /// Runs `command` through the shell with stdio inherited, blocking until it exits.
    pub fn run_command(&self, command: &str) -> Result<()> {
        info!(shell = %self.shell.display(), "Running fetch command");
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|source| FetchError::Spawn {
                command: self.shell.display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(FetchError::Execution {
                command: command.to_string(),
                status,
            });
        }
        Ok(())
    }

    pub fn execute(&self, destination: &Path, step: &CompiledStep) -> Result<()> {
        self.prepare_destination(destination)?;
        self.run_command(&step.command)
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
