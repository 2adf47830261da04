//! Configuration file discovery and top-level errors

use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::imports::ImportError;
use crate::source::SourceError;

/// Errors that can occur while assembling a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found in directory or its parents: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// List of supported configuration file names
pub const FILENAMES: [&str; 3] = [".cmd.yaml", ".cmd.yml", ".cmd.json"];

/// Searches for a configuration file in `start` and its parents.
///
/// # Errors
///
/// Returns `ConfigError::ConfigNotFound` if no config file is found.
pub fn find_config(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut path = start.to_path_buf();
    debug!("Searching for config file in {}", start.display());
    loop {
        for file in &FILENAMES {
            let config_path = path.join(file);
            if config_path.exists() {
                info!("Found config file: {}", config_path.display());
                return Ok(config_path);
            }
        }
        if !path.pop() {
            return Err(ConfigError::ConfigNotFound(start.to_path_buf()));
        }
    }
}

/// Returns the process working directory.
///
/// # Errors
///
/// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined.
pub fn working_directory() -> Result<PathBuf, ConfigError> {
    std::env::current_dir().map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))
}
