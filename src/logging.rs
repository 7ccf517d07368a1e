//! Logging setup
//!
//! Initializes `tracing` with output to a log file rather than stderr, since
//! the terminal is owned by the TUI. The default location is the XDG data
//! directory (`~/.local/share/aidwatch/aidwatch.log` on Linux); filtering is
//! controlled through `RUST_LOG`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    /// No usable log directory could be determined (e.g. no home directory)
    #[error("Could not determine a log directory")]
    NoLogDir,

    /// Log file or directory could not be created
    #[error("Failed to create log file: {0}")]
    Io(#[from] io::Error),

    /// The global subscriber was already installed
    #[error("Failed to install logger: {0}")]
    Init(String),
}

/// Returns the default log file path in the XDG data directory
///
/// Returns `None` if the platform directories cannot be determined.
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "aidwatch")?;
    Some(project_dirs.data_dir().join("aidwatch.log"))
}

/// Initializes tracing to write to `path`, or the default XDG location
///
/// # Arguments
/// * `path` - Log file override; `None` uses [`default_log_path`]
///
/// # Returns
/// The path actually used, so the UI can tell the user where logs went.
pub fn init(path: Option<&Path>) -> Result<PathBuf, LoggingError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_log_path().ok_or(LoggingError::NoLogDir)?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(path)
}
