//! Error types for clang-update-core

use std::path::{Path, PathBuf};
use thiserror::Error;
use toolchain_env::ToolchainError;

/// Fatal failures of an update run.
///
/// Skips (flag absent, already up to date, ...) are not errors; they are
/// reported through [`crate::UpdateOutcome`].
#[derive(Error, Debug)]
pub enum UpdateError {
    /// External command exited unsuccessfully
    #[error("Command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    /// External command could not be started at all
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem operation failed
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Host toolchain could not be located
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Background discovery task panicked or was cancelled
    #[error("Toolchain discovery did not complete: {0}")]
    Discovery(#[from] tokio::task::JoinError),

    /// Filename filter is not a valid regular expression
    #[error("Invalid filename filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// Settings are unusable
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl UpdateError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        UpdateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Process exit status for this failure.
    ///
    /// Failing commands propagate their own code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            UpdateError::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
