//! Error types for toolchain-env

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating the host toolchain
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// CMake is neither on PATH nor in any known install location
    #[error("Failed to find CMake!")]
    CmakeNotFound,

    /// No Visual Studio 2013 installation could be located
    #[error("Visual Studio 2013 not found (looked in: {})", display_candidates(.candidates))]
    VisualStudioNotFound { candidates: Vec<PathBuf> },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return "<none>".to_string();
    }
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
