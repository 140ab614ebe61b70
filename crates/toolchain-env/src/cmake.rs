//! CMake discovery
//!
//! CMake is usually on `PATH`, but older Windows installers drop it in
//! `Program Files (x86)` without touching the environment. Discovery never
//! mutates the current process environment; it returns the directories a
//! caller should append to the `PATH` of the children it spawns.

use crate::error::ToolchainError;
use crate::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Well-known CMake install locations, searched in order.
pub const CMAKE_LOCATIONS: [&str; 2] = [
    r"C:\Program Files (x86)\CMake\bin",
    r"C:\Program Files (x86)\CMake 2.8\bin",
];

/// Check whether `cmake` can be spawned from the current `PATH`.
///
/// Only a missing executable counts as "not found"; any other spawn error
/// is surfaced.
pub fn is_cmake_on_path() -> Result<bool> {
    match Command::new("cmake")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ToolchainError::Io(e)),
    }
}

/// Locate CMake, returning the extra `PATH` entries children need.
///
/// Empty when `cmake` already resolves.
pub fn locate_cmake() -> Result<Vec<PathBuf>> {
    if is_cmake_on_path()? {
        debug!("cmake found on PATH");
        return Ok(Vec::new());
    }

    let dir = find_cmake_in(CMAKE_LOCATIONS.iter().map(PathBuf::from))?;
    info!("Using CMake from {}", dir.display());
    Ok(vec![dir])
}

/// Return the first candidate that is an existing directory.
pub fn find_cmake_in<I>(candidates: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    candidates
        .into_iter()
        .find(|dir| dir.is_dir())
        .ok_or(ToolchainError::CmakeNotFound)
}
