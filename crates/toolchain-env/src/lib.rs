//! toolchain-env: host toolchain discovery for clang-update
//!
//! Locates the pieces of the Windows build environment the LLVM build
//! relies on: the Visual Studio environment-setup script, CMake, and the
//! Subversion client. Discovery is explicit and side-effect free: results
//! come back in a [`ToolchainEnv`] value instead of being cached globally or
//! written into the process environment.

pub mod cmake;
pub mod error;
pub mod msvs;
pub mod svn;

pub use cmake::{find_cmake_in, is_cmake_on_path, locate_cmake};
pub use error::ToolchainError;
pub use msvs::VisualStudio;
pub use svn::{find_svn_executable, subversion_cmake_arg};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result type for toolchain discovery
pub type Result<T> = std::result::Result<T, ToolchainError>;

/// Architecture a build is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetArch {
    /// 64-bit build of the full toolchain
    X64,
    /// 32-bit build, used for the i386 sanitizer runtimes
    X86,
}

impl TargetArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetArch::X64 => "x64",
            TargetArch::X86 => "x86",
        }
    }

    /// Argument understood by `vcvarsall.bat`.
    pub fn vcvars_arg(&self) -> &'static str {
        match self {
            TargetArch::X64 => "amd64",
            TargetArch::X86 => "x86",
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the build steps need to know about the host toolchain.
///
/// Computed once per run and handed to each step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainEnv {
    /// Visual Studio install; `None` runs commands without a setup script.
    pub visual_studio: Option<VisualStudio>,

    /// Directories appended to `PATH` for every child process.
    pub extra_path: Vec<PathBuf>,

    /// Subversion client CMake should use.
    pub svn_executable: Option<PathBuf>,
}

impl ToolchainEnv {
    /// Discover the toolchain from the current environment.
    pub fn discover(vs_override: Option<&Path>) -> Result<Self> {
        let extra_path = locate_cmake()?;
        let visual_studio = VisualStudio::locate(vs_override, |key| std::env::var(key).ok())?;
        let svn_executable = std::env::var_os("PATH").and_then(|p| find_svn_executable(&p));

        info!(
            vs = %visual_studio.install_dir.display(),
            svn = ?svn_executable,
            "Toolchain discovered"
        );

        Ok(Self {
            visual_studio: Some(visual_studio),
            extra_path,
            svn_executable,
        })
    }

    /// Environment-setup command for `arch`, if Visual Studio is known.
    pub fn setup_script(&self, arch: TargetArch) -> Option<Vec<String>> {
        self.visual_studio.as_ref().map(|vs| vs.setup_script(arch))
    }

    /// `-DSubversion_SVN_EXECUTABLE=...`, if `svn` was found.
    pub fn subversion_cmake_arg(&self) -> Option<String> {
        self.svn_executable.as_deref().map(subversion_cmake_arg)
    }
}
