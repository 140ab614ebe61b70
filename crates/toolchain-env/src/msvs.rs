//! Visual Studio 2013 discovery and environment-setup scripts

use crate::error::ToolchainError;
use crate::{Result, TargetArch};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Visual Studio release the LLVM build is configured against.
pub const VS_VERSION: &str = "2013";

/// Install root used when no environment variable points elsewhere.
pub const DEFAULT_INSTALL_DIR: &str = r"C:\Program Files (x86)\Microsoft Visual Studio 12.0";

/// Set by depot_tools when it provides a packaged toolchain.
pub const OVERRIDE_PATH_VAR: &str = "GYP_MSVS_OVERRIDE_PATH";

/// Set by the VS 2013 installer; points at `<install>\Common7\Tools\`.
pub const COMNTOOLS_VAR: &str = "VS120COMNTOOLS";

/// A located Visual Studio installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualStudio {
    /// Installation root (contains `VC\vcvarsall.bat`).
    pub install_dir: PathBuf,
}

impl VisualStudio {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    /// Path to `vcvarsall.bat`.
    pub fn vcvarsall(&self) -> PathBuf {
        self.install_dir.join("VC").join("vcvarsall.bat")
    }

    /// Command line that sets up the compiler environment for `arch`.
    ///
    /// Meant to be chained in front of the real command with `&&`.
    pub fn setup_script(&self, arch: TargetArch) -> Vec<String> {
        vec![
            self.vcvarsall().display().to_string(),
            arch.vcvars_arg().to_string(),
        ]
    }

    /// Candidate install roots, most specific first.
    ///
    /// `lookup` resolves environment variables so callers (and tests) decide
    /// where values come from.
    pub fn candidates<F>(explicit: Option<&Path>, lookup: F) -> Vec<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut candidates = Vec::new();
        if let Some(dir) = explicit {
            candidates.push(dir.to_path_buf());
        }
        if let Some(dir) = lookup(OVERRIDE_PATH_VAR).filter(|v| !v.is_empty()) {
            candidates.push(PathBuf::from(dir));
        }
        if let Some(tools) = lookup(COMNTOOLS_VAR).filter(|v| !v.is_empty()) {
            if let Some(root) = Path::new(&tools).ancestors().nth(2) {
                candidates.push(root.to_path_buf());
            }
        }
        candidates.push(PathBuf::from(DEFAULT_INSTALL_DIR));
        candidates
    }

    /// Locate the first candidate that actually ships `vcvarsall.bat`.
    pub fn locate<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidates = Self::candidates(explicit, lookup);
        for dir in &candidates {
            let vs = VisualStudio::new(dir);
            if vs.vcvarsall().is_file() {
                debug!(install_dir = %dir.display(), "Found Visual Studio {}", VS_VERSION);
                return Ok(vs);
            }
        }
        Err(ToolchainError::VisualStudioNotFound { candidates })
    }
}
