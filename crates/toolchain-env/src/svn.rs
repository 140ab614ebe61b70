//! Subversion executable lookup
//!
//! CMake's `find_program` only resolves `.exe` and `.com`, so the `svn.bat`
//! wrapper shipped by depot_tools is invisible to it. Handing CMake the
//! resolved path keeps LLVM's revision detection working.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extensions tried for `svn`, in order.
pub const SVN_EXTENSIONS: [&str; 4] = [".com", ".exe", ".bat", ".cmd"];

/// Scan a `PATH`-style value for the Subversion client.
pub fn find_svn_executable(path_var: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(path_var) {
        for ext in SVN_EXTENSIONS {
            let candidate = dir.join(format!("svn{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// CMake cache definition pointing LLVM at `svn`.
pub fn subversion_cmake_arg(svn: &Path) -> String {
    format!("-DSubversion_SVN_EXECUTABLE={}", svn.display())
}
