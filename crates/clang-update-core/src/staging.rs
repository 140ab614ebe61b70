//! Staging of build outputs into the primary toolchain tree.

use crate::config::PathLayout;
use crate::fs_ops::{copy_directory_contents, copy_file};
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// 32-bit static runtime libraries.
pub const I386_LIB_FILTER: &str = r"^.*-i386\.lib$";

/// 32-bit dynamic runtime libraries.
pub const I386_DLL_FILTER: &str = r"^.*-i386\.dll$";

/// Sanitizer exclusion list shipped next to the runtime libraries.
pub const ASAN_BLACKLIST: &str = "asan_blacklist.txt";

/// Files placed by [`stage_artifacts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingReport {
    pub runtime_libraries: Vec<PathBuf>,
    pub blacklist: Option<PathBuf>,
    pub sanitizer_headers: Vec<PathBuf>,
}

impl StagingReport {
    pub fn total(&self) -> usize {
        self.runtime_libraries.len() + self.blacklist.iter().count() + self.sanitizer_headers.len()
    }
}

/// Copy the x86 runtimes, the ASan blacklist and the sanitizer headers.
///
/// Every copy failure is fatal.
pub fn stage_artifacts(layout: &PathLayout) -> Result<StagingReport> {
    let src = layout.asan_rt_lib_src_dir();
    let dst = layout.asan_rt_lib_dst_dir();

    let mut report = StagingReport::default();
    for pattern in [I386_LIB_FILTER, I386_DLL_FILTER] {
        let filter = Regex::new(pattern)?;
        report
            .runtime_libraries
            .extend(copy_directory_contents(&src, &dst, Some(&filter))?);
    }

    // lib/clang/<version>/lib/windows -> lib/clang/<version>
    let blacklist_src = PathLayout::clang_lib_dir(&layout.compiler_rt_build_dir).join(ASAN_BLACKLIST);
    let blacklist_dst_dir = PathLayout::clang_lib_dir(&layout.llvm_build_dir);
    report.blacklist = Some(copy_file(&blacklist_src, &blacklist_dst_dir)?);

    report.sanitizer_headers = copy_directory_contents(
        &layout.sanitizer_include_dir(),
        &layout.aux_sanitizer_include_dir(),
        None,
    )?;

    info!(
        libraries = report.runtime_libraries.len(),
        headers = report.sanitizer_headers.len(),
        "Staged build artifacts"
    );
    Ok(report)
}
