//! Update settings, revision selection and the on-disk path layout.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Upstream Subversion root, overridable through `LLVM_REPO_URL`.
pub const DEFAULT_REPO_URL: &str = "https://llvm.org/svn/llvm-project";

/// Revision pinned for ASan builds so the runtime stays stable.
pub const PINNED_REVISION: &str = "232554";

/// Clang version baked into the staged library paths.
pub const CLANG_VERSION: &str = "3.7.0";

/// Name of the revision stamp inside the primary build directory.
pub const STAMP_FILE_NAME: &str = "cr_build_revision";

/// Presence of this variable forces HEAD even for ASan builds.
pub const FORCE_HEAD_VAR: &str = "LLVM_FORCE_HEAD_REVISION";

/// Revision the toolchain should be provisioned at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Revision {
    /// Always fetch the latest upstream revision
    Head,
    /// A fixed revision number
    Pinned(String),
}

impl Revision {
    pub fn as_str(&self) -> &str {
        match self {
            Revision::Head => "HEAD",
            Revision::Pinned(rev) => rev,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self, Revision::Head)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        if s == "HEAD" {
            Revision::Head
        } else {
            Revision::Pinned(s.to_string())
        }
    }
}

fn flag_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("flag pattern is a valid regex"))
}

/// The `GYP_DEFINES` build configuration string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildDefines(String);

impl BuildDefines {
    pub fn new(defines: impl Into<String>) -> Self {
        Self(defines.into())
    }

    /// `clang=1` or `asan=1` is set.
    pub fn clang_enabled(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        flag_regex(&RE, r"\b(clang|asan)=1").is_match(&self.0)
    }

    /// `asan=1` is set.
    pub fn asan_enabled(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        flag_regex(&RE, r"\b(asan)=1").is_match(&self.0)
    }

    /// `make_clang_dir=` points at a prebuilt toolchain.
    pub fn uses_prebuilt_clang_dir(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        flag_regex(&RE, r"\b(make_clang_dir)=").is_match(&self.0)
    }
}

/// Inputs to an update run, gathered once at startup.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    /// Checkout root everything else is derived from.
    pub root: PathBuf,

    /// Build configuration flags.
    pub defines: BuildDefines,

    /// Subversion root for all modules.
    pub repo_url: String,

    /// Ignore the ASan pin and always track HEAD.
    pub force_head_revision: bool,
}

impl UpdateSettings {
    pub fn new(root: impl Into<PathBuf>, defines: BuildDefines) -> Self {
        Self {
            root: root.into(),
            defines,
            repo_url: DEFAULT_REPO_URL.to_string(),
            force_head_revision: false,
        }
    }

    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self
    }

    pub fn with_force_head_revision(mut self, force: bool) -> Self {
        self.force_head_revision = force;
        self
    }

    /// Target revision: pinned for ASan builds unless HEAD is forced.
    pub fn revision(&self) -> Revision {
        if self.defines.asan_enabled() && !self.force_head_revision {
            Revision::Pinned(PINNED_REVISION.to_string())
        } else {
            Revision::Head
        }
    }

    pub fn layout(&self) -> PathLayout {
        PathLayout::new(&self.root)
    }
}

/// Absolute locations of every checkout and build directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLayout {
    pub root: PathBuf,
    pub llvm_dir: PathBuf,
    pub llvm_build_dir: PathBuf,
    pub compiler_rt_build_dir: PathBuf,
    pub clang_dir: PathBuf,
    pub lld_dir: PathBuf,
    pub compiler_rt_dir: PathBuf,
    pub stamp_file: PathBuf,
    pub out_dir: PathBuf,
}

impl PathLayout {
    pub fn new(root: &Path) -> Self {
        let llvm_dir = root.join("third_party").join("llvm");
        let llvm_build_dir = root
            .join("third_party")
            .join("llvm-build")
            .join("Release+Asserts");

        Self {
            root: root.to_path_buf(),
            compiler_rt_build_dir: llvm_build_dir.join("32bit-compiler-rt"),
            clang_dir: llvm_dir.join("tools").join("clang"),
            lld_dir: llvm_dir.join("tools").join("lld"),
            compiler_rt_dir: llvm_dir.join("projects").join("compiler-rt"),
            stamp_file: llvm_build_dir.join(STAMP_FILE_NAME),
            out_dir: root.join("out"),
            llvm_dir,
            llvm_build_dir,
        }
    }

    /// `<build>/lib/clang/<version>` for a given build directory.
    pub fn clang_lib_dir(build_dir: &Path) -> PathBuf {
        build_dir.join("lib").join("clang").join(CLANG_VERSION)
    }

    /// Windows runtime libraries produced by the x86 build.
    pub fn asan_rt_lib_src_dir(&self) -> PathBuf {
        Self::clang_lib_dir(&self.compiler_rt_build_dir)
            .join("lib")
            .join("windows")
    }

    /// Where the primary toolchain expects the Windows runtime libraries.
    pub fn asan_rt_lib_dst_dir(&self) -> PathBuf {
        Self::clang_lib_dir(&self.llvm_build_dir)
            .join("lib")
            .join("windows")
    }

    pub fn sanitizer_include_dir(&self) -> PathBuf {
        Self::clang_lib_dir(&self.llvm_build_dir)
            .join("include")
            .join("sanitizer")
    }

    /// Extra copy of the sanitizer headers for the fallback compiler.
    pub fn aux_sanitizer_include_dir(&self) -> PathBuf {
        Self::clang_lib_dir(&self.llvm_build_dir)
            .join("include_sanitizer")
            .join("sanitizer")
    }
}
