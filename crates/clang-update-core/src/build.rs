//! CMake configure and Ninja build invocations.

use crate::config::PathLayout;
use crate::error::UpdateError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::Result;
use std::path::PathBuf;
use toolchain_env::{TargetArch, ToolchainEnv};
use tracing::info;

/// Options passed to every configure.
pub const CMAKE_BASE_ARGS: [&str; 3] = [
    "-GNinja",
    "-DCMAKE_BUILD_TYPE=Release",
    "-DLLVM_ENABLE_ASSERTIONS=ON",
];

/// One configure + build of the LLVM tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    pub arch: TargetArch,

    /// Out-of-tree build directory; created if absent.
    pub build_dir: PathBuf,

    /// LLVM source root.
    pub source_dir: PathBuf,

    /// Ninja target.
    pub target: String,

    /// Additional `-D` options.
    pub extra_cmake_args: Vec<String>,
}

impl BuildInvocation {
    /// Full 64-bit toolchain build.
    pub fn primary(layout: &PathLayout, toolchain: &ToolchainEnv) -> Self {
        Self {
            arch: TargetArch::X64,
            build_dir: layout.llvm_build_dir.clone(),
            source_dir: layout.llvm_dir.clone(),
            target: "all".to_string(),
            extra_cmake_args: toolchain.subversion_cmake_arg().into_iter().collect(),
        }
    }

    /// 32-bit compiler-rt build, only needed for the i386 sanitizer runtimes.
    pub fn compiler_rt_x86(layout: &PathLayout) -> Self {
        Self {
            arch: TargetArch::X86,
            build_dir: layout.compiler_rt_build_dir.clone(),
            source_dir: layout.llvm_dir.clone(),
            target: "compiler-rt".to_string(),
            extra_cmake_args: Vec::new(),
        }
    }

    pub fn cmake_command(&self, toolchain: &ToolchainEnv) -> CommandSpec {
        let args = CMAKE_BASE_ARGS
            .iter()
            .map(|a| a.to_string())
            .chain(self.extra_cmake_args.iter().cloned())
            .chain(std::iter::once(self.source_dir.display().to_string()));
        self.wrap(CommandSpec::new("cmake", args), toolchain)
    }

    pub fn ninja_command(&self, toolchain: &ToolchainEnv) -> CommandSpec {
        self.wrap(CommandSpec::new("ninja", [self.target.as_str()]), toolchain)
    }

    fn wrap(&self, spec: CommandSpec, toolchain: &ToolchainEnv) -> CommandSpec {
        spec.current_dir(&self.build_dir)
            .env_setup(toolchain.setup_script(self.arch))
            .extra_path(toolchain.extra_path.clone())
    }

    /// Configure then build. Any nonzero exit aborts.
    pub async fn run(&self, runner: &dyn CommandRunner, toolchain: &ToolchainEnv) -> Result<()> {
        std::fs::create_dir_all(&self.build_dir)
            .map_err(|e| UpdateError::io(&self.build_dir, e))?;

        info!(arch = %self.arch, dir = %self.build_dir.display(), "Configuring LLVM");
        runner.run_checked(&self.cmake_command(toolchain)).await?;

        info!(arch = %self.arch, target = %self.target, "Building");
        runner.run_checked(&self.ninja_command(toolchain)).await?;
        Ok(())
    }
}
