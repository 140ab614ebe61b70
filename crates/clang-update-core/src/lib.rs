//! clang-update-core: provisioning of the pinned LLVM/Clang toolchain
//!
//! Checks out LLVM, Clang, LLD and compiler-rt from Subversion, builds them
//! with CMake and Ninja (x64 toolchain plus an x86 compiler-rt), stages the
//! i386 sanitizer runtimes and headers, and records the provisioned
//! revision in a stamp file so repeated runs are no-ops.
//!
//! ## Pipeline
//!
//! 1. Gate on `GYP_DEFINES` (`clang=1`/`asan=1`, `make_clang_dir=`)
//! 2. Compare the stamp with the target revision
//! 3. Blank the stamp, clobber `out/`
//! 4. Check out each module (one delete-and-retry)
//! 5. Configure and build both architectures
//! 6. Stage artifacts
//! 7. Commit the stamp

pub mod build;
pub mod checkout;
pub mod config;
pub mod error;
pub mod fakes;
pub mod fs_ops;
pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod stamp;
pub mod staging;
pub mod strategy;
pub mod telemetry;

pub use build::BuildInvocation;
pub use checkout::{checkout, SourceModule};
pub use config::{BuildDefines, PathLayout, Revision, UpdateSettings};
pub use error::UpdateError;
pub use gate::{GateVerdict, SkipReason, UpdateGate};
pub use pipeline::{ClangUpdater, SystemToolchain, ToolchainLocator, UpdateOutcome};
pub use runner::{CommandOutcome, CommandRunner, CommandSpec, ProcessRunner};
pub use stamp::StampFile;
pub use staging::{stage_artifacts, StagingReport};
pub use strategy::{select_strategy, Platform, ScriptDelegate, UpdateStrategy, WindowsUpdate};
pub use telemetry::init_tracing;
pub use toolchain_env::{TargetArch, ToolchainEnv};

/// Result type for update operations
pub type Result<T> = std::result::Result<T, UpdateError>;
