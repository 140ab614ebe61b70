//! The update pipeline: gate, invalidate, clobber, fetch, build, stage, stamp.

use crate::build::BuildInvocation;
use crate::checkout::{checkout, SourceModule};
use crate::config::{PathLayout, Revision, UpdateSettings};
use crate::fs_ops::clobber_dir;
use crate::gate::{GateVerdict, SkipReason, UpdateGate};
use crate::runner::CommandRunner;
use crate::stamp::StampFile;
use crate::staging::stage_artifacts;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use toolchain_env::ToolchainEnv;
use tracing::info;

/// Produces the [`ToolchainEnv`] for a run.
///
/// Called at most once per run, and only when work is actually needed.
/// Discovery spawns probe processes synchronously, so the pipeline calls it
/// on the blocking thread pool.
pub trait ToolchainLocator: Send + Sync {
    fn locate(&self) -> toolchain_env::Result<ToolchainEnv>;
}

/// Discovers the toolchain installed on this machine.
#[derive(Debug, Clone, Default)]
pub struct SystemToolchain {
    /// Explicit Visual Studio install root.
    pub vs_override: Option<PathBuf>,
}

impl ToolchainLocator for SystemToolchain {
    fn locate(&self) -> toolchain_env::Result<ToolchainEnv> {
        ToolchainEnv::discover(self.vs_override.as_deref())
    }
}

/// A fixed, already-known toolchain.
impl ToolchainLocator for ToolchainEnv {
    fn locate(&self) -> toolchain_env::Result<ToolchainEnv> {
        Ok(self.clone())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
    Updated {
        revision: Revision,
        staged_files: usize,
        duration_ms: u64,
    },
}

impl UpdateOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, UpdateOutcome::Skipped { .. })
    }
}

/// Orchestrates one provisioning run.
pub struct ClangUpdater {
    settings: UpdateSettings,
    layout: PathLayout,
    revision: Revision,
    runner: Arc<dyn CommandRunner>,
    locator: Arc<dyn ToolchainLocator>,
}

impl ClangUpdater {
    pub fn new(
        settings: UpdateSettings,
        runner: Arc<dyn CommandRunner>,
        locator: Arc<dyn ToolchainLocator>,
    ) -> Self {
        let layout = settings.layout();
        let revision = settings.revision();
        Self {
            settings,
            layout,
            revision,
            runner,
            locator,
        }
    }

    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// Run the update, or skip it when the flags or the stamp say so.
    pub async fn run(&self) -> Result<UpdateOutcome> {
        if let GateVerdict::Skip(reason) = UpdateGate::evaluate_defines(&self.settings.defines) {
            info!("{}", reason.message());
            return Ok(UpdateOutcome::Skipped { reason });
        }
        self.update().await
    }

    async fn update(&self) -> Result<UpdateOutcome> {
        let start = Instant::now();
        let layout = &self.layout;
        let runner = self.runner.as_ref();

        info!("Updating Clang to {}...", self.revision);
        let stamp = StampFile::new(&layout.stamp_file);
        if let GateVerdict::Skip(reason) = UpdateGate::evaluate_stamp(&self.revision, &stamp.read())
        {
            info!("{}", reason.message());
            return Ok(UpdateOutcome::Skipped { reason });
        }

        let locator = Arc::clone(&self.locator);
        let toolchain = tokio::task::spawn_blocking(move || locator.locate()).await??;

        // Invalidate first: an interrupted run must look out of date.
        stamp.clear()?;

        info!("Clobbering Chromium build files...");
        if clobber_dir(&layout.out_dir)? {
            info!("Removed Chromium out dir: {}.", layout.out_dir.display());
        }

        for module in SourceModule::llvm_modules(&self.settings.repo_url, layout) {
            checkout(runner, &module, &self.revision).await?;
        }

        BuildInvocation::primary(layout, &toolchain)
            .run(runner, &toolchain)
            .await?;
        BuildInvocation::compiler_rt_x86(layout)
            .run(runner, &toolchain)
            .await?;

        let report = stage_artifacts(layout)?;

        stamp.commit(&self.revision)?;
        info!("Clang update was successful.");

        Ok(UpdateOutcome::Updated {
            revision: self.revision.clone(),
            staged_files: report.total(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
