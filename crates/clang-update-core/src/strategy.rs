//! Platform selection: run the pipeline here, or hand off to `update.sh`.

use crate::pipeline::{ClangUpdater, UpdateOutcome};
use crate::runner::{CommandRunner, CommandSpec};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Host platform class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// Something that performs (or delegates) the update and yields an exit code.
#[async_trait]
pub trait UpdateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `args` are the command-line arguments the tool was invoked with.
    async fn execute(&self, args: &[String]) -> Result<i32>;
}

/// Runs the in-process pipeline.
pub struct WindowsUpdate {
    updater: ClangUpdater,
    json_summary: bool,
}

impl WindowsUpdate {
    pub fn new(updater: ClangUpdater) -> Self {
        Self {
            updater,
            json_summary: false,
        }
    }

    /// Print the outcome as a JSON record once the run ends.
    pub fn with_json_summary(mut self, enabled: bool) -> Self {
        self.json_summary = enabled;
        self
    }

    /// The serialized outcome, when JSON summaries are enabled.
    pub fn summary(&self, outcome: &UpdateOutcome) -> Option<String> {
        if !self.json_summary {
            return None;
        }
        serde_json::to_string(outcome).ok()
    }
}

#[async_trait]
impl UpdateStrategy for WindowsUpdate {
    fn name(&self) -> &'static str {
        "windows"
    }

    async fn execute(&self, _args: &[String]) -> Result<i32> {
        let outcome = self.updater.run().await?;
        match self.summary(&outcome) {
            Some(summary) => info!(%summary, "Update finished"),
            None => debug!(?outcome, "Update finished"),
        }
        Ok(0)
    }
}

/// Forwards the invocation to the platform's shell script.
pub struct ScriptDelegate {
    script: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ScriptDelegate {
    pub fn new(script: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            script: script.into(),
            runner,
        }
    }
}

#[async_trait]
impl UpdateStrategy for ScriptDelegate {
    fn name(&self) -> &'static str {
        "script"
    }

    /// The script's exit code is returned verbatim, failure included.
    async fn execute(&self, args: &[String]) -> Result<i32> {
        info!(script = %self.script.display(), "Delegating to fallback script");
        let spec = CommandSpec::new(self.script.display().to_string(), args.iter().cloned());
        let outcome = self.runner.run(&spec).await?;
        Ok(outcome.exit_code)
    }
}

/// Pick the strategy for `platform`.
///
/// `json_summary` only affects the in-process pipeline; the script prints
/// its own output.
pub fn select_strategy(
    platform: Platform,
    updater: ClangUpdater,
    fallback_script: PathBuf,
    runner: Arc<dyn CommandRunner>,
    json_summary: bool,
) -> Box<dyn UpdateStrategy> {
    match platform {
        Platform::Windows => {
            Box::new(WindowsUpdate::new(updater).with_json_summary(json_summary))
        }
        Platform::Other => Box::new(ScriptDelegate::new(fallback_script, runner)),
    }
}
