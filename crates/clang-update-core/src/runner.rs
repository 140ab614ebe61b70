//! External command execution.
//!
//! Every child process the update spawns goes through a [`CommandRunner`],
//! so the pipeline can be driven against a scripted fake in tests.

use crate::error::UpdateError;
use crate::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};

/// A command to run, plus the environment it should run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable.
    pub program: String,

    /// Arguments.
    pub args: Vec<String>,

    /// Working directory; inherits the parent's when `None`.
    pub cwd: Option<PathBuf>,

    /// Environment-setup command chained in front with `&&`.
    pub env_setup: Option<Vec<String>>,

    /// Directories appended to the child's `PATH`.
    pub extra_path: Vec<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env_setup: None,
            extra_path: Vec::new(),
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env_setup(mut self, setup: Option<Vec<String>>) -> Self {
        self.env_setup = setup;
        self
    }

    pub fn extra_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.extra_path = dirs;
        self
    }

    /// Program and arguments as one shell-style line.
    pub fn command_line(&self) -> String {
        shell_join(std::iter::once(&self.program).chain(self.args.iter()))
    }

    /// The full line including the environment setup, as it is executed.
    pub fn display_line(&self) -> String {
        match &self.env_setup {
            Some(setup) => format!("{} && {}", shell_join(setup.iter()), self.command_line()),
            None => self.command_line(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_line())
    }
}

fn shell_join<'a, I>(parts: I) -> String
where
    I: Iterator<Item = &'a String>,
{
    parts
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of running a command to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code; -1 when the child was terminated by a signal.
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            duration_ms: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            exit_code,
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes external commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// A nonzero exit is reported through the outcome, not as an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome>;

    /// Run `spec` and turn a nonzero exit into [`UpdateError::CommandFailed`].
    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        let outcome = self.run(spec).await?;
        if outcome.passed() {
            Ok(outcome)
        } else {
            Err(UpdateError::CommandFailed {
                command: spec.display_line(),
                code: outcome.exit_code,
            })
        }
    }
}

/// Runs commands as real child processes with inherited stdio.
///
/// No timeout is applied; a hung tool hangs the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn build_command(spec: &CommandSpec) -> Command {
        let mut command = match &spec.env_setup {
            Some(_) => shell_command(&spec.display_line()),
            None => {
                let mut c = Command::new(&spec.program);
                c.args(&spec.args);
                c
            }
        };

        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        if let Some(path) = merged_path(&spec.extra_path) {
            command.env("PATH", path);
        }

        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }
}

/// Argument for `cmd /S /C`.
///
/// With `/S`, cmd.exe strips exactly the outermost quote pair and leaves
/// the rest of the line alone, so quoted paths containing spaces or
/// parentheses survive.
#[cfg_attr(not(windows), allow(dead_code))]
fn cmd_line_arg(line: &str) -> String {
    format!("\"{line}\"")
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/S", "/C"]).raw_arg(cmd_line_arg(line));
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

/// The parent's `PATH` with `extra` appended, or `None` if nothing to add.
fn merged_path(extra: &[PathBuf]) -> Option<OsString> {
    if extra.is_empty() {
        return None;
    }
    let current = std::env::var_os("PATH").unwrap_or_default();
    let dirs: Vec<PathBuf> = std::env::split_paths(&current)
        .chain(extra.iter().cloned())
        .collect();
    std::env::join_paths(dirs).ok()
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        info!("Running {}", spec);
        let start = Instant::now();

        let status = Self::build_command(spec)
            .status()
            .await
            .map_err(|source| UpdateError::Spawn {
                command: spec.display_line(),
                source,
            })?;

        let outcome = CommandOutcome {
            exit_code: status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        if !outcome.passed() {
            warn!(exit_code = outcome.exit_code, "Failed.");
        }
        Ok(outcome)
    }
}
