//! update-clang - provisions the pinned LLVM/Clang toolchain
//!
//! On Windows the checkout, build and staging pipeline runs in-process.
//! Everywhere else the invocation is forwarded to `update.sh`, whose exit
//! code is returned unchanged.
//!
//! ## Environment
//!
//! - `GYP_DEFINES`: must contain `clang=1` or `asan=1` for anything to happen
//! - `LLVM_REPO_URL`: alternate Subversion root
//! - `LLVM_FORCE_HEAD_REVISION`: track HEAD even for ASan builds
//!
//! Arguments for `update.sh` go after `--`; anything before it is parsed
//! as an `update-clang` flag.

use anyhow::{Context, Result};
use clap::Parser;
use clang_update_core::config::{DEFAULT_REPO_URL, FORCE_HEAD_VAR};
use clang_update_core::{
    init_tracing, select_strategy, BuildDefines, ClangUpdater, CommandRunner, Platform,
    ProcessRunner, SystemToolchain, UpdateSettings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, Level};

const SCRIPT_ARGS_HELP: &str = "Arguments for the fallback script must follow `--`, \
e.g. `update-clang -- --if-needed -v`; flags before it are taken by update-clang.";

#[derive(Parser, Debug)]
#[command(name = "update-clang")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch, build and stage the pinned LLVM/Clang toolchain", long_about = None)]
#[command(after_help = SCRIPT_ARGS_HELP)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Source root containing third_party/ and out/
    #[arg(long, env = "CLANG_UPDATE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Build configuration flags
    #[arg(long, env = "GYP_DEFINES", default_value = "", hide_env_values = true)]
    gyp_defines: String,

    /// Subversion root the LLVM modules are checked out from
    #[arg(long, env = "LLVM_REPO_URL", default_value = DEFAULT_REPO_URL)]
    llvm_repo_url: String,

    /// Track HEAD even when asan=1 pins a revision
    #[arg(long)]
    force_head_revision: bool,

    /// Script that handles non-Windows hosts
    /// (default: <root>/tools/clang/scripts/update.sh)
    #[arg(long)]
    fallback_script: Option<PathBuf>,

    /// Visual Studio 2013 install root, bypassing discovery
    #[arg(long)]
    vs_path: Option<PathBuf>,

    /// Arguments forwarded to the fallback script (place them after `--`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "SCRIPT_ARGS")]
    script_args: Vec<String>,
}

impl Cli {
    fn absolute_root(&self) -> Result<PathBuf> {
        if self.root.is_absolute() {
            return Ok(self.root.clone());
        }
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Ok(cwd.join(&self.root))
    }

    fn settings(&self, root: &Path, force_head_from_env: bool) -> UpdateSettings {
        UpdateSettings::new(root, BuildDefines::new(self.gyp_defines.clone()))
            .with_repo_url(self.llvm_repo_url.clone())
            .with_force_head_revision(self.force_head_revision || force_head_from_env)
    }

    fn fallback_script(&self, root: &Path) -> PathBuf {
        self.fallback_script.clone().unwrap_or_else(|| {
            root.join("tools")
                .join("clang")
                .join("scripts")
                .join("update.sh")
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let code = run(cli).await?;
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let root = cli.absolute_root()?;
    let settings = cli.settings(&root, std::env::var_os(FORCE_HEAD_VAR).is_some());
    let fallback = cli.fallback_script(&root);

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let locator = Arc::new(SystemToolchain {
        vs_override: cli.vs_path.clone(),
    });
    let updater = ClangUpdater::new(settings, runner.clone(), locator);

    let strategy = select_strategy(Platform::current(), updater, fallback, runner, cli.json);
    debug!(strategy = strategy.name(), root = %root.display(), "Selected update strategy");

    match strategy.execute(&cli.script_args).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("{e}");
            Ok(e.exit_code())
        }
    }
}
