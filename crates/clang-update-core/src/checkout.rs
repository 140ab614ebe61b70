//! Subversion checkout of the LLVM source modules.

use crate::config::{PathLayout, Revision};
use crate::fs_ops::rm_tree;
use crate::runner::{CommandRunner, CommandSpec};
use crate::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// One independently versioned source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    /// Name used in progress messages.
    pub name: String,

    /// Repository URL (without revision).
    pub url: String,

    /// Checkout destination.
    pub dir: PathBuf,
}

impl SourceModule {
    pub fn new(name: impl Into<String>, url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            dir: dir.into(),
        }
    }

    /// LLVM, then the modules nested inside its tree.
    ///
    /// Order matters: the nested checkouts need their parent to exist.
    pub fn llvm_modules(repo_url: &str, layout: &PathLayout) -> Vec<SourceModule> {
        let repo_url = repo_url.trim_end_matches('/');
        vec![
            SourceModule::new("LLVM", format!("{repo_url}/llvm/trunk"), &layout.llvm_dir),
            SourceModule::new("Clang", format!("{repo_url}/cfe/trunk"), &layout.clang_dir),
            SourceModule::new("LLD", format!("{repo_url}/lld/trunk"), &layout.lld_dir),
            SourceModule::new(
                "compiler-rt",
                format!("{repo_url}/compiler-rt/trunk"),
                &layout.compiler_rt_dir,
            ),
        ]
    }

    /// `svn checkout --force <url>@<rev> <dir>`
    pub fn checkout_command(&self, revision: &Revision) -> CommandSpec {
        CommandSpec::new(
            "svn",
            [
                "checkout".to_string(),
                "--force".to_string(),
                format!("{}@{}", self.url, revision),
                self.dir.display().to_string(),
            ],
        )
    }
}

/// Check out `module` at `revision`.
///
/// A failed first attempt is assumed to come from a broken working copy:
/// the destination is deleted and the checkout retried once. A second
/// failure is fatal.
pub async fn checkout(
    runner: &dyn CommandRunner,
    module: &SourceModule,
    revision: &Revision,
) -> Result<()> {
    info!(
        "Checking out {} r{} into '{}'",
        module.name,
        revision,
        module.dir.display()
    );

    let command = module.checkout_command(revision);
    match runner.run(&command).await {
        Ok(outcome) if outcome.passed() => return Ok(()),
        Ok(outcome) => {
            warn!(module = %module.name, exit_code = outcome.exit_code, "Checkout failed");
        }
        Err(e) => {
            warn!(module = %module.name, error = %e, "Checkout failed");
        }
    }

    if module.dir.is_dir() {
        info!("Removing {}.", module.dir.display());
        rm_tree(&module.dir)?;
    }

    info!("Retrying.");
    runner.run_checked(&command).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_llvm_modules_order_and_urls() {
        let layout = PathLayout::new(Path::new("/src"));
        let modules = SourceModule::llvm_modules("https://llvm.org/svn/llvm-project/", &layout);

        let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["LLVM", "Clang", "LLD", "compiler-rt"]);
        assert_eq!(modules[1].url, "https://llvm.org/svn/llvm-project/cfe/trunk");
        assert_eq!(modules[3].dir, layout.compiler_rt_dir);
        for nested in &modules[1..] {
            assert!(nested.dir.starts_with(&modules[0].dir));
        }
    }

    #[test]
    fn test_checkout_command() {
        let module = SourceModule::new("LLD", "https://example.org/lld/trunk", "/src/lld");
        let spec = module.checkout_command(&Revision::from("232554"));
        assert_eq!(spec.program, "svn");
        assert_eq!(
            spec.args,
            ["checkout", "--force", "https://example.org/lld/trunk@232554", "/src/lld"]
        );
        assert!(spec.env_setup.is_none());
    }
}
