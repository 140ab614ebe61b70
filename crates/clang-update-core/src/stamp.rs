//! Revision stamp persistence
//!
//! The stamp records the revision of the last run that finished every
//! step. It is blanked before a run mutates anything and rewritten only at
//! the end, so an interrupted run is always seen as out of date.

use crate::config::Revision;
use crate::error::UpdateError;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampFile {
    path: PathBuf,
}

impl StampFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents, or `""` when the stamp is missing or unreadable.
    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }

    /// Replace the contents, creating the parent directory if needed.
    pub fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UpdateError::io(parent, e))?;
        }
        std::fs::write(&self.path, contents).map_err(|e| UpdateError::io(&self.path, e))?;
        debug!(stamp = %self.path.display(), contents, "Wrote stamp file");
        Ok(())
    }

    /// Mark the tree as not provisioned.
    pub fn clear(&self) -> Result<()> {
        self.write("")
    }

    /// Record a completed run.
    pub fn commit(&self, revision: &Revision) -> Result<()> {
        self.write(revision.as_str())
    }
}
