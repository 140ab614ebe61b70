//! Filesystem helpers: permission-tolerant removal and flat copies.

use crate::error::UpdateError;
use crate::Result;
use regex::Regex;
use std::fs::{self, Permissions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Recursively delete `dir`.
///
/// Subversion leaves read-only files behind. When a removal fails with a
/// permission error, the read-only bit is cleared on the failing path and
/// its parent, and that single removal is retried once. Any other error
/// aborts the deletion.
pub fn rm_tree(dir: &Path) -> Result<()> {
    let entries = with_permission_retry(dir, || fs::read_dir(dir))?;

    for entry in entries {
        let entry = entry.map_err(|e| UpdateError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| UpdateError::io(&path, e))?;

        if file_type.is_dir() {
            rm_tree(&path)?;
        } else {
            with_permission_retry(&path, || fs::remove_file(&path))?;
        }
    }

    with_permission_retry(dir, || fs::remove_dir(dir))
}

fn with_permission_retry<T, F>(path: &Path, mut op: F) -> Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    match op() {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            if !make_writable(path)? {
                return Err(UpdateError::io(path, e));
            }
            debug!(path = %path.display(), "Cleared read-only bit, retrying");
            op().map_err(|e| UpdateError::io(path, e))
        }
        Err(e) => Err(UpdateError::io(path, e)),
    }
}

/// Make `path` and its parent owner-writable. Returns whether anything changed.
fn make_writable(path: &Path) -> Result<bool> {
    let mut relaxed = false;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    for target in [Some(path), parent].into_iter().flatten() {
        let perms = fs::symlink_metadata(target)
            .map_err(|e| UpdateError::io(target, e))?
            .permissions();
        if perms.readonly() {
            fs::set_permissions(target, owner_writable(perms))
                .map_err(|e| UpdateError::io(target, e))?;
            relaxed = true;
        }
    }
    Ok(relaxed)
}

#[cfg(unix)]
fn owner_writable(perms: Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(perms.mode() | 0o200)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn owner_writable(mut perms: Permissions) -> Permissions {
    perms.set_readonly(false);
    perms
}

/// Delete `dir` if it is a directory. Returns whether it was removed.
pub fn clobber_dir(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    rm_tree(dir)?;
    Ok(true)
}

/// Copy `src` into the directory `dst_dir`, keeping its file name.
pub fn copy_file(src: &Path, dst_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| UpdateError::Config(format!("{} has no file name", src.display())))?;
    let dst = dst_dir.join(name);
    fs::copy(src, &dst).map_err(|e| UpdateError::io(src, e))?;
    info!("Copying {} to {}", src.display(), dst_dir.display());
    Ok(dst)
}

/// Copy every file under `src` (recursively) flat into `dst`.
///
/// With a `filter`, only files whose name matches are copied. `dst` is
/// created when missing; a missing `src` is an error.
pub fn copy_directory_contents(
    src: &Path,
    dst: &Path,
    filter: Option<&Regex>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dst).map_err(|e| UpdateError::io(dst, e))?;

    let mut copied = Vec::new();
    for file in walk_files(src)? {
        let matches = match (filter, file.file_name()) {
            (None, _) => true,
            (Some(re), Some(name)) => re.is_match(&name.to_string_lossy()),
            (Some(_), None) => false,
        };
        if matches {
            copied.push(copy_file(&file, dst)?);
        }
    }
    Ok(copied)
}

/// All files below `dir`, in sorted order.
///
/// Directory symlinks are not descended into. A symlink to a regular file
/// is listed like the file itself.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<(PathBuf, fs::FileType)> = fs::read_dir(dir)
        .map_err(|e| UpdateError::io(dir, e))?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<io::Result<_>>()
        .map_err(|e| UpdateError::io(dir, e))?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut files = Vec::new();
    for (path, file_type) in entries {
        if file_type.is_dir() {
            files.extend(walk_files(&path)?);
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            files.push(path);
        }
    }
    Ok(files)
}
