//! Recursive deletion used to give each install a clean slate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::error::{InstallError, InstallResult};

/// Delete each entry and, for directories, everything beneath it.
///
/// Directories are emptied depth-first before being removed. Entries that are
/// already gone are skipped, so calling this twice is harmless. Only the
/// supplied entries and their descendants are removed; their parent is left
/// in place. Symlinks are removed, never followed.
pub fn delete_files_recursive(files: &[PathBuf]) -> InstallResult<()> {
    for file in files {
        delete_entry(file)?;
    }
    Ok(())
}

/// Remove everything inside `dir`, keeping `dir` itself.
///
/// A missing directory is treated as already empty.
pub fn delete_dir_contents(dir: &Path) -> InstallResult<()> {
    let children = match list_dir(dir) {
        Ok(children) => children,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(InstallError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };
    delete_files_recursive(&children)
}

/// Remove `dir` and everything inside it. A missing directory is a no-op.
pub fn delete_dir_recursive(dir: &Path) -> InstallResult<()> {
    delete_entry(dir)
}

fn delete_entry(path: &Path) -> InstallResult<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(InstallError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    if metadata.is_dir() {
        delete_dir_contents(path)?;
        remove(path, fs::remove_dir(path))
    } else {
        remove(path, fs::remove_file(path))
    }
}

fn remove(path: &Path, result: io::Result<()>) -> InstallResult<()> {
    match result {
        Ok(()) => {
            trace!(path = %path.display(), "Deleted");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn list_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect()
}
