//! Exclusive lock file guarding the unzip-directory replace step.
//!
//! Only one installer may delete, unpack and re-mark an install root at a
//! time. The lock is a file created with `create_new`, so acquisition is
//! atomic; a second installer fails fast instead of waiting. The file holds
//! the owner's PID and is removed when the guard is dropped. A lock left
//! behind by a crashed process must be removed by hand.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{InstallError, InstallResult};

/// Name of the lock file inside the install root.
pub const LOCK_FILE_NAME: &str = ".hubscan-install.lock";

/// Held lock on an install root. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
    _file: File,
}

impl InstallLock {
    /// Acquire the lock for `install_root`.
    ///
    /// Fails with [`InstallError::Locked`] if another holder exists.
    pub fn acquire(install_root: &Path) -> InstallResult<Self> {
        let path = install_root.join(LOCK_FILE_NAME);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|pid| format!("pid {}", pid.trim()))
                    .unwrap_or_else(|_| "an unknown process".to_string());
                return Err(InstallError::Locked { path, holder });
            }
            Err(e) => return Err(InstallError::WriteFailed { path, source: e }),
        };

        let pid = std::process::id();
        if let Err(e) = writeln!(file, "{}", pid) {
            let _ = fs::remove_file(&path);
            return Err(InstallError::WriteFailed { path, source: e });
        }

        debug!(pid, path = %path.display(), "Install lock acquired");
        Ok(Self { path, _file: file })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove install lock");
        } else {
            debug!(path = %self.path.display(), "Install lock released");
        }
    }
}
