//! Error types for the CLI installer.

use std::io;
use std::path::PathBuf;

use crate::http::HttpError;

/// Result type for installer operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur while installing the scan CLI.
///
/// State inspection never produces these for missing files; an absent or
/// partial install is reported as `None` by the inspector.
#[derive(Debug)]
pub enum InstallError {
    /// Invalid installer configuration.
    Config(String),

    /// The Hub version could not be obtained.
    VersionLookup { source: HttpError },

    /// The Hub reported a version that is not a dotted numeric tuple.
    InvalidVersion(String),

    /// Failed to download the CLI archive.
    Download { url: String, source: HttpError },

    /// Archive extraction failed.
    Extraction { path: PathBuf, reason: String },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to delete a file or directory.
    DeleteFailed { path: PathBuf, source: io::Error },

    /// Another installation holds the install lock.
    Locked { path: PathBuf, holder: String },
}

impl InstallError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Network failures and lock contention are transient; everything else
    /// needs operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::VersionLookup { source } | Self::Download { source, .. } => {
                source.is_transport() || source.status().is_some_and(|s| s >= 500)
            }
            Self::Locked { .. } => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Self::VersionLookup { source } => {
                write!(f, "failed to determine the Hub version: {}", source)
            }
            Self::InvalidVersion(version) => {
                write!(f, "the Hub reported an unusable version '{}'", version)
            }
            Self::Download { url, source } => {
                write!(f, "failed to download {}: {}", url, source)
            }
            Self::Extraction { path, reason } => {
                write!(f, "failed to extract {}: {}", path.display(), reason)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DeleteFailed { path, source } => {
                write!(f, "failed to delete {}: {}", path.display(), source)
            }
            Self::Locked { path, holder } => {
                write!(
                    f,
                    "install directory is locked by {} ({}); is another installation running?",
                    holder,
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for InstallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::VersionLookup { source } => Some(source),
            Self::Download { source, .. } => Some(source),
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::DeleteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
