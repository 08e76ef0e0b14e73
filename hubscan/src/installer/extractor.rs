//! Archive extraction for CLI installation.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use super::error::{InstallError, InstallResult};

/// Unpacks a downloaded archive into a destination directory.
pub trait ArchiveExtractor {
    /// Extract `archive_path` into `dest_dir`, creating it if needed.
    ///
    /// Returns the number of files extracted. On failure the destination may
    /// hold partial output; callers discard it.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> InstallResult<usize>;
}

/// Zip extractor backed by the `zip` crate.
///
/// Entry names that would escape the destination are rejected by the crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new zip extractor.
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> InstallResult<usize> {
        let extraction_failed = |reason: String| InstallError::Extraction {
            path: archive_path.to_path_buf(),
            reason,
        };

        let file = File::open(archive_path).map_err(|e| InstallError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| extraction_failed(e.to_string()))?;

        let files = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .count();
        if files == 0 {
            return Err(extraction_failed("archive contains no files".to_string()));
        }

        fs::create_dir_all(dest_dir).map_err(|e| InstallError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        archive
            .extract(dest_dir)
            .map_err(|e| extraction_failed(e.to_string()))?;

        debug!(
            archive = %archive_path.display(),
            dest = %dest_dir.display(),
            files,
            "Extracted archive"
        );
        Ok(files)
    }
}
