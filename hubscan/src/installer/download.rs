//! Download of the CLI archive to a temporary file.

use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::error::{InstallError, InstallResult};
use crate::http::{HttpClient, HttpError};

const BUFFER_SIZE: usize = 64 * 1024;

/// Fetches CLI archives through an [`HttpClient`].
///
/// The archive is written to a temporary file that is removed when the
/// returned handle is dropped. Transfer failures surface as
/// [`InstallError::Download`], distinct from the extraction errors raised
/// later, so network problems and archive corruption can be told apart.
pub struct Downloader<'a, C: HttpClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: HttpClient + ?Sized> Downloader<'a, C> {
    /// Create a downloader using `client` for transport.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Download `url` into a new temporary file inside `temp_dir`.
    ///
    /// The body is streamed to disk.
    pub fn download(&self, url: &str, temp_dir: &Path) -> InstallResult<NamedTempFile> {
        debug!(url, "Downloading CLI archive");
        let download_failed = |source| InstallError::Download {
            url: url.to_string(),
            source,
        };
        let mut body = self.client.get_stream(url).map_err(download_failed)?;

        let mut file = tempfile::Builder::new()
            .prefix("scan.cli-")
            .suffix(".zip")
            .tempfile_in(temp_dir)
            .map_err(|e| InstallError::WriteFailed {
                path: temp_dir.to_path_buf(),
                source: e,
            })?;
        let temp_path = file.path().to_path_buf();
        let write_failed = |e| InstallError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        };

        let mut writer = BufWriter::new(file.as_file_mut());
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;
        loop {
            let bytes_read = body.read(&mut buffer).map_err(|e| {
                download_failed(HttpError::Transport {
                    url: url.to_string(),
                    reason: format!("Read error: {}", e),
                })
            })?;
            if bytes_read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..bytes_read])
                .map_err(write_failed)?;
            downloaded += bytes_read as u64;
        }
        writer.flush().map_err(write_failed)?;
        drop(writer);

        info!(url, bytes = downloaded, "Downloaded CLI archive");
        Ok(file)
    }
}
