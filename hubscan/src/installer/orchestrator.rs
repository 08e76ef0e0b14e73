//! Scan CLI installer.
//!
//! This module orchestrates the install workflow:
//! 1. Resolve the Hub version
//! 2. Compare it with the version marker on disk
//! 3. Take the install lock and wipe the unzip directory
//! 4. Download the archive matching the version and platform
//! 5. Unpack it and mark the new version
//!
//! Steps 3-5 run only when the marker differs from the Hub version or the
//! install on disk is incomplete.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::http::{HttpClient, ReqwestClient};
use crate::version::{ServerVersion, VersionResolver};

use super::cleaner::delete_dir_recursive;
use super::config::InstallerConfig;
use super::download::Downloader;
use super::error::{InstallError, InstallResult};
use super::extractor::{ArchiveExtractor, ZipExtractor};
use super::inspector::InstallStateInspector;
use super::location::{download_url, Platform};
use super::lock::InstallLock;
use super::logger::InstallLogger;

/// Result of [`CliInstaller::perform_installation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The installed CLI already matches the Hub version.
    UpToDate { version: String },
    /// A CLI was downloaded and unpacked.
    Installed {
        /// Version recorded before this run, if any.
        previous: Option<String>,
        /// Version now recorded.
        version: String,
        /// URL the archive was downloaded from.
        url: String,
        /// Number of files unpacked.
        files_extracted: usize,
    },
}

impl InstallOutcome {
    /// The version installed after the run.
    pub fn version(&self) -> &str {
        match self {
            Self::UpToDate { version } | Self::Installed { version, .. } => version,
        }
    }

    /// Whether anything was downloaded.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

/// Installs the scan CLI matching a Hub server.
///
/// Owns its install root for the duration of a call. Concurrent installers on
/// the same root are kept apart by an [`InstallLock`].
pub struct CliInstaller<C: HttpClient = ReqwestClient> {
    local_host_name: String,
    inspector: InstallStateInspector,
    platform: Platform,
    client: C,
    extractor: Box<dyn ArchiveExtractor>,
}

impl CliInstaller<ReqwestClient> {
    /// Create an installer for `install_root` on the machine `local_host_name`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Config`] if the directory is missing or the
    /// host name is empty.
    pub fn new(install_root: Option<PathBuf>, local_host_name: &str) -> InstallResult<Self> {
        let config = InstallerConfig {
            install_root,
            local_host_name: local_host_name.to_string(),
            ..Default::default()
        };
        Self::from_config(config)
    }

    /// Create an installer from a full configuration.
    pub fn from_config(config: InstallerConfig) -> InstallResult<Self> {
        validate(&config)?;
        let client = ReqwestClient::new(config.http.clone())
            .map_err(|e| InstallError::Config(e.to_string()))?;
        Self::with_client(config, client)
    }
}

impl<C: HttpClient> CliInstaller<C> {
    /// Create an installer that downloads through `client`.
    pub fn with_client(config: InstallerConfig, client: C) -> InstallResult<Self> {
        let install_root = validate(&config)?;
        Ok(Self {
            local_host_name: config.local_host_name,
            inspector: InstallStateInspector::for_platform(install_root, config.platform),
            platform: config.platform,
            client,
            extractor: Box::new(ZipExtractor::new()),
        })
    }

    /// Replace the archive extractor.
    pub fn with_extractor(mut self, extractor: impl ArchiveExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn local_host_name(&self) -> &str {
        &self.local_host_name
    }

    pub fn install_root(&self) -> &Path {
        self.inspector.install_root()
    }

    /// Directory the archive is unpacked into.
    pub fn cli_install_dir(&self) -> PathBuf {
        self.inspector.cli_install_dir()
    }

    /// File recording the installed version.
    pub fn version_file(&self) -> PathBuf {
        self.inspector.version_file()
    }

    /// Read-only view of the install.
    pub fn inspector(&self) -> &InstallStateInspector {
        &self.inspector
    }

    /// Download URL of the CLI for the Hub behind `resolver`.
    ///
    /// Depends only on the Hub version and the platform; nothing is written.
    pub fn cli_download_url(
        &self,
        logger: &dyn InstallLogger,
        resolver: &dyn VersionResolver,
    ) -> InstallResult<String> {
        let version = resolve_version(resolver)?;
        let url = download_url(resolver.base_url(), &version, self.platform);
        logger.info(&format!(
            "Hub version {} on {} uses the CLI at {}",
            version, self.platform, url
        ));
        Ok(url)
    }

    /// Make the install match the Hub's version.
    ///
    /// Does nothing if the version marker matches and the CLI jar resolves.
    /// Otherwise the unzip directory is replaced with a fresh download and
    /// the marker rewritten. Download and unpack failures are returned; the
    /// marker is only written after a successful unpack, so a failed run is
    /// retried in full next time.
    pub fn perform_installation(
        &self,
        logger: &dyn InstallLogger,
        resolver: &dyn VersionResolver,
    ) -> InstallResult<InstallOutcome> {
        let version = resolve_version(resolver)?;
        let previous = self.inspector.installed_version()?;

        if previous.as_deref() == Some(version.as_str()) {
            if self.inspector.cli()?.is_some() {
                logger.info(&format!(
                    "BlackDuck scan CLI {} is already installed in {}",
                    version,
                    self.cli_install_dir().display()
                ));
                return Ok(InstallOutcome::UpToDate {
                    version: version.to_string(),
                });
            }
            logger.warn(&format!(
                "BlackDuck scan CLI {} is recorded as installed but is incomplete; reinstalling",
                version
            ));
        }

        let install_root = self.install_root();
        fs::create_dir_all(install_root).map_err(|e| InstallError::CreateDirFailed {
            path: install_root.to_path_buf(),
            source: e,
        })?;
        let _lock = InstallLock::acquire(install_root)?;

        let unzip_dir = self.cli_install_dir();
        delete_dir_recursive(&unzip_dir)?;

        let url = download_url(resolver.base_url(), &version, self.platform);
        logger.info(&format!("Downloading the BlackDuck scan CLI from {}", url));
        let archive = Downloader::new(&self.client).download(&url, install_root)?;

        logger.info(&format!(
            "Unpacking {} to {}",
            archive.path().display(),
            unzip_dir.display()
        ));
        let files_extracted = match self.extractor.extract(archive.path(), &unzip_dir) {
            Ok(count) => count,
            Err(e) => {
                logger.error(&format!("Failed to unpack the BlackDuck scan CLI: {}", e));
                if let Err(cleanup) = delete_dir_recursive(&unzip_dir) {
                    logger.warn(&format!(
                        "Could not remove the partial install in {}: {}",
                        unzip_dir.display(),
                        cleanup
                    ));
                }
                return Err(e);
            }
        };

        if let Some(cli_home) = self.inspector.cli_home()? {
            mark_executables(&cli_home)?;
        }

        let version_file = self.version_file();
        fs::write(&version_file, version.as_str()).map_err(|e| InstallError::WriteFailed {
            path: version_file.clone(),
            source: e,
        })?;

        info!(
            previous = previous.as_deref().unwrap_or("none"),
            version = %version,
            files_extracted,
            "Installed BlackDuck scan CLI"
        );
        logger.info(&format!(
            "BlackDuck scan CLI {} installed in {}",
            version,
            unzip_dir.display()
        ));

        Ok(InstallOutcome::Installed {
            previous,
            version: version.to_string(),
            url,
            files_extracted,
        })
    }
}

fn validate(config: &InstallerConfig) -> InstallResult<PathBuf> {
    let install_root = config.install_root.clone().ok_or_else(|| {
        InstallError::Config("You must provide a directory to install the CLI to.".to_string())
    })?;
    if config.local_host_name.trim().is_empty() {
        return Err(InstallError::Config(
            "You must provide the hostName of the machine this is running on.".to_string(),
        ));
    }
    Ok(install_root)
}

fn resolve_version(resolver: &dyn VersionResolver) -> InstallResult<ServerVersion> {
    let raw = resolver
        .server_version()
        .map_err(|source| InstallError::VersionLookup { source })?;
    let version =
        ServerVersion::parse(&raw).map_err(|_| InstallError::InvalidVersion(raw.clone()))?;
    debug!(version = %version, "Resolved Hub version");
    Ok(version)
}

/// Zip entries often lose their mode bits; restore execute permission on the
/// launcher scripts and the bundled runtime.
#[cfg(unix)]
fn mark_executables(cli_home: &Path) -> InstallResult<()> {
    use std::os::unix::fs::PermissionsExt;

    for dir in [cli_home.join("bin"), cli_home.join("jre").join("bin")] {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let write_failed = |e| InstallError::WriteFailed {
                path: path.clone(),
                source: e,
            };
            // DirEntry metadata does not traverse symlinks; links are left alone.
            let metadata = entry.metadata().map_err(write_failed)?;
            if !metadata.file_type().is_file() {
                continue;
            }
            let mut permissions = metadata.permissions();
            permissions.set_mode(permissions.mode() | 0o755);
            fs::set_permissions(&path, permissions).map_err(write_failed)?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn mark_executables(_cli_home: &Path) -> InstallResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, HttpResult};
    use crate::installer::logger::MemoryLogger;
    use crate::version::StaticVersionResolver;
    use tempfile::TempDir;

    struct NoNetwork;

    impl HttpClient for NoNetwork {
        fn execute_get(&self, url: &str) -> HttpResult<HttpResponse> {
            panic!("unexpected request to {}", url);
        }
    }

    fn installer(root: &Path, platform: Platform) -> CliInstaller<NoNetwork> {
        let config = InstallerConfig::new(root, "TestHost").with_platform(platform);
        CliInstaller::with_client(config, NoNetwork).unwrap()
    }

    #[test]
    fn test_new_requires_directory() {
        let err = CliInstaller::new(None, "TestHost").err().unwrap();
        assert!(err
            .to_string()
            .contains("You must provide a directory to install the CLI to."));
    }

    #[test]
    fn test_new_requires_host_name() {
        let temp = TempDir::new().unwrap();
        for host in ["", "   "] {
            let err = CliInstaller::new(Some(temp.path().to_path_buf()), host)
                .err()
                .unwrap();
            assert!(matches!(err, InstallError::Config(_)));
            assert!(err
                .to_string()
                .contains("You must provide the hostName of the machine this is running on."));
        }
    }

    #[test]
    fn test_new_exposes_layout() {
        let temp = TempDir::new().unwrap();
        let installer = CliInstaller::new(Some(temp.path().to_path_buf()), "TestHost").unwrap();

        assert_eq!(installer.local_host_name(), "TestHost");
        assert_eq!(installer.install_root(), temp.path());
        assert_eq!(
            installer.cli_install_dir(),
            temp.path().join("Hub_Scan_Installation")
        );
        assert_eq!(installer.version_file(), temp.path().join("hubVersion.txt"));
        assert_eq!(installer.inspector().cli_home().unwrap(), None);
    }

    #[test]
    fn test_download_url_by_version() {
        let temp = TempDir::new().unwrap();
        let installer = installer(temp.path(), Platform::current());
        let logger = MemoryLogger::new();

        let url = installer
            .cli_download_url(&logger, &StaticVersionResolver::new("TestUrl", "3.0.0"))
            .unwrap();
        assert!(url.contains("TestUrl/download/"));

        let url = installer
            .cli_download_url(&logger, &StaticVersionResolver::new("TestUrl", "2.0.0"))
            .unwrap();
        assert_eq!(url, "TestUrl/download/scan.cli.zip");
    }

    #[test]
    fn test_download_url_has_no_side_effects() {
        let temp = TempDir::new().unwrap();
        let installer = installer(temp.path(), Platform::MacOs);
        installer
            .cli_download_url(
                &MemoryLogger::new(),
                &StaticVersionResolver::new("https://hub", "4.1.1"),
            )
            .unwrap();
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_version_is_error() {
        let temp = TempDir::new().unwrap();
        let installer = installer(temp.path(), Platform::Linux);
        let err = installer
            .perform_installation(
                &MemoryLogger::new(),
                &StaticVersionResolver::new("https://hub", "unknown"),
            )
            .unwrap_err();
        assert!(matches!(err, InstallError::InvalidVersion(v) if v == "unknown"));
    }

    #[test]
    fn test_up_to_date_install_makes_no_request() {
        let temp = TempDir::new().unwrap();
        let installer = installer(temp.path(), Platform::Linux);
        let lib = installer.cli_install_dir().join("scan.cli-4.1.1").join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("scan.cli-4.1.1.jar"), b"").unwrap();
        fs::write(installer.version_file(), "4.1.1").unwrap();

        let outcome = installer
            .perform_installation(
                &MemoryLogger::new(),
                &StaticVersionResolver::new("https://hub", "4.1.1"),
            )
            .unwrap();
        assert_eq!(
            outcome,
            InstallOutcome::UpToDate {
                version: "4.1.1".to_string()
            }
        );
        assert!(!outcome.changed());
    }

    #[cfg(unix)]
    #[test]
    fn test_mark_executables_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let java = temp.path().join("jre").join("bin").join("java");
        fs::create_dir_all(java.parent().unwrap()).unwrap();
        fs::write(&java, b"").unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o644)).unwrap();

        mark_executables(temp.path()).unwrap();

        let mode = fs::metadata(&java).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[cfg(unix)]
    #[test]
    fn test_mark_executables_skips_symlinks() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, b"keep").unwrap();
        fs::set_permissions(&outside, fs::Permissions::from_mode(0o600)).unwrap();

        let home = temp.path().join("scan.cli");
        let bin = home.join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("scan.cli.sh"), b"#!/bin/sh\n").unwrap();
        symlink(&outside, bin.join("linked")).unwrap();

        mark_executables(&home).unwrap();

        let outside_mode = fs::metadata(&outside).unwrap().permissions().mode() & 0o777;
        assert_eq!(outside_mode, 0o600);
        let script_mode = fs::metadata(bin.join("scan.cli.sh")).unwrap().permissions().mode();
        assert_eq!(script_mode & 0o755, 0o755);
    }
}
