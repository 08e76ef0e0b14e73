//! Scan CLI installation.
//!
//! This module keeps a local copy of the Hub scan CLI in step with a Hub:
//! - Version-aware install, upgrade and downgrade (`orchestrator`)
//! - Read-only inspection of the install root (`inspector`)
//! - Archive download and extraction (`download`, `extractor`)
//! - Recursive cleanup (`cleaner`) and install locking (`lock`)
//!
//! # Architecture
//!
//! ```text
//! CliInstaller (orchestrator)
//!         │
//!         ├── VersionResolver ─────── Hub version
//!         ├── InstallStateInspector ─ version marker, CLI home, CLI jar
//!         ├── InstallLock ─────────── exclusive lease on the install root
//!         ├── cleaner ─────────────── wipe the unzip directory
//!         ├── Downloader ──────────── HttpClient → temp file
//!         └── ArchiveExtractor ────── unpack into the unzip directory
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hubscan::installer::{CliInstaller, TracingLogger};
//! use hubscan::version::StaticVersionResolver;
//!
//! let installer = CliInstaller::new(Some("/opt/hub-scan".into()), "build-agent-7")?;
//! let resolver = StaticVersionResolver::new("https://hub.example.com", "4.1.1");
//! installer.perform_installation(&TracingLogger, &resolver)?;
//! assert!(installer.inspector().cli_exists(&TracingLogger));
//! ```

mod cleaner;
mod config;
mod download;
mod error;
mod extractor;
mod inspector;
mod location;
mod lock;
mod logger;
mod orchestrator;

pub use cleaner::{delete_dir_contents, delete_dir_recursive, delete_files_recursive};
pub use config::InstallerConfig;
pub use download::Downloader;
pub use error::{InstallError, InstallResult};
pub use extractor::{ArchiveExtractor, ZipExtractor};
pub use inspector::{
    InstallStateInspector, CLI_JAR_EXTENSION, CLI_JAR_PREFIX, CLI_UNZIP_DIR, ONE_JAR_FILE_NAME,
    VERSION_FILE_NAME,
};
pub use location::{
    archive_name, download_url, platform_archive_threshold, Platform, CLI_DOWNLOAD_LINUX,
    CLI_DOWNLOAD_MAC, CLI_DOWNLOAD_WINDOWS, DEFAULT_CLI_DOWNLOAD, DOWNLOAD_PATH,
};
pub use lock::{InstallLock, LOCK_FILE_NAME};
pub use logger::{InstallLogger, MemoryLogger, TracingLogger};
pub use orchestrator::{CliInstaller, InstallOutcome};
