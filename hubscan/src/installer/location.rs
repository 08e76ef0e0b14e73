//! Where the scan CLI archive lives on the Hub.
//!
//! Hubs before 3.0.0 publish a single archive. From 3.0.0 onwards each
//! platform has its own archive, bundling a matching Java runtime.

use std::fmt;

use crate::http::join_url;
use crate::version::ServerVersion;

/// Archive served by every Hub; the only archive before 3.0.0.
pub const DEFAULT_CLI_DOWNLOAD: &str = "scan.cli.zip";

/// Windows archive (Hub 3.0.0 and later).
pub const CLI_DOWNLOAD_WINDOWS: &str = "scan.cli-windows.zip";

/// macOS archive (Hub 3.0.0 and later).
pub const CLI_DOWNLOAD_MAC: &str = "scan.cli-macosx.zip";

/// Linux archive (Hub 3.0.0 and later).
pub const CLI_DOWNLOAD_LINUX: &str = "scan.cli-linux.zip";

/// Path segment under the Hub base URL holding the archives.
pub const DOWNLOAD_PATH: &str = "download";

/// First Hub version publishing per-platform archives.
pub fn platform_archive_threshold() -> ServerVersion {
    ServerVersion::new(3, 0, 0)
}

/// Operating system family used to choose an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name to a platform.
    pub fn from_os(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" | "mac os x" | "darwin" => Self::MacOs,
            _ => Self::Other,
        }
    }

    /// File name of the Java runtime binary inside `jre/bin`.
    pub fn java_binary(&self) -> &'static str {
        match self {
            Self::Windows => "java.exe",
            _ => "java",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Choose the archive name for a Hub version and platform.
pub fn archive_name(version: &ServerVersion, platform: Platform) -> &'static str {
    if *version < platform_archive_threshold() {
        return DEFAULT_CLI_DOWNLOAD;
    }
    match platform {
        Platform::Windows => CLI_DOWNLOAD_WINDOWS,
        Platform::MacOs => CLI_DOWNLOAD_MAC,
        Platform::Linux => CLI_DOWNLOAD_LINUX,
        Platform::Other => DEFAULT_CLI_DOWNLOAD,
    }
}

/// `<base_url>/download/<archive>`.
pub fn download_url(base_url: &str, version: &ServerVersion, platform: Platform) -> String {
    join_url(
        base_url,
        &format!("{}/{}", DOWNLOAD_PATH, archive_name(version, platform)),
    )
}
