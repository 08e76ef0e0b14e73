//! Configuration for the CLI installer.

use std::path::PathBuf;
use std::time::Duration;

use crate::http::{HttpSettings, ProxyConfig};

use super::location::Platform;

/// Configuration for a [`CliInstaller`](super::CliInstaller).
///
/// Built once and handed to the installer; nothing here changes while an
/// installation runs.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Directory the CLI and its version marker are installed into.
    pub install_root: Option<PathBuf>,

    /// Host name of the machine running the installer.
    pub local_host_name: String,

    /// HTTP settings (timeout, proxy, certificate trust) for downloads.
    pub http: HttpSettings,

    /// Platform whose archive is downloaded.
    ///
    /// Defaults to the platform this binary runs on.
    pub platform: Platform,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            install_root: None,
            local_host_name: String::new(),
            http: HttpSettings::default(),
            platform: Platform::current(),
        }
    }
}

impl InstallerConfig {
    /// Create a new configuration for the given install root and host.
    pub fn new(install_root: impl Into<PathBuf>, local_host_name: impl Into<String>) -> Self {
        Self {
            install_root: Some(install_root.into()),
            local_host_name: local_host_name.into(),
            ..Default::default()
        }
    }

    /// Set the proxy used for downloads.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.http.proxy = proxy;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Accept any server certificate.
    pub fn with_trust_server_certificate(mut self, trust: bool) -> Self {
        self.http.trust_server_certificate = trust;
        self
    }

    /// Override the platform whose archive is installed.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}
