//! Settings shared across CLI commands.
//!
//! Command-line arguments take precedence over the config file, which takes
//! precedence over built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, ValueEnum};
use hubscan::config::ConfigFile;
use hubscan::http::{HttpSettings, ReqwestClient};
use hubscan::installer::{InstallerConfig, Platform};
use hubscan::version::{RemoteVersionResolver, StaticVersionResolver, VersionResolver};

use crate::error::CliError;

/// Connection and install options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Hub server URL
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Directory to install the scan CLI into
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Host name reported for this machine
    #[arg(long, global = true, value_name = "NAME")]
    pub host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Accept any server certificate
    #[arg(long, global = true)]
    pub trust_cert: bool,

    #[arg(long, global = true, value_name = "HOST")]
    pub proxy_host: Option<String>,

    #[arg(long, global = true, value_name = "PORT")]
    pub proxy_port: Option<u16>,

    #[arg(long, global = true, value_name = "USER")]
    pub proxy_user: Option<String>,

    #[arg(long, global = true, value_name = "PASSWORD", env = "HUBSCAN_PROXY_PASSWORD")]
    pub proxy_password: Option<String>,
}

/// Platform selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PlatformArg {
    Windows,
    Linux,
    Macos,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Linux => Platform::Linux,
            PlatformArg::Macos => Platform::MacOs,
        }
    }
}

/// Effective settings after merging arguments, config file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hub_url: Option<String>,
    pub installer: InstallerConfig,
}

impl GlobalArgs {
    /// Merge with the config file.
    pub fn resolve(&self, config: &ConfigFile) -> Settings {
        let mut file = config.clone();

        if let Some(url) = &self.url {
            file.server.url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout {
            file.server.timeout_secs = timeout;
        }
        if self.trust_cert {
            file.server.trust_server_certificate = true;
        }
        if let Some(host) = &self.proxy_host {
            file.proxy.host = Some(host.clone());
        }
        if let Some(port) = self.proxy_port {
            file.proxy.port = Some(port);
        }
        if let Some(user) = &self.proxy_user {
            file.proxy.username = Some(user.clone());
        }
        if let Some(password) = &self.proxy_password {
            file.proxy.password = Some(password.clone());
        }
        if let Some(dir) = &self.dir {
            file.install.directory = Some(dir.clone());
        }
        if let Some(host) = &self.host {
            file.install.host_name = Some(host.clone());
        }

        let mut installer = file.installer_config();
        if installer.install_root.is_none() {
            installer.install_root = default_install_dir();
        }
        if installer.local_host_name.is_empty() {
            installer.local_host_name = default_host_name().unwrap_or_default();
        }

        Settings {
            hub_url: file.server.url,
            installer,
        }
    }
}

impl Settings {
    pub fn http(&self) -> &HttpSettings {
        &self.installer.http
    }

    /// The Hub URL, which every networked command needs.
    pub fn require_url(&self) -> Result<&str, CliError> {
        self.hub_url.as_deref().ok_or_else(|| {
            CliError::Config(
                "No Hub URL. Set url in the [server] section of config.ini or use --url"
                    .to_string(),
            )
        })
    }

    pub fn require_dir(&self) -> Result<&PathBuf, CliError> {
        self.installer.install_root.as_ref().ok_or_else(|| {
            CliError::Config(
                "No install directory. Set directory in the [install] section of config.ini or use --dir"
                    .to_string(),
            )
        })
    }

    /// Version resolver: a fixed version when given, else the Hub's own.
    pub fn resolver(&self, hub_version: Option<String>) -> Result<Box<dyn VersionResolver>, CliError> {
        let url = self.require_url()?;
        match hub_version {
            Some(version) => Ok(Box::new(StaticVersionResolver::new(url, version))),
            None => {
                let client = ReqwestClient::new(self.http().clone())?;
                Ok(Box::new(RemoteVersionResolver::new(client, url)))
            }
        }
    }
}

fn default_install_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("hubscan"))
}

const HOST_NAME_VARS: &[&str] = &["HOSTNAME", "COMPUTERNAME"];
const HOST_NAME_FILES: &[&str] = &["/etc/hostname", "/proc/sys/kernel/hostname"];

fn default_host_name() -> Option<String> {
    let files: Vec<&Path> = HOST_NAME_FILES.iter().map(Path::new).collect();
    find_host_name(|var| std::env::var(var).ok(), &files)
}

/// First non-blank host name from the environment, then from host name files.
fn find_host_name(env: impl Fn(&str) -> Option<String>, files: &[&Path]) -> Option<String> {
    let from_env = HOST_NAME_VARS.iter().filter_map(|var| env(var));
    let from_files = files
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok());
    from_env
        .chain(from_files)
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
}

/// Timeout as shown to users.
pub fn describe_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}
