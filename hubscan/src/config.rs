//! Configuration file support.
//!
//! Settings live in an INI file at `<config dir>/hubscan/config.ini`:
//!
//! ```ini
//! [server]
//! url = https://hub.example.com
//! timeout_secs = 300
//! trust_server_certificate = false
//!
//! [proxy]
//! host = proxy.example.com
//! port = 3128
//! username = scanner
//! password = secret
//!
//! [install]
//! directory = /opt/hubscan
//! host_name = build-agent-01
//! ```
//!
//! Every key is optional. Command-line arguments override file values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::http::{HttpSettings, ProxyConfig, DEFAULT_TIMEOUT_SECS};
use crate::installer::InstallerConfig;

const SERVER_SECTION: &str = "server";
const PROXY_SECTION: &str = "proxy";
const INSTALL_SECTION: &str = "install";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Location of the configuration file.
///
/// Falls back to the current directory when the platform has no config dir.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hubscan")
        .join("config.ini")
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub trust_server_certificate: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            trust_server_certificate: false,
        }
    }
}

/// `[proxy]` section.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

impl ProxySettings {
    pub fn to_proxy_config(&self) -> ProxyConfig {
        let mut proxy = ProxyConfig::none();
        if let Some(host) = &self.host {
            proxy = proxy.with_host(host.clone());
        }
        if let Some(port) = self.port {
            proxy = proxy.with_port(port);
        }
        if let Some(username) = &self.username {
            proxy = proxy.with_username(username.clone());
        }
        if let Some(password) = &self.password {
            proxy = proxy.with_password(password.clone());
        }
        proxy
    }
}

/// `[install]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSettings {
    pub directory: Option<PathBuf>,
    pub host_name: Option<String>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub proxy: ProxySettings,
    pub install: InstallSettings,
}

impl ConfigFile {
    /// Load from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ini(&ini)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let get = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let mut config = Self::default();

        config.server.url = get(SERVER_SECTION, "url");
        if let Some(value) = get(SERVER_SECTION, "timeout_secs") {
            config.server.timeout_secs = parse_value("server.timeout_secs", &value)?;
        }
        if let Some(value) = get(SERVER_SECTION, "trust_server_certificate") {
            config.server.trust_server_certificate =
                parse_bool("server.trust_server_certificate", &value)?;
        }

        config.proxy.host = get(PROXY_SECTION, "host");
        if let Some(value) = get(PROXY_SECTION, "port") {
            config.proxy.port = Some(parse_value("proxy.port", &value)?);
        }
        config.proxy.username = get(PROXY_SECTION, "username");
        config.proxy.password = get(PROXY_SECTION, "password");

        config.install.directory = get(INSTALL_SECTION, "directory").map(PathBuf::from);
        config.install.host_name = get(INSTALL_SECTION, "host_name");

        Ok(config)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        {
            let mut server = ini.with_section(Some(SERVER_SECTION));
            if let Some(url) = &self.server.url {
                server.set("url", url.as_str());
            }
            server
                .set("timeout_secs", self.server.timeout_secs.to_string())
                .set(
                    "trust_server_certificate",
                    self.server.trust_server_certificate.to_string(),
                );
        }

        {
            let mut proxy = ini.with_section(Some(PROXY_SECTION));
            if let Some(host) = &self.proxy.host {
                proxy.set("host", host.as_str());
            }
            if let Some(port) = self.proxy.port {
                proxy.set("port", port.to_string());
            }
            if let Some(username) = &self.proxy.username {
                proxy.set("username", username.as_str());
            }
            if let Some(password) = &self.proxy.password {
                proxy.set("password", password.as_str());
            }
        }

        {
            let mut install = ini.with_section(Some(INSTALL_SECTION));
            if let Some(directory) = &self.install.directory {
                install.set("directory", directory.display().to_string());
            }
            if let Some(host_name) = &self.install.host_name {
                install.set("host_name", host_name.as_str());
            }
        }

        ini
    }

    /// HTTP settings described by the `[server]` and `[proxy]` sections.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings::default()
            .with_timeout(Duration::from_secs(self.server.timeout_secs))
            .with_proxy(self.proxy.to_proxy_config())
            .with_trust_server_certificate(self.server.trust_server_certificate)
    }

    /// Installer configuration described by the file.
    pub fn installer_config(&self) -> InstallerConfig {
        InstallerConfig {
            install_root: self.install.directory.clone(),
            local_host_name: self.install.host_name.clone().unwrap_or_default(),
            http: self.http_settings(),
            ..Default::default()
        }
    }
}

/// A single `section.key` setting, addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerUrl,
    ServerTimeoutSecs,
    ServerTrustServerCertificate,
    ProxyHost,
    ProxyPort,
    ProxyUsername,
    ProxyPassword,
    InstallDirectory,
    InstallHostName,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::ServerUrl,
            Self::ServerTimeoutSecs,
            Self::ServerTrustServerCertificate,
            Self::ProxyHost,
            Self::ProxyPort,
            Self::ProxyUsername,
            Self::ProxyPassword,
            Self::InstallDirectory,
            Self::InstallHostName,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::ServerUrl | Self::ServerTimeoutSecs | Self::ServerTrustServerCertificate => {
                SERVER_SECTION
            }
            Self::ProxyHost | Self::ProxyPort | Self::ProxyUsername | Self::ProxyPassword => {
                PROXY_SECTION
            }
            Self::InstallDirectory | Self::InstallHostName => INSTALL_SECTION,
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ServerUrl => "url",
            Self::ServerTimeoutSecs => "timeout_secs",
            Self::ServerTrustServerCertificate => "trust_server_certificate",
            Self::ProxyHost => "host",
            Self::ProxyPort => "port",
            Self::ProxyUsername => "username",
            Self::ProxyPassword => "password",
            Self::InstallDirectory => "directory",
            Self::InstallHostName => "host_name",
        }
    }

    /// `section.key` form.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset. The proxy password is masked.
    pub fn get(&self, config: &ConfigFile) -> String {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            Self::ServerUrl => optional(&config.server.url),
            Self::ServerTimeoutSecs => config.server.timeout_secs.to_string(),
            Self::ServerTrustServerCertificate => {
                config.server.trust_server_certificate.to_string()
            }
            Self::ProxyHost => optional(&config.proxy.host),
            Self::ProxyPort => config.proxy.port.map(|p| p.to_string()).unwrap_or_default(),
            Self::ProxyUsername => optional(&config.proxy.username),
            Self::ProxyPassword => config
                .proxy
                .password
                .as_ref()
                .map(|_| "********".to_string())
                .unwrap_or_default(),
            Self::InstallDirectory => config
                .install
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            Self::InstallHostName => optional(&config.install.host_name),
        }
    }

    /// Set the value from text. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
        let name = self.name();
        match self {
            Self::ServerUrl => config.server.url = optional(value),
            Self::ServerTimeoutSecs => config.server.timeout_secs = parse_value(&name, value)?,
            Self::ServerTrustServerCertificate => {
                config.server.trust_server_certificate = parse_bool(&name, value)?
            }
            Self::ProxyHost => config.proxy.host = optional(value),
            Self::ProxyPort => {
                config.proxy.port = match value {
                    "" => None,
                    port => Some(parse_value(&name, port)?),
                }
            }
            Self::ProxyUsername => config.proxy.username = optional(value),
            Self::ProxyPassword => config.proxy.password = optional(value),
            Self::InstallDirectory => config.install.directory = optional(value).map(PathBuf::from),
            Self::InstallHostName => config.install.host_name = optional(value),
        }
        Ok(())
    }
}

impl std::str::FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_value<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
