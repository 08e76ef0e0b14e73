//! CLI error type.

use hubscan::config::ConfigError;
use hubscan::http::HttpError;
use hubscan::version::VersionParseError;
use hubscan::{InstallError, VerifyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("invalid Hub version: {0}")]
    Version(#[from] VersionParseError),

    /// The command ran but the install is not usable.
    #[error("{0}")]
    NotInstalled(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::ConfigFile(_) => 2,
            Self::NotInstalled(_) => 3,
            _ => 1,
        }
    }
}
