//! Verification that a URL belongs to a Hub server.
//!
//! Two requests are made, stopping at the first unexpected failure:
//!
//! 1. The base URL. A success, or a 401/403 challenge, is accepted; a Hub
//!    blocks anonymous access, so a challenge is the expected answer.
//! 2. The CLI download resource. Any non-success status means the URL is not
//!    a Hub.

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{join_url, HttpClient, HttpResult, HttpSettings, ReqwestClient};
use crate::installer::{DEFAULT_CLI_DOWNLOAD, DOWNLOAD_PATH};

/// Result type for server verification.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Errors raised while verifying a Hub URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The URL could not be parsed or is not HTTP(S).
    #[error("The Url does not appear to be a Hub server :{url}, because: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport-level failure talking to the server.
    #[error("Could not connect to {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The base URL answered with a status other than success, 401 or 403.
    #[error("The Url {url} responded with {status} : {message}")]
    Rejected {
        url: String,
        status: u16,
        message: String,
    },

    /// The CLI download resource is not served.
    #[error("The Url does not appear to be a Hub server :{url}, because: {status} : {message}")]
    NotHubServer {
        url: String,
        status: u16,
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Confirms a URL points at a Hub server.
pub struct ServerIdentityVerifier<C: HttpClient = ReqwestClient> {
    hub_url: String,
    client: C,
}

impl ServerIdentityVerifier<ReqwestClient> {
    /// Create a verifier using a reqwest client built from `settings`.
    pub fn new(hub_url: &str, settings: HttpSettings) -> VerifyResult<Self> {
        let client = ReqwestClient::new(settings).map_err(|e| VerifyError::Client(e.to_string()))?;
        Self::with_client(hub_url, client)
    }
}

impl<C: HttpClient> ServerIdentityVerifier<C> {
    /// Create a verifier that talks through `client`.
    pub fn with_client(hub_url: &str, client: C) -> VerifyResult<Self> {
        let parsed = Url::parse(hub_url).map_err(|e| VerifyError::InvalidUrl {
            url: hub_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(VerifyError::InvalidUrl {
                url: hub_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            hub_url: hub_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// URL of the resource every Hub serves.
    pub fn download_url(&self) -> String {
        join_url(
            &self.hub_url,
            &format!("{}/{}", DOWNLOAD_PATH, DEFAULT_CLI_DOWNLOAD),
        )
    }

    /// Run both checks.
    pub fn verify_is_hub_server(&self) -> VerifyResult<()> {
        self.check_base_url()?;
        self.check_download_resource()?;
        info!(url = %self.hub_url, "Verified Hub server");
        Ok(())
    }

    fn check_base_url(&self) -> VerifyResult<()> {
        let response = transport(&self.hub_url, self.client.probe(&self.hub_url))?;
        match response.status {
            _ if response.is_success() => Ok(()),
            401 | 403 => {
                debug!(url = %self.hub_url, status = response.status, "Base URL requires authentication");
                Ok(())
            }
            status => Err(VerifyError::Rejected {
                url: self.hub_url.clone(),
                status,
                message: response.message,
            }),
        }
    }

    fn check_download_resource(&self) -> VerifyResult<()> {
        let url = self.download_url();
        let response = transport(&url, self.client.probe(&url))?;
        if response.is_success() {
            Ok(())
        } else {
            Err(VerifyError::NotHubServer {
                url,
                status: response.status,
                message: response.message,
            })
        }
    }
}

fn transport<T>(url: &str, result: HttpResult<T>) -> VerifyResult<T> {
    result.map_err(|e| VerifyError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
