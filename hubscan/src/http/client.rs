//! HTTP client abstraction and the reqwest-backed implementation.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderValue, PROXY_AUTHENTICATE};
use reqwest::{Proxy, StatusCode};
use tracing::{debug, warn};

use super::digest::{generate_cnonce, DigestChallenge};
use super::error::{HttpError, HttpResult};
use super::proxy::{ProxyAuthMode, ProxyConfig};
use super::tunnel::{connect_authority, connect_reply, is_tunneled};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase for the status (may be empty).
    pub message: String,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let message = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            message,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-success response into [`HttpError::Status`].
    pub fn error_for_status(self, url: &str) -> HttpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::Status {
                url: url.to_string(),
                status: self.status,
                message: self.message,
            })
        }
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response whatever its status.
    ///
    /// Only transport failures are errors.
    fn execute_get(&self, url: &str) -> HttpResult<HttpResponse>;

    /// Performs an HTTP GET request without reading the body.
    ///
    /// Used to check that a resource exists without downloading it. The
    /// default implementation falls back to [`execute_get`](Self::execute_get).
    fn probe(&self, url: &str) -> HttpResult<HttpResponse> {
        self.execute_get(url)
    }

    /// Performs an HTTP GET request and returns the body of a 2xx response.
    fn get_bytes(&self, url: &str) -> HttpResult<Vec<u8>> {
        self.execute_get(url)?
            .error_for_status(url)
            .map(|response| response.body)
    }

    /// Performs an HTTP GET request and returns a reader over the body of a
    /// 2xx response.
    ///
    /// The default implementation buffers the body via
    /// [`get_bytes`](Self::get_bytes).
    fn get_stream(&self, url: &str) -> HttpResult<Box<dyn Read + Send>> {
        let body = self.get_bytes(url)?;
        Ok(Box::new(std::io::Cursor::new(body)))
    }
}

/// Settings shared by every request a [`ReqwestClient`] makes.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Request timeout.
    pub timeout: Duration,
    /// Proxy policy.
    pub proxy: ProxyConfig,
    /// Accept any server certificate.
    pub trust_server_certificate: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: ProxyConfig::none(),
            trust_server_certificate: false,
        }
    }
}

impl HttpSettings {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the proxy policy.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    /// Enable or disable server certificate validation.
    pub fn with_trust_server_certificate(mut self, trust: bool) -> Self {
        self.trust_server_certificate = trust;
        self
    }
}

/// Real HTTP client implementation using blocking reqwest.
///
/// Authenticated proxies are offered Basic credentials up front. When the
/// proxy answers `407` with a Digest challenge the request is repeated once
/// with a Digest `Proxy-Authorization` header.
#[derive(Debug)]
pub struct ReqwestClient {
    client: Client,
    settings: HttpSettings,
}

impl ReqwestClient {
    /// Creates a new client for the given settings.
    pub fn new(settings: HttpSettings) -> HttpResult<Self> {
        let client = build_client(&settings, None)?;
        Ok(Self { client, settings })
    }

    /// The settings this client was built with.
    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn send(&self, client: &Client, url: &str) -> HttpResult<Response> {
        client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.settings.timeout.as_secs(),
                }
            } else {
                HttpError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    /// Answer a Digest proxy challenge, if the 407 carries one we can satisfy.
    fn retry_with_digest(&self, url: &str, response: &Response) -> HttpResult<Option<Response>> {
        let challenges: Vec<&str> = response
            .headers()
            .get_all(PROXY_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        self.send_with_digest(url, "GET", url, &challenges)
    }

    /// Answer a Digest challenge to the `CONNECT` tunnel of an HTTPS request.
    ///
    /// Only attempted for authenticated proxies. The `CONNECT` is replayed
    /// without credentials to read the challenge reqwest does not expose.
    fn retry_tunnel_with_digest(&self, url: &str) -> HttpResult<Option<Response>> {
        if self.settings.proxy.credentials().is_none() || !is_tunneled(url) {
            return Ok(None);
        }
        let (Some(proxy_url), Some(authority)) =
            (self.settings.proxy.proxy_url(), connect_authority(url))
        else {
            return Ok(None);
        };

        let reply = connect_reply(&proxy_url, &authority, None, self.settings.timeout)?;
        if reply.status != StatusCode::PROXY_AUTHENTICATION_REQUIRED.as_u16() {
            return Ok(None);
        }
        let challenges: Vec<&str> = reply.challenges.iter().map(String::as_str).collect();
        self.send_with_digest(url, "CONNECT", &authority, &challenges)
    }

    /// Rebuild the client with a Digest `Proxy-Authorization` and resend.
    fn send_with_digest(
        &self,
        url: &str,
        method: &str,
        uri: &str,
        challenges: &[&str],
    ) -> HttpResult<Option<Response>> {
        let Some((username, password)) = self.settings.proxy.credentials() else {
            return Ok(None);
        };
        let Some(challenge) = challenges.iter().copied().find_map(DigestChallenge::parse) else {
            return Ok(None);
        };

        debug!(url, method, realm = %challenge.realm, "Answering digest proxy challenge");
        let header = challenge.authorization(method, uri, username, password, &generate_cnonce());
        let header = HeaderValue::from_str(&header).map_err(|e| HttpError::ProxyAuth {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = build_client(&self.settings, Some(header))?;
        self.send(&client, url).map(Some)
    }

    /// Send a GET, answering a Digest proxy challenge if one comes back.
    fn send_authenticated(&self, url: &str) -> HttpResult<Response> {
        let response = match self.send(&self.client, url) {
            Ok(response) => response,
            Err(err @ HttpError::Transport { .. }) => {
                return match self.retry_tunnel_with_digest(url) {
                    Ok(Some(retried)) => Ok(retried),
                    Ok(None) => Err(err),
                    Err(retry_err) => {
                        debug!(url, error = %retry_err, "Digest tunnel retry failed");
                        Err(err)
                    }
                };
            }
            Err(err) => return Err(err),
        };
        if response.status() != StatusCode::PROXY_AUTHENTICATION_REQUIRED {
            return Ok(response);
        }
        let retried = self.retry_with_digest(url, &response)?;
        match retried {
            Some(retried) => Ok(retried),
            None => {
                warn!(url, "Proxy requires authentication that was not satisfied");
                Ok(response)
            }
        }
    }
}

impl HttpClient for ReqwestClient {
    fn probe(&self, url: &str) -> HttpResult<HttpResponse> {
        let response = self.send_authenticated(url)?;
        Ok(HttpResponse::new(response.status().as_u16(), Vec::new()))
    }

    fn execute_get(&self, url: &str) -> HttpResult<HttpResponse> {
        let response = self.send_authenticated(url)?;

        let status = response.status();
        let body = response.bytes().map_err(|e| HttpError::Transport {
            url: url.to_string(),
            reason: format!("Failed to read response: {}", e),
        })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }

    fn get_stream(&self, url: &str) -> HttpResult<Box<dyn Read + Send>> {
        let response = self.send_authenticated(url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(Box::new(response))
    }
}

fn build_client(settings: &HttpSettings, proxy_auth: Option<HeaderValue>) -> HttpResult<Client> {
    let mut builder = Client::builder()
        .timeout(settings.timeout)
        .danger_accept_invalid_certs(settings.trust_server_certificate);

    let mode = settings.proxy.auth_mode();
    if mode != ProxyAuthMode::Direct {
        let proxy_url = settings.proxy.proxy_url().ok_or_else(|| {
            HttpError::ClientBuild("proxy host is configured without a port".to_string())
        })?;
        let mut proxy = Proxy::all(&proxy_url)
            .map_err(|e| HttpError::ClientBuild(format!("invalid proxy {}: {}", proxy_url, e)))?;

        if mode == ProxyAuthMode::Authenticated {
            proxy = match proxy_auth {
                Some(header) => proxy.custom_http_auth(header),
                None => match settings.proxy.credentials() {
                    Some((username, password)) => proxy.basic_auth(username, password),
                    None => proxy,
                },
            };
        }

        debug!(proxy = %proxy_url, ?mode, "Routing requests through proxy");
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| HttpError::ClientBuild(e.to_string()))
}
