//! Proxy configuration for outbound requests.

use std::fmt;

/// How requests reach the network, derived from a [`ProxyConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAuthMode {
    /// No proxy configured; connect directly.
    Direct,
    /// Route through the proxy without credentials.
    Passthrough,
    /// Route through the proxy and answer its authentication challenge.
    ///
    /// Whether Basic or Digest is used depends on what the proxy asks for.
    Authenticated,
}

/// Proxy settings for a download run.
///
/// Every field is optional and independently settable. The value is built
/// once and handed to the HTTP client; it is never mutated afterwards.
///
/// # Example
///
/// ```
/// use hubscan::http::{ProxyAuthMode, ProxyConfig};
///
/// let proxy = ProxyConfig::new("proxy.internal", 3128)
///     .with_credentials("scanner", "s3cret");
///
/// assert_eq!(proxy.auth_mode(), ProxyAuthMode::Authenticated);
/// assert_eq!(proxy.proxy_url().as_deref(), Some("http://proxy.internal:3128"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyConfig {
    /// Proxy with a host and port and no credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::none().with_host(host).with_port(port)
    }

    /// No proxy.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the proxy host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the proxy port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the proxy username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the proxy password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set both username and password.
    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_username(username).with_password(password)
    }

    pub fn host(&self) -> Option<&str> {
        non_empty(&self.host)
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Credentials as a `(username, password)` pair, if a username is set.
    ///
    /// A missing password is treated as empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username()
            .map(|user| (user, self.password().unwrap_or("")))
    }

    /// Determine the authentication mode implied by the populated fields.
    pub fn auth_mode(&self) -> ProxyAuthMode {
        if self.host().is_none() {
            ProxyAuthMode::Direct
        } else if self.username().is_some() {
            ProxyAuthMode::Authenticated
        } else {
            ProxyAuthMode::Passthrough
        }
    }

    /// The proxy URL, or `None` when no host or port is configured.
    ///
    /// Hosts given without a scheme are treated as plain HTTP proxies.
    pub fn proxy_url(&self) -> Option<String> {
        let host = self.host()?;
        let port = self.port?;
        if host.contains("://") {
            Some(format!("{}:{}", host.trim_end_matches('/'), port))
        } else {
            Some(format!("http://{}:{}", host, port))
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
