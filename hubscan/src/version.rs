//! Hub server version resolution and numeric comparison.
//!
//! Hub versions are dotted numeric tuples such as `4.1.1`. Comparison is
//! always numeric per component, so `2.0.0 < 10.0.0` and `4.0.1 < 4.1.1`
//! regardless of string length.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::http::{join_url, HttpClient, HttpError, HttpResult};

/// Path of the endpoint reporting the server's version.
pub const CURRENT_VERSION_PATH: &str = "api/current-version";

/// Source of the Hub version that decides which CLI to install.
pub trait VersionResolver {
    /// Base URL of the Hub server, e.g. `https://hub.example.com`.
    fn base_url(&self) -> &str;

    /// The version string the server reports.
    fn server_version(&self) -> HttpResult<String>;
}

/// A parsed Hub version.
///
/// Parsing is lenient about shape: missing minor/patch components default to
/// zero and any `-SNAPSHOT` style suffix is ignored for ordering. At least one
/// leading numeric component is required. Equality and ordering look only
/// at the numeric components.
#[derive(Debug, Clone)]
pub struct ServerVersion {
    version: semver::Version,
    raw: String,
}

/// Error returned for version strings with no numeric major component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid Hub version: '{0}'")]
pub struct VersionParseError(pub String);

impl ServerVersion {
    /// Build a version from its numeric components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            version: semver::Version::new(major, minor, patch),
            raw: format!("{}.{}.{}", major, minor, patch),
        }
    }

    /// Parse a version string.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let raw = input.trim();
        let core = raw
            .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
            .next()
            .unwrap_or("");

        let mut parts = [0u64; 3];
        let mut seen = 0;
        for (index, component) in core.split('.').enumerate() {
            if index >= parts.len() {
                break;
            }
            match component.parse::<u64>() {
                Ok(value) => {
                    parts[index] = value;
                    seen += 1;
                }
                Err(_) => break,
            }
        }

        if seen == 0 {
            return Err(VersionParseError(input.to_string()));
        }

        Ok(Self {
            version: semver::Version::new(parts[0], parts[1], parts[2]),
            raw: raw.to_string(),
        })
    }

    /// The version string as reported by the server (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric form used for ordering.
    pub fn semver(&self) -> &semver::Version {
        &self.version
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major(), self.minor(), self.patch()).cmp(&(
            other.major(),
            other.minor(),
            other.patch(),
        ))
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ServerVersion {}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ServerVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Body shape of the current-version endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CurrentVersionBody {
    Object { version: String },
    Bare(String),
}

/// Extract a version string from a current-version response body.
///
/// Accepts `{"version": "4.1.1"}`, `"4.1.1"` or plain `4.1.1`.
pub fn parse_current_version_body(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<CurrentVersionBody>(text) {
        Ok(CurrentVersionBody::Object { version }) | Ok(CurrentVersionBody::Bare(version)) => {
            Some(version.trim().to_string())
        }
        Err(_) => Some(text.to_string()),
    }
}

/// Resolves the version by asking the Hub's current-version endpoint.
pub struct RemoteVersionResolver<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> RemoteVersionResolver<C> {
    /// Create a resolver for the Hub at `base_url`.
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl<C: HttpClient> VersionResolver for RemoteVersionResolver<C> {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn server_version(&self) -> HttpResult<String> {
        let url = join_url(&self.base_url, CURRENT_VERSION_PATH);
        let body = self.client.get_bytes(&url)?;
        let version = parse_current_version_body(&body).ok_or_else(|| HttpError::Transport {
            url: url.clone(),
            reason: "empty version response".to_string(),
        })?;
        debug!(url = %url, version = %version, "Resolved Hub version");
        Ok(version)
    }
}

/// Resolver returning a fixed version; useful when the version is known.
#[derive(Debug, Clone)]
pub struct StaticVersionResolver {
    base_url: String,
    version: String,
}

impl StaticVersionResolver {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
        }
    }
}

impl VersionResolver for StaticVersionResolver {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn server_version(&self) -> HttpResult<String> {
        Ok(self.version.clone())
    }
}
