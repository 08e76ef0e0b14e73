//! Digest challenges for HTTPS requests through a proxy.
//!
//! reqwest opens the `CONNECT` tunnel itself and reports a `407` answer only
//! as a connect error, without the `Proxy-Authenticate` headers. To answer a
//! Digest challenge the `CONNECT` is replayed here on a plain socket and the
//! challenge headers are read back.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use super::error::{HttpError, HttpResult};

/// Headers of a proxy's answer to a `CONNECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectReply {
    pub status: u16,
    /// Values of every `Proxy-Authenticate` header.
    pub challenges: Vec<String>,
}

/// `host:port` authority a `CONNECT` for `url` names.
pub(crate) fn connect_authority(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{}:{}", host, port))
}

/// Whether requests to `url` go through a `CONNECT` tunnel.
pub(crate) fn is_tunneled(url: &str) -> bool {
    Url::parse(url)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

/// Send `CONNECT authority` to the proxy at `proxy_url` and read the reply
/// headers. The connection is closed afterwards.
pub(crate) fn connect_reply(
    proxy_url: &str,
    authority: &str,
    proxy_authorization: Option<&str>,
    timeout: Duration,
) -> HttpResult<ConnectReply> {
    let failed = |reason: String| HttpError::ProxyAuth {
        url: proxy_url.to_string(),
        reason,
    };

    let proxy = Url::parse(proxy_url).map_err(|e| failed(e.to_string()))?;
    let host = proxy
        .host_str()
        .ok_or_else(|| failed("proxy URL has no host".to_string()))?;
    let port = proxy
        .port_or_known_default()
        .ok_or_else(|| failed("proxy URL has no port".to_string()))?;

    let mut stream = TcpStream::connect((host, port)).map_err(|e| failed(e.to_string()))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| failed(e.to_string()))?;

    let mut request = format!(
        "CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n",
        authority = authority
    );
    if let Some(auth) = proxy_authorization {
        request.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }
    request.push_str("\r\n");
    stream
        .write_all(request.as_bytes())
        .map_err(|e| failed(e.to_string()))?;

    let reply = read_reply(BufReader::new(stream)).map_err(failed)?;
    debug!(proxy = proxy_url, authority, status = reply.status, "CONNECT reply");
    Ok(reply)
}

fn read_reply(mut reader: impl BufRead) -> Result<ConnectReply, String> {
    let mut line = String::new();
    reader.read_line(&mut line).map_err(|e| e.to_string())?;
    let status = line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| format!("malformed CONNECT reply: {}", line.trim()))?;

    let mut challenges = Vec::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|e| e.to_string())?;
        let header = line.trim_end();
        if read == 0 || header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("proxy-authenticate") {
                challenges.push(value.trim().to_string());
            }
        }
    }

    Ok(ConnectReply { status, challenges })
}
