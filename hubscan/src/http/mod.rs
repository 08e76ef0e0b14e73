//! HTTP transport for talking to a Hub server.
//!
//! This module provides:
//! - The [`HttpClient`] trait, the seam every network consumer depends on
//! - [`ReqwestClient`], a blocking reqwest implementation with proxy support
//! - [`ProxyConfig`], the immutable proxy policy for a client
//! - Digest proxy authentication (`digest`)
//!
//! # Proxy authentication
//!
//! ```text
//! ProxyConfig ──► auth_mode()
//!                   ├── Direct          no proxy configured
//!                   ├── Passthrough     host/port only
//!                   └── Authenticated   Basic offered first,
//!                                       Digest on a 407 Digest challenge
//! ```

mod client;
mod digest;
mod error;
mod proxy;
mod tunnel;

pub use client::{HttpClient, HttpResponse, HttpSettings, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use digest::{DigestAlgorithm, DigestChallenge};
pub use error::{HttpError, HttpResult};
pub use proxy::{ProxyAuthMode, ProxyConfig};

/// Join a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
