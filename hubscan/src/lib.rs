//! hubscan - Scan CLI installer for Hub servers
//!
//! This library keeps a local copy of the Hub scan CLI in step with the
//! version a Hub server requires. It resolves the server's version, compares
//! it with the version recorded on disk, and downloads and unpacks the
//! matching CLI archive when they differ.
//!
//! # Modules
//!
//! - [`installer`] - install orchestration, on-disk state inspection, cleanup
//! - [`http`] - HTTP transport with proxy support
//! - [`version`] - server version resolution and numeric comparison
//! - [`verifier`] - checks that a URL belongs to a Hub server
//! - [`config`] - INI configuration file

pub mod config;
pub mod http;
pub mod installer;
pub mod verifier;
pub mod version;

pub use installer::{CliInstaller, InstallError, InstallResult};
pub use version::{ServerVersion, VersionResolver};
pub use verifier::{ServerIdentityVerifier, VerifyError, VerifyResult};
