//! Download-url command - print where the Hub serves the scan CLI.

use hubscan::installer::{download_url, Platform};
use hubscan::ServerVersion;

use super::common::{PlatformArg, Settings};
use crate::error::CliError;

/// Run the download-url command.
pub fn run(
    settings: &Settings,
    hub_version: Option<String>,
    platform: Option<PlatformArg>,
) -> Result<(), CliError> {
    let resolver = settings.resolver(hub_version)?;
    let version = ServerVersion::parse(&resolver.server_version()?)?;
    let platform = platform.map(Platform::from).unwrap_or(settings.installer.platform);

    println!("{}", download_url(resolver.base_url(), &version, platform));
    Ok(())
}
