//! Install command - bring the scan CLI in step with the Hub.

use hubscan::installer::{CliInstaller, InstallOutcome, TracingLogger};
use tracing::info;

use super::common::Settings;
use crate::error::CliError;

/// Run the install command.
pub fn run(settings: &Settings, hub_version: Option<String>) -> Result<(), CliError> {
    settings.require_dir()?;
    let resolver = settings.resolver(hub_version)?;
    let installer = CliInstaller::from_config(settings.installer.clone())?;

    info!(
        dir = %installer.install_root().display(),
        host = installer.local_host_name(),
        "Checking scan CLI installation"
    );

    match installer.perform_installation(&TracingLogger, resolver.as_ref())? {
        InstallOutcome::UpToDate { version } => {
            println!("Scan CLI {} is up to date.", version);
        }
        InstallOutcome::Installed {
            previous,
            version,
            url,
            files_extracted,
        } => {
            match previous {
                Some(previous) => println!("Replaced scan CLI {} with {}.", previous, version),
                None => println!("Installed scan CLI {}.", version),
            }
            println!("  Source: {}", url);
            println!("  Files:  {}", files_extracted);
        }
    }
    println!("  Location: {}", installer.cli_install_dir().display());

    Ok(())
}
