//! Verify command - confirm the configured URL is a Hub server.

use hubscan::ServerIdentityVerifier;

use super::common::Settings;
use crate::error::CliError;

/// Run the verify command.
pub fn run(settings: &Settings) -> Result<(), CliError> {
    let url = settings.require_url()?;
    let verifier = ServerIdentityVerifier::new(url, settings.http().clone())?;
    verifier.verify_is_hub_server()?;
    println!("{} is a Hub server.", verifier.hub_url());
    Ok(())
}
