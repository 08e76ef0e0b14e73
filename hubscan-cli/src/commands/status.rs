//! Status command - report on the local install without touching it.

use std::path::PathBuf;

use hubscan::installer::{InstallStateInspector, TracingLogger};

use super::common::{describe_timeout, Settings};
use crate::error::CliError;

/// Run the status command.
pub fn run(settings: &Settings) -> Result<(), CliError> {
    let dir = settings.require_dir()?;
    let inspector = InstallStateInspector::for_platform(dir.clone(), settings.installer.platform);

    println!("Scan CLI Installation");
    println!("=====================");
    println!();
    println!("  Directory:   {}", inspector.install_root().display());
    println!(
        "  Hub URL:     {}",
        settings.hub_url.as_deref().unwrap_or("(not set)")
    );
    println!("  Timeout:     {}", describe_timeout(settings.http().timeout));
    println!(
        "  Version:     {}",
        inspector
            .installed_version()?
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("  CLI home:    {}", show(inspector.cli_home()?));
    println!("  CLI jar:     {}", show(inspector.cli()?));
    println!("  One-jar:     {}", show(inspector.one_jar_file()?));
    println!("  Java home:   {}", show(inspector.provided_java_home()?));
    println!();

    if inspector.cli_exists(&TracingLogger) {
        println!("The scan CLI is ready to use.");
        Ok(())
    } else {
        Err(CliError::NotInstalled(
            "The scan CLI is not installed. Run 'hubscan install' to install it.".to_string(),
        ))
    }
}

fn show(path: Option<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not found)".to_string())
}
