//! Read-only queries against an install root.
//!
//! Layout managed by the installer:
//!
//! ```text
//! <install root>/
//! ├── hubVersion.txt                      version marker
//! └── Hub_Scan_Installation/              unzip directory
//!     └── <cli home>/                     exactly one directory
//!         ├── lib/
//!         │   ├── scan.cli-<ver>.jar      the CLI (exactly one match)
//!         │   └── cache/
//!         │       └── scan.cli.impl-standalone.jar
//!         └── jre/bin/java                optional bundled runtime
//! ```
//!
//! A missing or partial install is never an error: queries return
//! `Ok(None)`. Only I/O failures unrelated to absence (permissions, for
//! instance) are reported as errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::{InstallError, InstallResult};
use super::location::Platform;
use super::logger::InstallLogger;

/// Name of the directory the CLI archive is unpacked into.
pub const CLI_UNZIP_DIR: &str = "Hub_Scan_Installation";

/// Name of the file recording the installed Hub version.
pub const VERSION_FILE_NAME: &str = "hubVersion.txt";

/// Name of the standalone runner inside `lib/cache`.
pub const ONE_JAR_FILE_NAME: &str = "scan.cli.impl-standalone.jar";

/// Prefix of the CLI jar inside `lib`.
pub const CLI_JAR_PREFIX: &str = "scan.cli";

/// Extension of the CLI jar inside `lib`.
pub const CLI_JAR_EXTENSION: &str = ".jar";

const LIB_DIR: &str = "lib";
const CACHE_DIR: &str = "cache";
const JRE_DIR: &str = "jre";
const BIN_DIR: &str = "bin";

/// Answers "what is installed, where, and is it complete".
#[derive(Debug, Clone)]
pub struct InstallStateInspector {
    install_root: PathBuf,
    platform: Platform,
}

impl InstallStateInspector {
    /// Inspect the install root for the local platform.
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self::for_platform(install_root, Platform::current())
    }

    /// Inspect the install root as laid out for `platform`.
    pub fn for_platform(install_root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            install_root: install_root.into(),
            platform,
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// `<install root>/Hub_Scan_Installation`.
    pub fn cli_install_dir(&self) -> PathBuf {
        self.install_root.join(CLI_UNZIP_DIR)
    }

    /// `<install root>/hubVersion.txt`.
    pub fn version_file(&self) -> PathBuf {
        self.install_root.join(VERSION_FILE_NAME)
    }

    /// The version recorded by the last successful install.
    pub fn installed_version(&self) -> InstallResult<Option<String>> {
        let path = self.version_file();
        match fs::read_to_string(&path) {
            Ok(content) => {
                let version = content.trim();
                Ok((!version.is_empty()).then(|| version.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InstallError::ReadFailed { path, source: e }),
        }
    }

    /// The single directory inside the unzip directory.
    ///
    /// `None` when the unzip directory is missing or empty, holds more than
    /// one entry, or its only entry is a file. Never searches deeper.
    pub fn cli_home(&self) -> InstallResult<Option<PathBuf>> {
        let Some(entries) = read_entries(&self.cli_install_dir())? else {
            return Ok(None);
        };
        match entries.as_slice() {
            [only] if only.is_dir() => Ok(Some(only.clone())),
            _ => Ok(None),
        }
    }

    /// `<cli home>/lib/cache/scan.cli.impl-standalone.jar`, if present.
    pub fn one_jar_file(&self) -> InstallResult<Option<PathBuf>> {
        let Some(home) = self.cli_home()? else {
            return Ok(None);
        };
        let one_jar = home.join(LIB_DIR).join(CACHE_DIR).join(ONE_JAR_FILE_NAME);
        Ok(one_jar.is_file().then_some(one_jar))
    }

    /// The CLI jar: the only `scan.cli*.jar` file directly inside `lib`.
    ///
    /// The `cache` subdirectory is ignored. Zero or several matches count as
    /// not found.
    pub fn cli(&self) -> InstallResult<Option<PathBuf>> {
        let Some(home) = self.cli_home()? else {
            return Ok(None);
        };
        let Some(entries) = read_entries(&home.join(LIB_DIR))? else {
            return Ok(None);
        };

        let mut matches = entries.into_iter().filter(|path| is_cli_jar(path));
        match (matches.next(), matches.next()) {
            (Some(cli), None) => Ok(Some(cli)),
            _ => Ok(None),
        }
    }

    /// `<cli home>/jre`, when it holds `bin/java` as a regular file.
    pub fn provided_java_home(&self) -> InstallResult<Option<PathBuf>> {
        let Some(home) = self.cli_home()? else {
            return Ok(None);
        };
        let jre = home.join(JRE_DIR);
        let java = jre.join(BIN_DIR).join(self.platform.java_binary());
        Ok(java.is_file().then_some(jre))
    }

    /// Whether the CLI jar resolves, logging how the lookup went.
    ///
    /// The logged substrings are relied on by tooling and must stay stable:
    /// - `BlackDuck scan directory: `
    /// - `directories in the BlackDuck scan directory: `
    /// - `BlackDuck scan lib directory: `
    /// - `No files found in the BlackDuck scan directory.`
    /// - `Could not find the lib directory of the CLI.`
    pub fn cli_exists(&self, logger: &dyn InstallLogger) -> bool {
        match self.check_cli(logger) {
            Ok(found) => found,
            Err(e) => {
                logger.error(&format!("Could not inspect the BlackDuck scan CLI: {}", e));
                false
            }
        }
    }

    fn check_cli(&self, logger: &dyn InstallLogger) -> InstallResult<bool> {
        let Some(home) = self.cli_home()? else {
            let unzip_dir = self.cli_install_dir();
            let entries = read_entries(&unzip_dir)?.unwrap_or_default();
            logger.info(&format!("BlackDuck scan directory: {}", unzip_dir.display()));
            logger.info(&format!(
                "directories in the BlackDuck scan directory: {}",
                entries.len()
            ));
            logger.error("Could not find the BlackDuck scan directory.");
            return Ok(false);
        };

        logger.info(&format!("BlackDuck scan directory: {}", home.display()));
        let entries = read_entries(&home)?.unwrap_or_default();
        logger.info(&format!(
            "directories in the BlackDuck scan directory: {}",
            entries.len()
        ));
        if entries.is_empty() {
            logger.error("No files found in the BlackDuck scan directory.");
            return Ok(false);
        }

        let lib = home.join(LIB_DIR);
        if !lib.is_dir() {
            logger.error("Could not find the lib directory of the CLI.");
            return Ok(false);
        }
        logger.info(&format!("BlackDuck scan lib directory: {}", lib.display()));

        match self.cli()? {
            Some(cli) => {
                logger.info(&format!("BlackDuck scan CLI: {}", cli.display()));
                Ok(true)
            }
            None => {
                logger.error(&format!(
                    "Could not find the BlackDuck scan CLI in {}",
                    lib.display()
                ));
                Ok(false)
            }
        }
    }
}

fn is_cli_jar(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(CLI_JAR_PREFIX) && name.ends_with(CLI_JAR_EXTENSION))
        .unwrap_or(false)
}

/// Entries of `dir` sorted by path, or `None` if `dir` is not a directory.
fn read_entries(dir: &Path) -> InstallResult<Option<Vec<PathBuf>>> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(InstallError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    }

    let read_failed = |e| InstallError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_failed)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(read_failed)?;
    entries.sort();
    Ok(Some(entries))
}
