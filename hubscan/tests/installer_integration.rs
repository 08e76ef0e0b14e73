//! Integration tests for the CLI installer.
//!
//! A fake Hub serves in-memory zip archives so that full install, upgrade
//! and downgrade cycles run against a real temporary directory.
//!
//! Run with: `cargo test --test installer_integration`

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use hubscan::http::{HttpClient, HttpError, HttpResponse, HttpResult};
use hubscan::installer::{
    ArchiveExtractor, CliInstaller, InstallError, InstallLock, InstallOutcome, InstallResult,
    InstallerConfig, MemoryLogger, Platform, CLI_UNZIP_DIR, LOCK_FILE_NAME, VERSION_FILE_NAME,
};
use hubscan::version::{RemoteVersionResolver, StaticVersionResolver};

// ============================================================================
// Fake Hub
// ============================================================================

const HUB_URL: &str = "https://hub.example.com";

#[derive(Default)]
struct HubState {
    resources: HashMap<String, Vec<u8>>,
    requests: Vec<String>,
}

/// HTTP client answering from a shared table of resources.
#[derive(Clone, Default)]
struct FakeHub {
    state: Arc<Mutex<HubState>>,
}

impl FakeHub {
    fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        let url = format!("{}/{}", HUB_URL, path);
        self.state.lock().unwrap().resources.insert(url, body.into());
    }

    fn serve_cli(&self, archive: &str, version: &str) {
        self.serve(&format!("download/{}", archive), cli_archive(version));
    }

    fn remove(&self, path: &str) {
        let url = format!("{}/{}", HUB_URL, path);
        self.state.lock().unwrap().resources.remove(&url);
    }

    fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl HttpClient for FakeHub {
    fn execute_get(&self, url: &str) -> HttpResult<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());
        Ok(match state.resources.get(url) {
            Some(body) => HttpResponse::new(200, body.clone()),
            None => HttpResponse::new(404, Vec::new()),
        })
    }
}

/// Client whose every request fails before reaching a server.
struct Unreachable;

impl HttpClient for Unreachable {
    fn execute_get(&self, url: &str) -> HttpResult<HttpResponse> {
        Err(HttpError::Transport {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build a CLI archive laid out the way the Hub ships it.
fn cli_archive(version: &str) -> Vec<u8> {
    let home = format!("scan.cli-{}", version);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let files = [
        (format!("{}/bin/scan.cli.sh", home), b"#!/bin/sh\n".to_vec()),
        (format!("{}/lib/scan.cli-{}.jar", home, version), version.as_bytes().to_vec()),
        (
            format!("{}/lib/cache/scan.cli.impl-standalone.jar", home),
            b"one-jar".to_vec(),
        ),
        (format!("{}/jre/bin/java", home), b"java".to_vec()),
    ];
    for (name, content) in files {
        zip.start_file(name, options).unwrap();
        zip.write_all(&content).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

fn installer(root: &Path, hub: &FakeHub) -> CliInstaller<FakeHub> {
    let config = InstallerConfig::new(root, "TestHost").with_platform(Platform::Linux);
    CliInstaller::with_client(config, hub.clone()).unwrap()
}

fn hub_at(version: &str) -> StaticVersionResolver {
    StaticVersionResolver::new(HUB_URL, version)
}

fn marker(root: &Path) -> Option<String> {
    fs::read_to_string(root.join(VERSION_FILE_NAME)).ok()
}

fn installed_jar(installer: &CliInstaller<FakeHub>) -> String {
    let cli = installer.inspector().cli().unwrap().expect("CLI jar present");
    cli.file_name().unwrap().to_string_lossy().into_owned()
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_fresh_install() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "3.0.0");
    let installer = installer(&root, &hub);
    let logger = MemoryLogger::new();

    let outcome = installer.perform_installation(&logger, &hub_at("3.0.0")).unwrap();

    match &outcome {
        InstallOutcome::Installed {
            previous,
            version,
            url,
            files_extracted,
        } => {
            assert_eq!(previous, &None);
            assert_eq!(version, "3.0.0");
            assert_eq!(url, "https://hub.example.com/download/scan.cli-linux.zip");
            assert_eq!(*files_extracted, 4);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(marker(&root).as_deref(), Some("3.0.0"));
    assert_eq!(installed_jar(&installer), "scan.cli-3.0.0.jar");
    assert!(installer.inspector().one_jar_file().unwrap().is_some());
    assert!(installer.inspector().provided_java_home().unwrap().is_some());
    assert!(logger.contains("Unpacking "));
    assert!(!root.join(LOCK_FILE_NAME).exists());
}

#[test]
fn test_install_layout_passes_inspection() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.1.0");
    let installer = installer(temp.path(), &hub);
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.1.0"))
        .unwrap();

    let logger = MemoryLogger::new();
    assert!(installer.inspector().cli_exists(&logger));
    assert!(logger.contains("BlackDuck scan directory: "));
    assert!(logger.contains("directories in the BlackDuck scan directory: 3"));
    assert!(logger.contains("BlackDuck scan lib directory: "));
}

#[test]
fn test_same_version_is_not_downloaded_again() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    let installer = installer(temp.path(), &hub);

    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap();
    let outcome = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap();

    assert_eq!(
        outcome,
        InstallOutcome::UpToDate {
            version: "4.0.0".to_string()
        }
    );
    assert_eq!(hub.requests().len(), 1);
}

#[test]
fn test_upgrades_replace_previous_install() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    let installer = installer(temp.path(), &hub);

    for version in ["4.0.0", "4.1.0", "4.1.1"] {
        hub.serve_cli("scan.cli-linux.zip", version);
        let logger = MemoryLogger::new();

        let outcome = installer.perform_installation(&logger, &hub_at(version)).unwrap();

        assert!(outcome.changed());
        assert_eq!(marker(temp.path()).as_deref(), Some(version));
        assert_eq!(installed_jar(&installer), format!("scan.cli-{}.jar", version));

        let homes = fs::read_dir(temp.path().join(CLI_UNZIP_DIR)).unwrap().count();
        assert_eq!(homes, 1, "old CLI home left behind after {}", version);
        assert!(logger.contains("Unpacking "));
    }
}

#[test]
fn test_downgrades_replace_previous_install() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    let installer = installer(temp.path(), &hub);

    hub.serve_cli("scan.cli-linux.zip", "4.1.1");
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.1.1"))
        .unwrap();

    for version in ["4.0.1", "4.0.0"] {
        hub.serve_cli("scan.cli-linux.zip", version);
        let outcome = installer
            .perform_installation(&MemoryLogger::new(), &hub_at(version))
            .unwrap();

        assert_eq!(outcome.version(), version);
        assert_eq!(marker(temp.path()).as_deref(), Some(version));
        assert_eq!(installed_jar(&installer), format!("scan.cli-{}.jar", version));
    }
}

#[test]
fn test_downgrade_to_legacy_hub_uses_single_archive() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    let installer = installer(temp.path(), &hub);

    hub.serve_cli("scan.cli-linux.zip", "3.0.0");
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("3.0.0"))
        .unwrap();

    hub.serve_cli("scan.cli.zip", "2.0.0");
    let outcome = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("2.0.0"))
        .unwrap();

    match outcome {
        InstallOutcome::Installed { previous, url, .. } => {
            assert_eq!(previous.as_deref(), Some("3.0.0"));
            assert_eq!(url, "https://hub.example.com/download/scan.cli.zip");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(marker(temp.path()).as_deref(), Some("2.0.0"));
    assert_eq!(installed_jar(&installer), "scan.cli-2.0.0.jar");
}

#[test]
fn test_incomplete_install_is_repaired() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.1.0");
    let installer = installer(temp.path(), &hub);
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.1.0"))
        .unwrap();

    let jar = installer.inspector().cli().unwrap().unwrap();
    fs::remove_file(&jar).unwrap();

    let logger = MemoryLogger::new();
    let outcome = installer.perform_installation(&logger, &hub_at("4.1.0")).unwrap();

    assert!(outcome.changed());
    assert!(jar.is_file());
    assert!(logger.contains("incomplete"));
}

#[test]
fn test_corrupt_archive_keeps_marker_and_retries() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    let installer = installer(temp.path(), &hub);

    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap();

    hub.serve("download/scan.cli-linux.zip", b"definitely not a zip".to_vec());
    let logger = MemoryLogger::new();
    let err = installer
        .perform_installation(&logger, &hub_at("4.1.0"))
        .unwrap_err();

    assert!(matches!(err, InstallError::Extraction { .. }), "{:?}", err);
    assert_eq!(marker(temp.path()).as_deref(), Some("4.0.0"));
    assert!(!temp.path().join(CLI_UNZIP_DIR).exists());
    assert!(!temp.path().join(LOCK_FILE_NAME).exists());
    assert!(logger.output().contains("ERROR "));

    hub.serve_cli("scan.cli-linux.zip", "4.1.0");
    let outcome = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.1.0"))
        .unwrap();
    assert!(outcome.changed());
    assert_eq!(marker(temp.path()).as_deref(), Some("4.1.0"));
}

#[test]
fn test_missing_archive_is_download_error() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    hub.remove("download/scan.cli-linux.zip");
    let installer = installer(temp.path(), &hub);

    let err = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap_err();

    match err {
        InstallError::Download { url, source } => {
            assert_eq!(url, "https://hub.example.com/download/scan.cli-linux.zip");
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(marker(temp.path()), None);
}

#[test]
fn test_unreachable_hub_is_retryable_download_error() {
    let temp = TempDir::new().unwrap();
    let config = InstallerConfig::new(temp.path(), "TestHost").with_platform(Platform::Linux);
    let installer = CliInstaller::with_client(config, Unreachable).unwrap();

    let err = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap_err();

    assert!(matches!(err, InstallError::Download { .. }));
    assert!(err.is_retryable());
}

#[test]
fn test_held_lock_blocks_installation() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    let installer = installer(temp.path(), &hub);

    let lock = InstallLock::acquire(temp.path()).unwrap();
    let err = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap_err();

    assert!(matches!(err, InstallError::Locked { .. }), "{:?}", err);
    assert!(hub.requests().is_empty());
    assert_eq!(marker(temp.path()), None);

    drop(lock);
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap();
    assert_eq!(marker(temp.path()).as_deref(), Some("4.0.0"));
}

#[test]
fn test_remote_version_drives_installation() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve("api/current-version", br#"{"version": "4.1.1"}"#.to_vec());
    hub.serve_cli("scan.cli-linux.zip", "4.1.1");
    let installer = installer(temp.path(), &hub);
    let resolver = RemoteVersionResolver::new(hub.clone(), HUB_URL);

    let outcome = installer
        .perform_installation(&MemoryLogger::new(), &resolver)
        .unwrap();

    assert_eq!(outcome.version(), "4.1.1");
    assert_eq!(
        hub.requests(),
        vec![
            "https://hub.example.com/api/current-version".to_string(),
            "https://hub.example.com/download/scan.cli-linux.zip".to_string(),
        ]
    );
}

#[test]
fn test_unparseable_version_installs_nothing() {
    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    let installer = installer(temp.path(), &hub);

    let err = installer
        .perform_installation(&MemoryLogger::new(), &hub_at("unknown"))
        .unwrap_err();

    assert!(matches!(err, InstallError::InvalidVersion(ref v) if v == "unknown"));
    assert!(hub.requests().is_empty());
}

#[cfg(unix)]
#[test]
fn test_launchers_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    let installer = installer(temp.path(), &hub);
    installer
        .perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"))
        .unwrap();

    let home = installer.inspector().cli_home().unwrap().unwrap();
    for script in [home.join("bin/scan.cli.sh"), home.join("jre/bin/java")] {
        let mode = fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "{} not executable", script.display());
    }
}

#[cfg(unix)]
#[test]
fn test_archive_symlinks_do_not_widen_outside_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");
    let outside = temp.path().join("secret.txt");
    fs::write(&outside, b"secret").unwrap();
    fs::set_permissions(&outside, fs::Permissions::from_mode(0o600)).unwrap();

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("scan.cli-4.0.0/lib/scan.cli-4.0.0.jar", options)
        .unwrap();
    zip.write_all(b"4.0.0").unwrap();
    zip.start_file("scan.cli-4.0.0/bin/scan.cli.sh", options)
        .unwrap();
    zip.write_all(b"#!/bin/sh\n").unwrap();
    zip.add_symlink(
        "scan.cli-4.0.0/bin/linked",
        outside.to_string_lossy().into_owned(),
        options,
    )
    .unwrap();
    let archive = zip.finish().unwrap().into_inner();

    let hub = FakeHub::default();
    hub.serve("download/scan.cli-linux.zip", archive);
    let installer = installer(&root, &hub);

    // Extractors may refuse the link; either way the outside file is untouched.
    let _ = installer.perform_installation(&MemoryLogger::new(), &hub_at("4.0.0"));

    let mode = fs::metadata(&outside).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    assert_eq!(fs::read(&outside).unwrap(), b"secret");
}

/// Fails extraction after replacing the install root with a plain file, so
/// the partial unzip directory can no longer be removed.
#[cfg(unix)]
struct RootClobberingExtractor {
    root: PathBuf,
}

#[cfg(unix)]
impl ArchiveExtractor for RootClobberingExtractor {
    fn extract(&self, archive_path: &Path, _dest_dir: &Path) -> InstallResult<usize> {
        fs::rename(&self.root, self.root.with_extension("moved")).unwrap();
        fs::write(&self.root, b"").unwrap();
        Err(InstallError::Extraction {
            path: archive_path.to_path_buf(),
            reason: "truncated archive".to_string(),
        })
    }
}

#[cfg(unix)]
#[test]
fn test_extraction_error_survives_failed_cleanup() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");
    let hub = FakeHub::default();
    hub.serve_cli("scan.cli-linux.zip", "4.0.0");
    let installer = installer(&root, &hub).with_extractor(RootClobberingExtractor {
        root: root.clone(),
    });
    let logger = MemoryLogger::new();

    let err = installer
        .perform_installation(&logger, &hub_at("4.0.0"))
        .unwrap_err();

    match err {
        InstallError::Extraction { reason, .. } => assert_eq!(reason, "truncated archive"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(logger.contains("Could not remove the partial install"));
}

