//! End-to-end installer tests against a local HTTP server.
//!
//! A `mockito` server plays the release host, so these tests exercise the
//! real `HttpFetcher` together with verification and extraction.

use std::path::Path;

use tyup_installer::verify::compute_sha256;
use tyup_installer::{
    Error, InstallState, Installer, InstallerConfig, ManagedServer, PinnedVersion, PlatformKey,
    TyServer,
};

const VERSION: &str = "0.0.1-alpha.21";
const ARCHIVE: &str = "ty-x86_64-unknown-linux-gnu.tar.gz";
const EXE: &str = "ty-x86_64-unknown-linux-gnu/ty";

fn tar_gz(name: &str, content: &[u8]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, content)
        .expect("Should append file");
    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

fn installer(root: &Path, base_url: &str) -> Installer {
    let config = InstallerConfig::new(root, PlatformKey::LinuxX64)
        .with_release_base_url(base_url)
        .with_version_source(PinnedVersion(VERSION.to_string()));
    Installer::new(config).expect("Should create installer")
}

#[test]
fn installs_from_release_server() {
    let archive = tar_gz(EXE, b"#!/bin/sh\necho ty\n");
    let checksum = format!("{}  {ARCHIVE}\n", compute_sha256(&archive));

    let mut server = mockito::Server::new();
    let archive_mock = server
        .mock("GET", format!("/releases/{VERSION}/{ARCHIVE}").as_str())
        .with_status(200)
        .with_body(archive)
        .expect(1)
        .create();
    let checksum_mock = server
        .mock("GET", format!("/releases/{VERSION}/{ARCHIVE}.sha256").as_str())
        .with_status(200)
        .with_body(checksum)
        .expect(1)
        .create();

    let temp = tempfile::tempdir().expect("Should create temp dir");
    let installer = installer(temp.path(), &format!("{}/releases/", server.url()));

    assert_eq!(installer.state(), InstallState::NotInstalled);
    installer.install().expect("Should install");

    archive_mock.assert();
    checksum_mock.assert();
    assert_eq!(installer.state(), InstallState::Installed);
    assert_eq!(
        std::fs::read(installer.executable_path()).expect("Should read executable"),
        b"#!/bin/sh\necho ty\n"
    );
    assert!(
        installer
            .executable_path()
            .starts_with(temp.path().join("LSP-ty").join(format!("v{VERSION}")))
    );
}

#[test]
fn tampered_archive_is_rejected() {
    let archive = tar_gz(EXE, b"ty");
    let checksum = format!("{}  {ARCHIVE}\n", compute_sha256(b"something else"));

    let mut server = mockito::Server::new();
    let _archive = server
        .mock("GET", format!("/{VERSION}/{ARCHIVE}").as_str())
        .with_body(archive)
        .create();
    let _checksum = server
        .mock("GET", format!("/{VERSION}/{ARCHIVE}.sha256").as_str())
        .with_body(checksum)
        .create();

    let temp = tempfile::tempdir().expect("Should create temp dir");
    let installer = installer(temp.path(), &server.url());

    let err = installer.install().unwrap_err();

    assert!(matches!(err, Error::Integrity { .. }));
    assert!(err.is_fatal());
    assert!(!installer.is_installed());
    assert!(!installer.executable_path().exists());
}

#[test]
fn missing_release_surfaces_http_status() {
    let mut server = mockito::Server::new();
    let _missing = server
        .mock("GET", format!("/{VERSION}/{ARCHIVE}").as_str())
        .with_status(404)
        .create();

    let temp = tempfile::tempdir().expect("Should create temp dir");
    let installer = installer(temp.path(), &server.url());

    let err = installer.install().unwrap_err();

    match err {
        Error::Fetch(fetch) => assert_eq!(fetch.status(), Some(404)),
        other => panic!("Expected fetch error, got {other:?}"),
    }
    assert!(!installer.is_installed());
}

#[test]
fn host_hook_installs_on_first_use() {
    let archive = tar_gz(EXE, b"ty");
    let checksum = compute_sha256(&archive);

    let mut server = mockito::Server::new();
    let archive_mock = server
        .mock("GET", format!("/{VERSION}/{ARCHIVE}").as_str())
        .with_body(archive)
        .expect(1)
        .create();
    let _checksum = server
        .mock("GET", format!("/{VERSION}/{ARCHIVE}.sha256").as_str())
        .with_body(checksum)
        .create();

    let temp = tempfile::tempdir().expect("Should create temp dir");
    let server_hooks = TyServer::new(installer(temp.path(), &server.url()));

    let path = tyup_installer::ensure_installed(&server_hooks).expect("Should install");
    let again = tyup_installer::ensure_installed(&server_hooks).expect("Should be installed");

    archive_mock.assert();
    assert_eq!(path, again);
    assert_eq!(server_hooks.server_version(), VERSION);
    assert!(!server_hooks.needs_installation());
}
