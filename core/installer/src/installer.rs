//! Install orchestration.
//!
//! The [`Installer`] owns one package directory and keeps exactly one
//! version of the server in it:
//!
//! ```text
//! <storage_root>/
//!   .LSP-ty.lock                      # held while installing
//!   LSP-ty/                           # package directory
//!     v0.0.1-alpha.21/                # installation directory
//!       ty-x86_64-unknown-linux-gnu/
//!         ty                          # executable
//! ```
//!
//! An installation exists if and only if the executable is a regular file at
//! [`Installer::executable_path`]. There is no manifest.
//!
//! ## Install process
//!
//! 1. Remove the package directory (all versions)
//! 2. Download the archive
//! 3. Download `<archive>.sha256` and verify the archive against it
//! 4. Extract into the installation directory
//! 5. Mark the executable as executable (Unix only)
//!
//! A failure in step 4 or 5 removes the partially written installation
//! directory again. Failures never leave a stale "installed" signal behind.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::archive::{extract_archive, set_executable_permissions};
use crate::config::InstallerConfig;
use crate::errors::{Error, Result};
use crate::fetch::{Fetch, HttpFetcher};
use crate::platform::{ArchiveDescriptor, PlatformKey};
use crate::verify::verify_checksum;
use crate::version::VersionTag;

/// Observable installation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The executable is absent.
    NotInstalled,
    /// An install is running on this installer.
    Installing,
    /// The executable is present.
    Installed,
}

/// Progress event emitted during [`Installer::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// Installation has started.
    Started {
        /// Version being installed.
        version: String,
        /// Target platform.
        platform: PlatformKey,
    },
    /// Previous installations were removed.
    Purged {
        /// The removed package directory.
        path: PathBuf,
    },
    /// The archive download has started.
    Downloading {
        /// Archive URL.
        url: String,
    },
    /// The golden hash is being fetched and compared.
    Verifying {
        /// Checksum URL.
        url: String,
    },
    /// The archive is being unpacked.
    Extracting {
        /// Installation directory.
        dest: PathBuf,
    },
    /// Installation finished successfully.
    Completed {
        /// Path of the installed executable.
        path: PathBuf,
    },
    /// Installation failed.
    Failed {
        /// Error description.
        error: String,
    },
}

/// Callback receiving [`InstallEvent`]s.
pub type InstallObserver = Arc<dyn Fn(&InstallEvent) + Send + Sync>;

/// Installs and locates one version of the server for one platform.
///
/// `install` must not run concurrently for the same package directory from
/// different installers without the file lock; the lock under the storage
/// root serializes installs across threads and processes.
pub struct Installer<F = HttpFetcher> {
    config: InstallerConfig,
    fetcher: F,
    version: VersionTag,
    descriptor: ArchiveDescriptor,
    download_url: OnceLock<String>,
    installing: AtomicBool,
    observer: Option<InstallObserver>,
}

impl Installer<HttpFetcher> {
    /// Creates an installer that downloads over HTTP.
    ///
    /// The version is resolved here, once, and cached for the lifetime of
    /// the installer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config is invalid or the version
    /// source cannot be resolved, or a fetch error if the HTTP client cannot
    /// be built.
    pub fn new(config: InstallerConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(config.request_timeout, config.chunk_size)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> Installer<F> {
    /// Creates an installer using a custom fetcher.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config is invalid or the version
    /// source cannot be resolved.
    pub fn with_fetcher(config: InstallerConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let version = config.version_source.resolve()?;
        let descriptor = config.platform.descriptor();

        debug!(
            version = %version,
            platform = %config.platform,
            archive = descriptor.archive_filename,
            "installer configured"
        );

        Ok(Self {
            config,
            fetcher,
            version,
            descriptor,
            download_url: OnceLock::new(),
            installing: AtomicBool::new(false),
            observer: None,
        })
    }

    /// Registers a callback for progress events.
    #[must_use]
    pub fn with_observer(mut self, observer: InstallObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the configuration this installer was built from.
    #[must_use]
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Returns the target platform.
    #[must_use]
    pub fn platform(&self) -> PlatformKey {
        self.config.platform
    }

    /// Returns the archive descriptor for the target platform.
    #[must_use]
    pub fn descriptor(&self) -> ArchiveDescriptor {
        self.descriptor
    }

    /// Returns the version this installer manages.
    #[must_use]
    pub fn current_version(&self) -> &VersionTag {
        &self.version
    }

    /// Returns `<storage_root>/<package_name>`.
    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        self.config.storage_root.join(&self.config.package_name)
    }

    /// Returns `<storage_root>/<package_name>/v<version>`.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.package_dir().join(self.version.dir_name())
    }

    /// Returns where the executable lives once installed.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.install_dir()
            .join(self.descriptor.executable_relative_path)
    }

    /// Returns the archive URL, computed once.
    #[must_use]
    pub fn download_url(&self) -> &str {
        self.download_url.get_or_init(|| {
            format!(
                "{}/{}/{}",
                self.config.release_base_url, self.version, self.descriptor.archive_filename
            )
        })
    }

    /// Returns the golden hash URL, `<archive_url>.sha256`.
    #[must_use]
    pub fn checksum_url(&self) -> String {
        format!("{}.sha256", self.download_url())
    }

    /// Checks if the executable is installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.executable_path().is_file()
    }

    /// Returns the current installation state.
    #[must_use]
    pub fn state(&self) -> InstallState {
        if self.installing.load(Ordering::Acquire) {
            InstallState::Installing
        } else if self.is_installed() {
            InstallState::Installed
        } else {
            InstallState::NotInstalled
        }
    }

    /// Returns the variables a host may use to render status text.
    #[must_use]
    pub fn status_variables(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("server_version".to_string(), self.version.to_string()),
            (
                "server_path".to_string(),
                self.executable_path().display().to_string(),
            ),
        ])
    }

    /// Installs the configured version, replacing whatever is installed.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any step; see [`Error`] for the
    /// taxonomy. After an error, [`Installer::is_installed`] is the recovery
    /// check.
    pub fn install(&self) -> Result<()> {
        let _lock = self.lock()?;
        let _installing = InstallingFlag::raise(&self.installing);

        info!(version = %self.version, platform = %self.platform(), "installing server");
        self.emit(&InstallEvent::Started {
            version: self.version.to_string(),
            platform: self.platform(),
        });

        match self.run_install() {
            Ok(()) => {
                let path = self.executable_path();
                info!(path = %path.display(), "server installed");
                self.emit(&InstallEvent::Completed { path });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "server installation failed");
                self.emit(&InstallEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Removes every installed version.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the package directory exists but cannot
    /// be removed.
    pub fn uninstall(&self) -> Result<()> {
        let _lock = self.lock()?;
        self.purge()
    }

    fn run_install(&self) -> Result<()> {
        self.purge()?;

        let url = self.download_url();
        self.emit(&InstallEvent::Downloading {
            url: url.to_string(),
        });
        let data = self.fetcher.fetch(url)?;
        debug!(%url, bytes = data.len(), "archive downloaded");

        // Fails closed: no golden hash, no install.
        let checksum_url = self.checksum_url();
        self.emit(&InstallEvent::Verifying {
            url: checksum_url.clone(),
        });
        let golden = self.fetcher.fetch(&checksum_url)?;
        verify_checksum(&data, &String::from_utf8_lossy(&golden)).map_err(|mismatch| {
            Error::Integrity {
                url: url.to_string(),
                mismatch,
            }
        })?;

        let install_dir = self.install_dir();
        self.emit(&InstallEvent::Extracting {
            dest: install_dir.clone(),
        });
        if let Err(e) = self.unpack(&data, &install_dir) {
            discard(&install_dir);
            return Err(e);
        }

        Ok(())
    }

    fn unpack(&self, data: &[u8], install_dir: &Path) -> Result<()> {
        let filename = self.descriptor.archive_filename;
        if !extract_archive(data, filename, install_dir)? {
            return Err(Error::configuration(format!(
                "unsupported archive format for {}: {filename}",
                self.platform()
            )));
        }

        let executable = self.executable_path();
        if !executable.is_file() {
            return Err(Error::MissingExecutable { path: executable });
        }

        set_executable_permissions(&executable)
    }

    fn purge(&self) -> Result<()> {
        let package_dir = self.package_dir();
        match remove_tree(&package_dir) {
            Ok(true) => {
                debug!(path = %package_dir.display(), "removed previous installation");
                self.emit(&InstallEvent::Purged { path: package_dir });
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => Err(Error::filesystem(
                "failed to remove previous installation",
                package_dir,
                e,
            )),
        }
    }

    /// Takes the exclusive install lock for this package.
    fn lock(&self) -> Result<File> {
        let root = &self.config.storage_root;
        std::fs::create_dir_all(root)
            .map_err(|e| Error::filesystem("failed to create directory", root, e))?;

        let path = root.join(format!(".{}.lock", self.config.package_name));
        let file = File::create(&path)
            .map_err(|e| Error::filesystem("failed to create lock file", &path, e))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| Error::filesystem("failed to lock", &path, e))?;

        Ok(file)
    }

    fn emit(&self, event: &InstallEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

/// Sets the installing flag for the lifetime of the value.
struct InstallingFlag<'a>(&'a AtomicBool);

impl<'a> InstallingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InstallingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Best-effort removal of a partially written installation.
fn discard(install_dir: &Path) {
    if let Err(e) = remove_tree(install_dir) {
        warn!(
            path = %install_dir.display(),
            error = %e,
            "failed to remove partial installation"
        );
    }
}

/// Removes a directory tree, reporting whether anything was there.
fn remove_tree(path: &Path) -> std::io::Result<bool> {
    #[cfg(windows)]
    let path = &long_path(path);

    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Prefixes absolute paths with `\\?\` to lift the `MAX_PATH` limit.
#[cfg(windows)]
fn long_path(path: &Path) -> PathBuf {
    let raw = path.as_os_str().to_string_lossy();
    if path.is_absolute() && !raw.starts_with(r"\\?\") {
        PathBuf::from(format!(r"\\?\{raw}"))
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::version::{PinnedVersion, RequirementsFile};
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    const BASE: &str = "https://releases.example.com/ty";
    const VERSION: &str = "0.0.1";
    const LINUX_ARCHIVE: &str = "ty-x86_64-unknown-linux-gnu.tar.gz";
    const LINUX_EXE: &str = "ty-x86_64-unknown-linux-gnu/ty";

    /// Serves canned responses and records every requested URL.
    #[derive(Default)]
    struct StaticFetcher {
        responses: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn with(mut self, url: String, body: Vec<u8>) -> Self {
            self.responses.insert(url, body);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("Should lock").clone()
        }
    }

    impl Fetch for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests
                .lock()
                .expect("Should lock")
                .push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, *content)
                .expect("Should append file");
        }
        builder
            .into_inner()
            .expect("Should finish tar")
            .finish()
            .expect("Should finish gzip")
    }

    fn archive_url(archive: &str) -> String {
        format!("{BASE}/{VERSION}/{archive}")
    }

    fn sha256_line(data: &[u8], archive: &str) -> Vec<u8> {
        format!("{}  {archive}\n", crate::verify::compute_sha256(data)).into_bytes()
    }

    /// Fetcher serving a valid Linux x64 release.
    fn linux_release(content: &[u8]) -> StaticFetcher {
        let archive = tar_gz(&[(LINUX_EXE, content)]);
        let checksum = sha256_line(&archive, LINUX_ARCHIVE);
        StaticFetcher::default()
            .with(archive_url(LINUX_ARCHIVE), archive)
            .with(format!("{}.sha256", archive_url(LINUX_ARCHIVE)), checksum)
    }

    fn config(root: &Path, platform: PlatformKey) -> InstallerConfig {
        InstallerConfig::new(root, platform)
            .with_release_base_url(BASE)
            .with_version_source(PinnedVersion(VERSION.to_string()))
    }

    fn linux_installer(root: &Path, fetcher: StaticFetcher) -> Installer<StaticFetcher> {
        Installer::with_fetcher(config(root, PlatformKey::LinuxX64), fetcher)
            .expect("Should create installer")
    }

    #[test]
    fn paths_follow_versioned_layout() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), StaticFetcher::default());

        assert_eq!(installer.package_dir(), temp.path().join("LSP-ty"));
        assert_eq!(installer.install_dir(), temp.path().join("LSP-ty").join("v0.0.1"));
        assert_eq!(
            installer.executable_path(),
            temp.path().join("LSP-ty").join("v0.0.1").join(LINUX_EXE)
        );
        assert_eq!(installer.download_url(), archive_url(LINUX_ARCHIVE));
        assert_eq!(
            installer.checksum_url(),
            format!("{}.sha256", archive_url(LINUX_ARCHIVE))
        );
        assert_eq!(installer.current_version().as_str(), VERSION);
    }

    #[test]
    fn download_url_is_memoized() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), StaticFetcher::default());

        let first = installer.download_url();
        let second = installer.download_url();

        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn install_makes_executable_available() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), linux_release(b"ty binary"));

        assert!(!installer.is_installed());
        assert_eq!(installer.state(), InstallState::NotInstalled);

        installer.install().expect("Should install");

        assert!(installer.is_installed());
        assert_eq!(installer.state(), InstallState::Installed);
        assert_eq!(
            std::fs::read(installer.executable_path()).expect("Should read"),
            b"ty binary"
        );
        assert_eq!(
            installer.fetcher.requests(),
            vec![
                archive_url(LINUX_ARCHIVE),
                format!("{}.sha256", archive_url(LINUX_ARCHIVE))
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn install_marks_executable_0755() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), linux_release(b"ty binary"));

        installer.install().expect("Should install");

        let mode = std::fs::metadata(installer.executable_path())
            .expect("Should stat")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn corrupted_digest_leaves_nothing_installed() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = tar_gz(&[(LINUX_EXE, b"ty binary".as_slice())]);
        let fetcher = StaticFetcher::default()
            .with(archive_url(LINUX_ARCHIVE), archive)
            .with(
                format!("{}.sha256", archive_url(LINUX_ARCHIVE)),
                format!("{}  {LINUX_ARCHIVE}\n", "ab".repeat(32)).into_bytes(),
            );
        let installer = linux_installer(temp.path(), fetcher);

        let err = installer.install().unwrap_err();

        match &err {
            Error::Integrity { url, mismatch } => {
                assert_eq!(url, &archive_url(LINUX_ARCHIVE));
                assert_eq!(mismatch.expected, "ab".repeat(32));
            }
            other => panic!("Expected integrity error, got {other:?}"),
        }
        assert!(!installer.is_installed());
        assert!(!installer.executable_path().exists());
        assert!(!installer.install_dir().exists());
        assert_eq!(installer.state(), InstallState::NotInstalled);
    }

    #[test]
    fn missing_checksum_fails_closed() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = tar_gz(&[(LINUX_EXE, b"ty binary".as_slice())]);
        let fetcher = StaticFetcher::default().with(archive_url(LINUX_ARCHIVE), archive);
        let installer = linux_installer(temp.path(), fetcher);

        let err = installer.install().unwrap_err();

        assert!(matches!(err, Error::Fetch(ref f) if f.status() == Some(404)));
        assert!(!installer.is_installed());
    }

    #[test]
    fn missing_archive_is_fetch_error_with_status() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), StaticFetcher::default());

        let err = installer.install().unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains(LINUX_ARCHIVE));
        assert!(!err.is_fatal());
    }

    #[test]
    fn install_purges_stale_versions() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let stale = temp.path().join("LSP-ty").join("v0.0.0-old");
        std::fs::create_dir_all(&stale).expect("Should create stale dir");
        std::fs::write(stale.join("ty"), b"old").expect("Should write");

        let installer = linux_installer(temp.path(), linux_release(b"new"));
        installer.install().expect("Should install");

        assert!(!stale.exists());
        let versions: Vec<_> = std::fs::read_dir(installer.package_dir())
            .expect("Should list")
            .map(|e| e.expect("Should read entry").file_name())
            .collect();
        assert_eq!(versions, vec![std::ffi::OsString::from("v0.0.1")]);
    }

    #[test]
    fn archive_without_executable_is_rolled_back() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = tar_gz(&[("README.md", b"no binary here".as_slice())]);
        let checksum = sha256_line(&archive, LINUX_ARCHIVE);
        let fetcher = StaticFetcher::default()
            .with(archive_url(LINUX_ARCHIVE), archive)
            .with(format!("{}.sha256", archive_url(LINUX_ARCHIVE)), checksum);
        let installer = linux_installer(temp.path(), fetcher);

        let err = installer.install().unwrap_err();

        assert!(matches!(err, Error::MissingExecutable { .. }));
        assert!(!installer.install_dir().exists());
    }

    #[test]
    fn windows_zip_release_installs_flat_executable() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive_name = "ty-x86_64-pc-windows-msvc.zip";
        let archive = {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            zip.start_file("ty.exe", zip::write::SimpleFileOptions::default())
                .expect("Should start file");
            zip.write_all(b"MZ").expect("Should write");
            zip.finish().expect("Should finish").into_inner()
        };
        let checksum = sha256_line(&archive, archive_name);
        let fetcher = StaticFetcher::default()
            .with(archive_url(archive_name), archive)
            .with(format!("{}.sha256", archive_url(archive_name)), checksum);
        let installer =
            Installer::with_fetcher(config(temp.path(), PlatformKey::WindowsX64), fetcher)
                .expect("Should create installer");

        installer.install().expect("Should install");

        assert_eq!(
            installer.executable_path(),
            temp.path().join("LSP-ty").join("v0.0.1").join("ty.exe")
        );
        assert!(installer.is_installed());
    }

    #[test]
    fn uninstall_removes_package_dir_and_tolerates_absence() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), linux_release(b"ty"));
        installer.install().expect("Should install");

        installer.uninstall().expect("Should uninstall");
        assert!(!installer.package_dir().exists());
        assert!(!installer.is_installed());

        installer.uninstall().expect("Should tolerate absent dir");
    }

    #[test]
    fn observer_receives_events_in_order() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let installer = linux_installer(temp.path(), linux_release(b"ty")).with_observer(
            Arc::new(move |event: &InstallEvent| {
                sink.lock().expect("Should lock").push(event.clone());
            }),
        );

        installer.install().expect("Should install");

        let events = events.lock().expect("Should lock");
        assert!(matches!(events[0], InstallEvent::Started { .. }));
        assert!(matches!(events[1], InstallEvent::Downloading { .. }));
        assert!(matches!(events[2], InstallEvent::Verifying { .. }));
        assert!(matches!(events[3], InstallEvent::Extracting { .. }));
        assert_eq!(
            events[4],
            InstallEvent::Completed {
                path: installer.executable_path()
            }
        );
    }

    #[test]
    fn observer_sees_failure() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let installer = linux_installer(temp.path(), StaticFetcher::default()).with_observer(
            Arc::new(move |event: &InstallEvent| {
                sink.lock().expect("Should lock").push(event.clone());
            }),
        );

        assert!(installer.install().is_err());

        let events = events.lock().expect("Should lock");
        assert!(matches!(events.last(), Some(InstallEvent::Failed { .. })));
    }

    #[test]
    fn status_variables_expose_version_and_path() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let installer = linux_installer(temp.path(), StaticFetcher::default());

        let vars = installer.status_variables();

        assert_eq!(vars["server_version"], VERSION);
        assert_eq!(
            vars["server_path"],
            installer.executable_path().display().to_string()
        );
    }

    #[test]
    fn version_can_come_from_requirements_file() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let requirements = temp.path().join("requirements.txt");
        std::fs::write(&requirements, "ty==0.0.1-alpha.8\n").expect("Should write");

        let installer = Installer::with_fetcher(
            InstallerConfig::new(temp.path(), PlatformKey::LinuxX64)
                .with_version_source(RequirementsFile::new(&requirements)),
            StaticFetcher::default(),
        )
        .expect("Should create installer");

        assert_eq!(installer.current_version().as_str(), "0.0.1-alpha.8");
        assert!(
            installer
                .install_dir()
                .ends_with(Path::new("LSP-ty").join("v0.0.1-alpha.8"))
        );
    }

    #[test]
    fn invalid_version_source_fails_at_construction() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let result = Installer::with_fetcher(
            InstallerConfig::new(temp.path(), PlatformKey::LinuxX64)
                .with_version_source(PinnedVersion("../escape".to_string())),
            StaticFetcher::default(),
        );

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn out_of_range_transfer_settings_fail_at_construction() {
        let temp = tempfile::tempdir().expect("Should create temp dir");

        let mut oversized = config(temp.path(), PlatformKey::LinuxX64);
        oversized.chunk_size = usize::MAX;
        let mut no_timeout = config(temp.path(), PlatformKey::LinuxX64);
        no_timeout.request_timeout = std::time::Duration::ZERO;

        for bad in [oversized, no_timeout] {
            let result = Installer::new(bad);
            assert!(matches!(result, Err(Error::Configuration { .. })));
        }
    }

    #[test]
    fn concurrent_installs_serialize_on_lock() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let first = linux_installer(temp.path(), linux_release(b"ty"));
        let second = linux_installer(temp.path(), linux_release(b"ty"));

        std::thread::scope(|scope| {
            let a = scope.spawn(|| first.install());
            let b = scope.spawn(|| second.install());
            a.join().expect("Should join").expect("Should install");
            b.join().expect("Should join").expect("Should install");
        });

        assert!(first.is_installed());
        assert!(second.is_installed());
    }
}
