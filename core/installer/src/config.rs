//! Installer configuration.
//!
//! An [`InstallerConfig`] is built once by the host and handed to
//! [`Installer::new`](crate::Installer::new). Nothing here is global.
//!
//! ## Sources
//!
//! 1. Built-in defaults
//! 2. Environment variables ([`InstallerConfig::from_env`])
//! 3. An optional TOML file ([`ConfigFile`]), applied last
//!
//! ## Environment Variables
//!
//! - `TYUP_HOME` - storage root (default: `~/.tyup`, `%APPDATA%\tyup` on Windows)
//! - `TYUP_DIST_SERVER` - release base URL
//! - `TYUP_PLATFORM` - platform key override, e.g. `linux_arm64`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::fetch::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_SECS, MAX_CHUNK_SIZE};
use crate::platform::PlatformKey;
use crate::version::{PinnedVersion, RequirementsFile, VersionSource};

/// Environment variable overriding the storage root.
pub const HOME_ENV: &str = "TYUP_HOME";

/// Environment variable overriding the release base URL.
pub const DIST_SERVER_ENV: &str = "TYUP_DIST_SERVER";

/// Environment variable overriding the detected platform.
pub const PLATFORM_ENV: &str = "TYUP_PLATFORM";

/// Where ty publishes its release archives.
pub const DEFAULT_RELEASE_BASE_URL: &str = "https://github.com/astral-sh/ty/releases/download";

/// Name of the per-package directory under the storage root.
pub const DEFAULT_PACKAGE_NAME: &str = "LSP-ty";

/// Everything the installer needs to know about where and what to install.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Directory name under `storage_root` owned by this package.
    pub package_name: String,
    /// Base directory for all installer data.
    pub storage_root: PathBuf,
    /// Base URL; archives live at `<base>/<version>/<archive>`.
    pub release_base_url: String,
    /// Platform whose archive is installed.
    pub platform: PlatformKey,
    /// Size of a single body read while downloading.
    pub chunk_size: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Strategy deciding which version to install.
    pub version_source: Arc<dyn VersionSource>,
}

impl InstallerConfig {
    /// Creates a configuration with default URL, package name and version.
    #[must_use]
    pub fn new(storage_root: impl Into<PathBuf>, platform: PlatformKey) -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            storage_root: storage_root.into(),
            release_base_url: DEFAULT_RELEASE_BASE_URL.to_string(),
            platform,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            version_source: Arc::new(PinnedVersion::default()),
        }
    }

    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the home directory cannot be
    /// determined, the platform is unsupported, or `TYUP_PLATFORM` is not a
    /// known key.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`InstallerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let storage_root = match var(HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => default_storage_root()?,
        };

        let platform = match var(PLATFORM_ENV) {
            Some(key) => key.parse()?,
            None => PlatformKey::detect()?,
        };

        let mut config = Self::new(storage_root, platform);
        if let Some(server) = var(DIST_SERVER_ENV) {
            config = config.with_release_base_url(server);
        }

        Ok(config)
    }

    /// Replaces the release base URL, dropping any trailing `/`.
    #[must_use]
    pub fn with_release_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.release_base_url = url.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the version strategy.
    #[must_use]
    pub fn with_version_source(mut self, source: impl VersionSource + 'static) -> Self {
        self.version_source = Arc::new(source);
        self
    }

    /// Replaces the package directory name.
    #[must_use]
    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    /// Applies the values present in a config file on top of this one.
    ///
    /// An explicit `version` wins over `requirements`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown platform key.
    pub fn apply_file(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(name) = file.package_name {
            self.package_name = name;
        }
        if let Some(root) = file.storage_root {
            self.storage_root = root;
        }
        if let Some(url) = file.release_base_url {
            self = self.with_release_base_url(url);
        }
        if let Some(platform) = file.platform {
            self.platform = platform.parse()?;
        }
        if let Some(chunk_size) = file.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(secs) = file.timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(version) = file.version {
            self = self.with_version_source(PinnedVersion(version));
        } else if let Some(requirements) = file.requirements {
            self = self.with_version_source(RequirementsFile::new(requirements));
        }
        Ok(self)
    }

    /// Validates invariants that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or path-like package name,
    /// an empty release URL, a chunk size above [`MAX_CHUNK_SIZE`] or a zero
    /// request timeout.
    pub fn validate(&self) -> Result<()> {
        let name = self.package_name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::configuration(format!(
                "invalid package name '{}'",
                self.package_name
            )));
        }
        if self.release_base_url.is_empty() {
            return Err(Error::configuration("release base URL is empty"));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::configuration(format!(
                "chunk_size {} exceeds the maximum of {MAX_CHUNK_SIZE} bytes",
                self.chunk_size
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::configuration("request timeout must be at least one second"));
        }
        Ok(())
    }
}

/// Returns the default storage root for the current user.
fn default_storage_root() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        dirs::data_dir()
            .map(|dir| dir.join("tyup"))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "cannot determine AppData directory. Set {HOME_ENV} environment variable."
                ))
            })
    }
    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|dir| dir.join(".tyup"))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "cannot determine home directory. Set {HOME_ENV} environment variable."
                ))
            })
    }
}

/// On-disk configuration, every key optional.
///
/// ```toml
/// storage_root = "/opt/tyup"
/// release_base_url = "https://mirror.example.com/ty"
/// platform = "linux_arm64"
/// requirements = "requirements.txt"
/// chunk_size = 65536
/// timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Package directory name.
    pub package_name: Option<String>,
    /// Storage root.
    pub storage_root: Option<PathBuf>,
    /// Release base URL.
    pub release_base_url: Option<String>,
    /// Platform key.
    pub platform: Option<String>,
    /// Pinned version.
    pub version: Option<String>,
    /// Requirements file to read the version pin from.
    pub requirements: Option<PathBuf>,
    /// Download read chunk size in bytes.
    pub chunk_size: Option<usize>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Parses a config file from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid config file: {e}")))
    }

    /// Loads a config file from disk.
    ///
    /// A relative `requirements` path is resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let mut file = Self::parse(&content)?;

        if let (Some(requirements), Some(dir)) = (&file.requirements, path.parent())
            && requirements.is_relative()
        {
            file.requirements = Some(dir.join(requirements));
        }

        Ok(file)
    }
}
