#![warn(clippy::pedantic)]
//! Version-aware installer for the ty language server
//!
//! This crate downloads the ty release archive for the host platform, checks
//! it against its published SHA256 digest, and unpacks it into a versioned
//! directory that holds exactly one version at a time.
//!
//! ## Overview
//!
//! ```text
//! PlatformKey → ArchiveDescriptor → fetch archive → fetch .sha256 → verify → extract → chmod
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tyup_installer::{Installer, InstallerConfig};
//!
//! fn server_path() -> tyup_installer::Result<std::path::PathBuf> {
//!     let installer = Installer::new(InstallerConfig::from_env()?)?;
//!     if !installer.is_installed() {
//!         installer.install()?;
//!     }
//!     Ok(installer.executable_path())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`platform`] - platform keys and the release archive table
//! - [`fetch`] - blocking HTTP downloads
//! - [`verify`] - SHA256 checks against `sha256sum` files
//! - [`archive`] - confined tar/zip extraction
//! - [`version`] - version sources (build-time pin, requirements file)
//! - [`config`] - installer configuration from env and TOML
//! - [`installer`] - the install orchestrator
//! - [`host`] - lifecycle hooks for plugin hosts
//!
//! ## Blocking
//!
//! Every operation blocks the calling thread. Call them from a worker, not
//! from a UI thread.

pub mod archive;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod host;
pub mod installer;
pub mod platform;
pub mod verify;
pub mod version;

pub use config::{ConfigFile, InstallerConfig};
pub use errors::{Error, Result};
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use host::{ManagedServer, TyServer, ensure_installed};
pub use installer::{InstallEvent, InstallObserver, InstallState, Installer};
pub use platform::{ArchiveDescriptor, PlatformKey};
pub use version::{PinnedVersion, RequirementsFile, TY_VERSION, VersionSource, VersionTag};
