//! Host-facing lifecycle hooks.
//!
//! An editor plugin host or a CLI talks to the installer through
//! [`ManagedServer`] only. It asks whether the server needs installing,
//! triggers the install at a lifecycle point of its choosing, and reads the
//! executable path and the status variables afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::Result;
use crate::fetch::{Fetch, HttpFetcher};
use crate::installer::{InstallState, Installer};

/// Narrow interface a host needs to manage a language server binary.
pub trait ManagedServer {
    /// Name the host shows for this server.
    fn name(&self) -> &str;

    /// Returns `true` if the executable is absent.
    fn needs_installation(&self) -> bool;

    /// Installs or replaces the managed version.
    ///
    /// # Errors
    ///
    /// Returns the installer error unchanged; the host renders it.
    fn install_or_update(&self) -> Result<()>;

    /// Path of the executable the host should spawn.
    fn server_path(&self) -> PathBuf;

    /// Version the host should report.
    fn server_version(&self) -> &str;

    /// Extra variables for status text templates.
    fn additional_variables(&self) -> BTreeMap<String, String>;
}

/// Installs the server if needed and returns the executable path.
///
/// # Errors
///
/// Returns the error of [`ManagedServer::install_or_update`].
pub fn ensure_installed(server: &dyn ManagedServer) -> Result<PathBuf> {
    if server.needs_installation() {
        server.install_or_update()?;
    }
    Ok(server.server_path())
}

/// The ty language server, backed by an [`Installer`].
pub struct TyServer<F = HttpFetcher> {
    installer: Installer<F>,
}

impl<F: Fetch> TyServer<F> {
    /// Wraps an installer.
    #[must_use]
    pub fn new(installer: Installer<F>) -> Self {
        Self { installer }
    }

    /// Returns the underlying installer.
    #[must_use]
    pub fn installer(&self) -> &Installer<F> {
        &self.installer
    }

    /// Returns the installation state.
    #[must_use]
    pub fn state(&self) -> InstallState {
        self.installer.state()
    }
}

impl<F: Fetch> ManagedServer for TyServer<F> {
    fn name(&self) -> &str {
        &self.installer.config().package_name
    }

    fn needs_installation(&self) -> bool {
        !self.installer.is_installed()
    }

    fn install_or_update(&self) -> Result<()> {
        self.installer.install()
    }

    fn server_path(&self) -> PathBuf {
        self.installer.executable_path()
    }

    fn server_version(&self) -> &str {
        self.installer.current_version().as_str()
    }

    fn additional_variables(&self) -> BTreeMap<String, String> {
        self.installer.status_variables()
    }
}
