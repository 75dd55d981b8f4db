//! Install command for the tyup CLI.
//!
//! ## Usage
//!
//! ```bash
//! tyup install            # Install unless already present
//! tyup install --force    # Reinstall
//! ```

use anyhow::Result;
use clap::Args;
use tyup_installer::ManagedServer;

use crate::settings::{self, GlobalArgs};

/// Arguments for the install command.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Reinstall even if the version is already installed.
    #[clap(long = "force", action = clap::ArgAction::SetTrue)]
    pub force: bool,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if configuration fails or any install step fails.
pub fn execute(global: &GlobalArgs, args: &InstallArgs) -> Result<()> {
    let server = settings::server(global)?;
    let version = server.server_version();

    if !args.force && !server.needs_installation() {
        println!("ty {version} is already installed.");
        println!("{}", server.server_path().display());
        return Ok(());
    }

    server.install_or_update()?;

    println!("ty {version} installed successfully.");
    println!("{}", server.server_path().display());
    Ok(())
}
