//! Uninstall command for the tyup CLI.
//!
//! Removes the whole package directory, i.e. every installed version.

use anyhow::Result;

use crate::settings::{self, GlobalArgs};

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if configuration fails or the directory cannot be
/// removed.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let installer = settings::installer(global)?;
    let package_dir = installer.package_dir();

    if !package_dir.exists() {
        println!("Nothing to uninstall.");
        return Ok(());
    }

    println!("Uninstalling {}...", package_dir.display());
    installer.uninstall()?;
    println!("ty uninstalled successfully.");
    Ok(())
}
