//! Status command for the tyup CLI.

use anyhow::Result;
use tyup_installer::InstallState;

use crate::settings::{self, GlobalArgs};

/// Executes the status command.
///
/// # Errors
///
/// Returns an error if configuration fails.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let installer = settings::installer(global)?;

    println!("State:    {}", state_label(installer.state()));
    println!("Version:  {}", installer.current_version());
    println!("Platform: {}", installer.platform());
    println!("Archive:  {}", installer.download_url());
    println!("Path:     {}", installer.executable_path().display());
    Ok(())
}

fn state_label(state: InstallState) -> &'static str {
    match state {
        InstallState::NotInstalled => "not installed",
        InstallState::Installing => "installing",
        InstallState::Installed => "installed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_labels_are_distinct() {
        let labels = [
            state_label(InstallState::NotInstalled),
            state_label(InstallState::Installing),
            state_label(InstallState::Installed),
        ];
        assert_eq!(labels, ["not installed", "installing", "installed"]);
    }
}
